// handlers/protected/mod.rs - JSON API behind the guards
//
// Route families and the guard each one is mounted behind:
//   parent        -> require_role_api(PARENT)
//   student       -> require_role_api(STUDENT)
//   notifications -> require_session_api

pub mod notifications;
pub mod parent;
pub mod student;
