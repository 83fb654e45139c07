pub mod guard;
pub mod response;
pub mod session;

pub use guard::{require_role_api, require_role_page, require_session_api, sign_in_redirect, SIGN_IN_PATH};
pub use response::{ApiResponse, ApiResult};
pub use session::{extract_token, session_middleware, CurrentSession};
