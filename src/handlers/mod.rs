// handlers/mod.rs - Route handlers grouped by access tier
//
// public    - no session needed (sign-in, session lookup, sign-out)
// protected - JSON API behind the role and session guards (/api/*)
// pages     - HTML shells behind the page guard (/dashboard/*)

pub mod pages;
pub mod protected;
pub mod public;
