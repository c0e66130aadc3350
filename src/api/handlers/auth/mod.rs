//! Authentication: JWT access tokens, rotating refresh tokens, email
//! verification, and the per-request principal lookup.

pub mod login;
pub mod principal;
pub mod refresh;
pub mod session;
pub mod signup;
pub mod state;
pub mod storage;
pub mod token;
pub mod types;
pub mod utils;
pub mod verification;
