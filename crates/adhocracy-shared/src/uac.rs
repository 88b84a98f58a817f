//! User account control related types

mod responses;
mod user;

pub use responses::{RegisterResponse, TokenResponse};
pub use user::{UserBasic, UserPath, Username};
