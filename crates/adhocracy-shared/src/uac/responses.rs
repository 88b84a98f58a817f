use crate::token::AuthToken;

use super::UserPath;

/// Body returned by every endpoint that establishes a new authenticated
/// session (login, account activation and password reset)
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub user_token: AuthToken,
    pub user_path: UserPath,
}

/// Body returned on successful creation of a user resource
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct RegisterResponse {
    pub path: UserPath,
}
