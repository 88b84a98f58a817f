//! This module stores the expected format of the arguments for the requests.
//! The structure is supposed to match the endpoints that consume them, for
//! example `/password_reset` maps to [`PasswordResetReqArgs`]. Passwords are
//! held as [`SecretString`] and only exposed at the serialization boundary.

use secrecy::{ExposeSecret, SecretString};
use std::fmt::Debug;

use crate::uac::Username;

#[derive(serde::Deserialize, Clone)]
pub struct LoginReqArgs {
    /// The backend has separate login endpoints for usernames and email
    /// addresses, see [`Self::is_email`]
    pub name_or_email: String,
    pub password: SecretString,
}

impl LoginReqArgs {
    pub fn new<S: Into<String>>(name_or_email: S, password: SecretString) -> Self {
        Self {
            name_or_email: name_or_email.into(),
            password,
        }
    }

    /// Identifiers containing an `@` are treated as email addresses
    pub fn is_email(&self) -> bool {
        self.name_or_email.contains('@')
    }
}

impl Debug for LoginReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginReqArgs")
            .field("name_or_email", &self.name_or_email)
            .field("has_password", &!self.password.expose_secret().is_empty())
            .finish()
    }
}

/// Captcha id and the solution the user entered for it
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct CaptchaGuess {
    pub id: String,
    pub solution: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct RegisterReqArgs {
    pub username: Username,
    pub email: String,
    pub password: SecretString,
    pub password_check: SecretString,
    /// Only included in the submitted resource when supplied
    pub captcha: Option<CaptchaGuess>,
}

impl RegisterReqArgs {
    pub fn new<S: Into<String>>(
        username: Username,
        email: S,
        password: SecretString,
        password_check: SecretString,
    ) -> Self {
        Self {
            username,
            email: email.into(),
            password,
            password_check,
            captcha: None,
        }
    }

    pub fn captcha(mut self, captcha: Option<CaptchaGuess>) -> Self {
        self.captcha = captcha;
        self
    }
}

impl Debug for RegisterReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterReqArgs")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("has_password", &!self.password.expose_secret().is_empty())
            .field("captcha", &self.captcha)
            .finish()
    }
}

/// The activation path from the link mailed to the user after registration
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ActivateReqArgs {
    pub path: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct PasswordResetReqArgs {
    /// The reset path from the link mailed to the user
    pub path: String,
    pub password: SecretString,
}

impl PasswordResetReqArgs {
    pub fn new<S: Into<String>>(path: S, password: SecretString) -> Self {
        Self {
            path: path.into(),
            password,
        }
    }
}

impl Debug for PasswordResetReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordResetReqArgs")
            .field("path", &self.path)
            .field("has_password", &!self.password.expose_secret().is_empty())
            .finish()
    }
}
