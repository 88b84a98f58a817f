//! Client side view of the backend resource data model. A resource is a typed
//! document whose payload is grouped into named sheets; the client only needs
//! the user principal resource and the sheets it is composed of.

use secrecy::ExposeSecret as _;
use std::fmt::Debug;

use crate::req_args::{CaptchaGuess, RegisterReqArgs};
use crate::uac::{UserBasic, UserPath, Username};

pub const CONTENT_TYPE_USER: &str = "adhocracy_core.resources.principal.IUser";

pub const SHEET_USER_BASIC: &str = "adhocracy_core.sheets.principal.IUserBasic";
pub const SHEET_USER_EXTENDED: &str = "adhocracy_core.sheets.principal.IUserExtended";
pub const SHEET_PASSWORD_AUTHENTICATION: &str =
    "adhocracy_core.sheets.principal.IPasswordAuthentication";
pub const SHEET_CAPTCHA: &str = "adhocracy_core.sheets.principal.ICaptcha";

/// Composite resource submitted to `/principals/users/` to create a new user
#[derive(Debug, serde::Serialize)]
pub struct NewUserResource {
    pub content_type: &'static str,
    pub data: NewUserSheets,
}

/// Sheets of a new user resource. The captcha sheet is left out entirely when
/// no captcha guess was supplied.
#[derive(Debug, serde::Serialize)]
pub struct NewUserSheets {
    #[serde(rename = "adhocracy_core.sheets.principal.IUserBasic")]
    pub user_basic: UserBasicSheet,
    #[serde(rename = "adhocracy_core.sheets.principal.IUserExtended")]
    pub user_extended: UserExtendedSheet,
    #[serde(rename = "adhocracy_core.sheets.principal.IPasswordAuthentication")]
    pub password_authentication: PasswordSheet,
    #[serde(
        rename = "adhocracy_core.sheets.principal.ICaptcha",
        skip_serializing_if = "Option::is_none"
    )]
    pub captcha: Option<CaptchaGuess>,
}

#[derive(Debug, serde::Serialize)]
pub struct UserBasicSheet {
    pub name: Username,
}

#[derive(Debug, serde::Serialize)]
pub struct UserExtendedSheet {
    pub email: String,
}

#[derive(serde::Serialize)]
pub struct PasswordSheet {
    pub password: String,
}

impl Debug for PasswordSheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordSheet")
            .field("has_password", &!self.password.is_empty())
            .finish()
    }
}

impl From<&RegisterReqArgs> for NewUserResource {
    fn from(args: &RegisterReqArgs) -> Self {
        Self {
            content_type: CONTENT_TYPE_USER,
            data: NewUserSheets {
                user_basic: UserBasicSheet {
                    name: args.username.clone(),
                },
                user_extended: UserExtendedSheet {
                    email: args.email.clone(),
                },
                password_authentication: PasswordSheet {
                    password: args.password.expose_secret().to_string(),
                },
                captcha: args.captcha.clone(),
            },
        }
    }
}

/// A user resource as returned by `GET <user_path>`, trimmed down to the
/// sheets the client consumes
#[derive(Debug, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct UserResource {
    pub content_type: String,
    #[serde(default)]
    pub path: Option<UserPath>,
    pub data: UserSheets,
}

#[derive(Debug, Default, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct UserSheets {
    #[serde(rename = "adhocracy_core.sheets.principal.IUserBasic", default)]
    pub user_basic: UserBasic,
}
