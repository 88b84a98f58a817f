//! Stores settings that are not expected to need to change but grouped together
//! for discoverability and reuse. Each constant should be prefixed by the module
//! name to allow importing the constant only and still be readable

pub mod path {
    mod path_spec;
    pub use path_spec::PathSpec;

    pub const PATH_ACTIVATE_ACCOUNT: PathSpec = PathSpec::post("/activate_account");
    pub const PATH_LOGIN_EMAIL: PathSpec = PathSpec::post("/login_email");
    pub const PATH_LOGIN_USERNAME: PathSpec = PathSpec::post("/login_username");
    pub const PATH_PASSWORD_RESET: PathSpec = PathSpec::post("/password_reset");
    pub const PATH_USER_CREATE: PathSpec = PathSpec::post("/principals/users/");
}
