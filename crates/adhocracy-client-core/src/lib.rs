//! Stores functionality that should be shared between different clients
//! NB: The assumption is made that the async runtime has already been started
//! before any functions from this library are called
//!
//! Bootstrapping is explicit, there is no service registry: create a
//! [`CredentialStore`], pass it to [`Client::new`], pass the client to
//! [`SessionService::new`] and finally call [`CredentialStore::restore`] to
//! trigger the first credential resolution.

#![warn(unused_crate_dependencies)]

mod client;
mod credentials;
mod session;
mod signal;

pub use client::{Client, UiCallBack, HEADER_USER_TOKEN};
pub use credentials::{
    Credential, CredentialListener, CredentialStorage, CredentialStore, InMemoryCredentialStorage,
    SharedStorage,
};
pub use session::SessionService;
pub use signal::OneShotSignal;
