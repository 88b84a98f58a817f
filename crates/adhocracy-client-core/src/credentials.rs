use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use adhocracy_shared::{token::AuthToken, uac::UserPath};
use futures::channel::oneshot;
use futures::future::Shared;

use crate::signal::OneShotSignal;

/// Token and user path pair that together identify an authenticated session.
/// The two are only ever stored and cleared together so observers can never
/// see a token without the matching user path or vice versa.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: AuthToken,
    pub user_path: UserPath,
}

/// Persistence hook so UI shells can keep a session across restarts
/// (e.g. a file on native, browser storage on the web)
pub trait CredentialStorage: Debug {
    fn load(&self) -> anyhow::Result<Option<Credential>>;
    fn save(&self, credential: &Credential) -> anyhow::Result<()>;
    fn clear(&self) -> anyhow::Result<()>;
}

#[cfg(not(target_arch = "wasm32"))]
pub type SharedStorage = Arc<dyn CredentialStorage + Send + Sync>;
#[cfg(target_arch = "wasm32")]
pub type SharedStorage = Arc<dyn CredentialStorage>;

/// Keeps credentials for the lifetime of the process only
#[derive(Debug, Default)]
pub struct InMemoryCredentialStorage(Mutex<Option<Credential>>);

impl CredentialStorage for InMemoryCredentialStorage {
    fn load(&self) -> anyhow::Result<Option<Credential>> {
        Ok(self.0.lock().expect("mutex poisoned").clone())
    }

    fn save(&self, credential: &Credential) -> anyhow::Result<()> {
        *self.0.lock().expect("mutex poisoned") = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        *self.0.lock().expect("mutex poisoned") = None;
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub trait CredentialListener: 'static + Send + Sync + Fn(Option<UserPath>) {}
#[cfg(not(target_arch = "wasm32"))]
impl<T> CredentialListener for T where T: 'static + Send + Sync + Fn(Option<UserPath>) {}

#[cfg(target_arch = "wasm32")]
pub trait CredentialListener: 'static + Fn(Option<UserPath>) {}
#[cfg(target_arch = "wasm32")]
impl<T> CredentialListener for T where T: 'static + Fn(Option<UserPath>) {}

type ListenerHandle = Arc<dyn CredentialListener>;

/// Owns the current credential and broadcasts every change of the user path
/// to its subscribers. This is the only shared mutable state between the
/// session service and the rest of the client.
#[derive(Clone)]
pub struct CredentialStore {
    inner: Arc<Mutex<StoreInner>>,
    storage: SharedStorage,
    ready: Arc<OneShotSignal<()>>,
}

struct StoreInner {
    credential: Option<Credential>,
    listeners: Vec<ListenerHandle>,
    restored: bool,
}

impl Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().expect("mutex poisoned");
        f.debug_struct("CredentialStore")
            .field("user_path", &inner.credential.as_ref().map(|c| &c.user_path))
            .field("listeners", &inner.listeners.len())
            .field("restored", &inner.restored)
            .finish()
    }
}

impl CredentialStore {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                credential: None,
                listeners: Vec::new(),
                restored: false,
            })),
            storage,
            ready: Arc::new(OneShotSignal::new()),
        }
    }

    pub fn new_in_memory() -> Self {
        Self::new(Arc::new(InMemoryCredentialStorage::default()))
    }

    /// One time initial load from storage. Always notifies subscribers, even
    /// when nothing was restored, so that the first credential resolution is
    /// well defined. Later calls are no-ops.
    #[tracing::instrument(skip(self))]
    pub fn restore(&self) {
        {
            let mut inner = self.inner.lock().expect("mutex poisoned");
            if inner.restored {
                return;
            }
            inner.restored = true;
            match self.storage.load() {
                Ok(credential) => inner.credential = credential,
                Err(err) => tracing::warn!(?err, "failed to restore credentials from storage"),
            }
        }
        self.ready.settle(());
        self.notify(self.user_path());
    }

    /// Settles once the initial restore from storage has completed
    pub fn ready(&self) -> Shared<oneshot::Receiver<()>> {
        self.ready.wait()
    }

    /// Saves the credential and notifies subscribers if the user path changed
    #[tracing::instrument(skip(self, token))]
    pub fn store_and_enable_token(&self, token: AuthToken, user_path: UserPath) {
        let changed = {
            let mut inner = self.inner.lock().expect("mutex poisoned");
            let changed = inner.credential.as_ref().map(|c| &c.user_path) != Some(&user_path);
            inner.credential = Some(Credential {
                token,
                user_path: user_path.clone(),
            });
            if let Err(err) = self.storage.save(inner.credential.as_ref().expect("just set")) {
                tracing::warn!(?err, "failed to persist credentials");
            }
            changed
        };
        if changed {
            self.notify(Some(user_path));
        }
    }

    /// Clears the credential locally; notifies subscribers if one was present
    #[tracing::instrument(skip(self))]
    pub fn delete_token(&self) {
        let had_credential = {
            let mut inner = self.inner.lock().expect("mutex poisoned");
            let had_credential = inner.credential.take().is_some();
            if let Err(err) = self.storage.clear() {
                tracing::warn!(?err, "failed to clear persisted credentials");
            }
            had_credential
        };
        if had_credential {
            self.notify(None);
        }
    }

    pub fn token(&self) -> Option<AuthToken> {
        self.inner
            .lock()
            .expect("mutex poisoned")
            .credential
            .as_ref()
            .map(|c| c.token.clone())
    }

    pub fn user_path(&self) -> Option<UserPath> {
        self.inner
            .lock()
            .expect("mutex poisoned")
            .credential
            .as_ref()
            .map(|c| c.user_path.clone())
    }

    /// Registers a publish-on-change observer for the user path
    pub fn subscribe<F: CredentialListener>(&self, listener: F) {
        self.inner
            .lock()
            .expect("mutex poisoned")
            .listeners
            .push(Arc::new(listener));
    }

    fn notify(&self, user_path: Option<UserPath>) {
        // Listeners are called without holding the lock so they are free to
        // call back into the store
        let listeners: Vec<ListenerHandle> = self
            .inner
            .lock()
            .expect("mutex poisoned")
            .listeners
            .clone();
        for listener in listeners {
            (*listener)(user_path.clone());
        }
    }
}
