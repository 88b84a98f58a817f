use futures::channel::oneshot;
use futures::future::Shared;
use futures::FutureExt as _;
use std::fmt::Debug;
use std::sync::Mutex;

/// A signal that settles exactly once; attempts to settle it again are
/// ignored. [`Self::wait`] hands out cloneable futures so any number of
/// callers may await the same resolution, before or after it happened.
pub struct OneShotSignal<T: Clone> {
    tx: Mutex<Option<oneshot::Sender<T>>>,
    rx: Shared<oneshot::Receiver<T>>,
}

impl<T: Clone> OneShotSignal<T> {
    pub fn new() -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            tx: Mutex::new(Some(tx)),
            rx: rx.shared(),
        }
    }

    /// Returns `true` if this call is the one that settled the signal
    pub fn settle(&self, value: T) -> bool {
        match self.tx.lock().expect("mutex poisoned").take() {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.tx.lock().expect("mutex poisoned").is_none()
    }

    /// Future that resolves once the signal settles. Errors only if the
    /// signal is dropped before it was settled.
    pub fn wait(&self) -> Shared<oneshot::Receiver<T>> {
        self.rx.clone()
    }
}

impl<T: Clone> Default for OneShotSignal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Debug for OneShotSignal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneShotSignal")
            .field("is_settled", &self.is_settled())
            .finish()
    }
}
