use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use adhocracy_shared::{
    const_config::path::{
        PathSpec, PATH_ACTIVATE_ACCOUNT, PATH_LOGIN_EMAIL, PATH_LOGIN_USERNAME,
        PATH_PASSWORD_RESET, PATH_USER_CREATE,
    },
    req_args::{ActivateReqArgs, LoginReqArgs, PasswordResetReqArgs, RegisterReqArgs},
    resource::{NewUserResource, UserResource},
    uac::{RegisterResponse, TokenResponse, UserBasic, UserPath},
};
use anyhow::anyhow;
use futures::channel::oneshot;
use futures::future::Shared;
use secrecy::ExposeSecret as _;

use crate::client::{process_json_body, Client, UiCallBack};
use crate::credentials::CredentialStore;
use crate::signal::OneShotSignal;

/// Tracks who is logged in and performs the account lifecycle operations.
/// Constructed once per application; it reacts to every change of the
/// credential store's user path for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct SessionService {
    client: Client,
    credentials: CredentialStore,
    inner: Arc<Mutex<SessionInner>>,
    ready: Arc<OneShotSignal<Option<UserBasic>>>,
}

#[derive(Debug, Default)]
struct SessionInner {
    current_user: Option<UserBasic>,
    /// Bumped on every observed credential change so continuations of
    /// superseded profile fetches can be discarded (latest change wins)
    load_seq: u64,
}

impl SessionService {
    /// Subscribes to the credential store. The bootstrap is expected to call
    /// [`CredentialStore::restore`] afterwards, which triggers the first
    /// credential resolution and thereby settles [`Self::ready`].
    pub fn new(client: Client) -> Self {
        let credentials = client.credentials().clone();
        let service = Self {
            client,
            credentials: credentials.clone(),
            inner: Arc::new(Mutex::new(SessionInner::default())),
            ready: Arc::new(OneShotSignal::new()),
        };
        let watcher = service.clone();
        credentials.subscribe(move |user_path| watcher.on_credential_change(user_path));
        service
    }

    /// Basic profile of the logged in user. `Some` exactly while the
    /// credential store holds a user path whose profile fetch succeeded.
    pub fn current_user_profile(&self) -> Option<UserBasic> {
        self.inner
            .lock()
            .expect("mutex poisoned")
            .current_user
            .clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current_user_profile().is_some()
    }

    /// Settles exactly once, after the first credential resolution, with the
    /// loaded profile or `None` when logged out. Later login/logout cycles do
    /// not settle it again; observe [`Self::current_user_profile`] for live
    /// updates.
    pub fn ready(&self) -> Shared<oneshot::Receiver<Option<UserBasic>>> {
        self.ready.wait()
    }

    #[tracing::instrument(skip(self, ui_notify))]
    pub fn log_in<F: UiCallBack>(
        &self,
        args: LoginReqArgs,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        let (path_spec, body) = if args.is_email() {
            (
                PATH_LOGIN_EMAIL,
                serde_json::json!({
                    "email": args.name_or_email,
                    "password": args.password.expose_secret(),
                }),
            )
        } else {
            (
                PATH_LOGIN_USERNAME,
                serde_json::json!({
                    "name": args.name_or_email,
                    "password": args.password.expose_secret(),
                }),
            )
        };
        self.send_credential_granting_request(path_spec, &body, ui_notify)
    }

    /// There is no logout endpoint on the backend; logging out is purely a
    /// local credential invalidation
    #[tracing::instrument(skip(self))]
    pub fn log_out(&self) {
        self.credentials.delete_token();
    }

    #[tracing::instrument(skip(self, args, ui_notify))]
    pub fn register<F: UiCallBack>(
        &self,
        args: &RegisterReqArgs,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<RegisterResponse>> {
        if args.password.expose_secret() != args.password_check.expose_secret() {
            let (tx, rx) = oneshot::channel();
            tx.send(Err(anyhow!("the two passwords entered do not match")))
                .expect("failed to send oneshot msg");
            ui_notify();
            return rx;
        }
        let resource = NewUserResource::from(args);
        self.client
            .send_request_expect_json(PATH_USER_CREATE, &resource, ui_notify)
    }

    /// On success the user is logged in with the credentials returned by the
    /// activation endpoint
    #[tracing::instrument(skip(self, ui_notify))]
    pub fn activate<F: UiCallBack>(
        &self,
        args: &ActivateReqArgs,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_credential_granting_request(PATH_ACTIVATE_ACCOUNT, args, ui_notify)
    }

    /// On success the user is logged in with the credentials returned by the
    /// reset endpoint
    #[tracing::instrument(skip(self, args, ui_notify))]
    pub fn password_reset<F: UiCallBack>(
        &self,
        args: &PasswordResetReqArgs,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        let body = serde_json::json!({
            "path": args.path,
            "password": args.password.expose_secret(),
        });
        self.send_credential_granting_request(PATH_PASSWORD_RESET, &body, ui_notify)
    }

    /// Login, activation and password reset all converge here because from
    /// the credential system's point of view all three establish a new
    /// authenticated session
    fn send_credential_granting_request<T, F>(
        &self,
        path_spec: PathSpec,
        args: &T,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>>
    where
        T: serde::Serialize + Debug,
        F: UiCallBack,
    {
        let (tx, rx) = oneshot::channel();
        let credentials = self.credentials.clone();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            let msg = process_token_response(resp, credentials).await;
            tx.send(msg).expect("failed to send oneshot msg");
            ui_notify();
        };
        self.client.initiate_request(path_spec, args, on_done);
        rx
    }

    #[tracing::instrument(skip(self))]
    fn on_credential_change(&self, user_path: Option<UserPath>) {
        let seq = {
            let mut inner = self.inner.lock().expect("mutex poisoned");
            inner.load_seq += 1;
            if user_path.is_none() {
                inner.current_user = None;
            }
            inner.load_seq
        };
        match user_path {
            Some(user_path) => self.load_user(user_path, seq),
            None => {
                self.ready.settle(None);
            }
        }
    }

    fn load_user(&self, user_path: UserPath, seq: u64) {
        let service = self.clone();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            let result = process_json_body::<UserResource>(resp).await;
            service.finish_load_user(seq, result);
        };
        self.client.initiate_resource_get(user_path.as_ref(), on_done);
    }

    #[tracing::instrument(skip(self, result))]
    fn finish_load_user(&self, seq: u64, result: anyhow::Result<UserResource>) {
        let outcome = {
            let mut inner = self.inner.lock().expect("mutex poisoned");
            if inner.load_seq != seq {
                tracing::debug!("discarding profile fetch superseded by a newer credential change");
                return;
            }
            match result {
                Ok(resource) => {
                    let profile = resource.data.user_basic;
                    inner.current_user = Some(profile.clone());
                    Ok(profile)
                }
                Err(err) => {
                    inner.current_user = None;
                    Err(err)
                }
            }
        };
        match outcome {
            Ok(profile) => {
                self.ready.settle(Some(profile));
            }
            Err(err) => {
                // The user resource that the credential points at could not
                // be fetched (e.g. network disconnect or revoked access);
                // treat the credential as invalid
                tracing::error!(?err, "failed to fetch user resource");
                self.credentials.delete_token();
                // The delete above only notifies if the credential was still
                // present; make sure readiness is settled either way
                self.ready.settle(None);
            }
        }
    }
}

#[tracing::instrument(ret, err(Debug), skip(credentials))]
async fn process_token_response(
    response: reqwest::Result<reqwest::Response>,
    credentials: CredentialStore,
) -> anyhow::Result<()> {
    let token_response: TokenResponse = process_json_body(response).await?;
    credentials.store_and_enable_token(token_response.user_token, token_response.user_path);
    Ok(())
}
