use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use adhocracy_client_core::{
    Client, Credential, CredentialStorage, CredentialStore, InMemoryCredentialStorage,
    SessionService, HEADER_USER_TOKEN,
};
use adhocracy_shared::{
    random_string_def_len,
    req_args::LoginReqArgs,
    resource::{CONTENT_TYPE_USER, SHEET_USER_BASIC},
    telemetry::{self, get_subscriber, init_subscriber},
    token::AuthToken,
};
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, LazyLock, Mutex};
use std::time::{Duration, Instant};

pub const TEST_USERNAME: &str = "alice";
pub const TEST_EMAIL: &str = "alice@example.com";
pub const TEST_PASSWORD: &str = "correct horse battery staple";
pub const TEST_TZNAME: &str = "Europe/Berlin";
pub const TEST_USER_PATH: &str = "/principals/users/0000001/";
pub const SLOW_USER_PATH: &str = "/principals/users/0000003/";
pub const SLOW_USER_NAME: &str = "slow-user";
pub const TEST_ACTIVATION_PATH: &str = "/activate/abc123";
pub const TEST_RESET_PATH: &str = "/password_reset/xyz789";
pub const CREATED_USER_PATH: &str = "/principals/users/0000002/";

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

// Ensure that the `tracing` stack is only initialised once
static TRACING: LazyLock<String> = LazyLock::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let log_file_name = format!("client_tests_{}", random_string_def_len());
        let (file, path) = telemetry::create_trace_file(&log_file_name).unwrap();
        let subscriber = get_subscriber(subscriber_name, default_filter_level, file);
        init_subscriber(subscriber).unwrap();
        format!("Traces for tests being written to: {path:?}")
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber).unwrap();
        "Traces set to std::io::sink".to_string()
    }
});

/// Empty function for use when a call back isn't needed
pub fn no_cb() {}

/// A user profile the stub backend can serve, optionally after a delay so
/// tests can keep a fetch in flight while the credential changes
#[derive(Debug, Clone)]
pub struct StubProfile {
    pub name: String,
    pub tzname: String,
    pub delay: Duration,
}

/// Backend double that implements just enough of the REST API for the client
#[derive(Debug, Default)]
pub struct StubState {
    /// Token handed out by all credential granting endpoints
    pub token: String,
    /// Profiles served by user path
    pub profiles: HashMap<String, StubProfile>,
    pub fail_user_fetch: bool,
    pub reject_register: Option<String>,
    pub login_username_hits: usize,
    pub login_email_hits: usize,
    pub user_fetch_hits: usize,
    /// `X-User-Token` header values observed on user fetches
    pub user_fetch_tokens: Vec<Option<String>>,
    pub register_bodies: Vec<serde_json::Value>,
}

pub type SharedStubState = Arc<Mutex<StubState>>;

pub struct TestApp {
    pub state: SharedStubState,
    pub storage: Arc<InMemoryCredentialStorage>,
    pub store: CredentialStore,
    pub session: SessionService,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_custom(false, false).await
}

pub async fn spawn_app_with_stored_credential(fail_user_fetch: bool) -> TestApp {
    spawn_app_custom(true, fail_user_fetch).await
}

async fn spawn_app_custom(seed_credential: bool, fail_user_fetch: bool) -> TestApp {
    start_tracing();
    let state: SharedStubState = Arc::new(Mutex::new(StubState {
        token: random_string_def_len(),
        profiles: HashMap::from([(
            TEST_USER_PATH.to_string(),
            StubProfile {
                name: TEST_USERNAME.to_string(),
                tzname: TEST_TZNAME.to_string(),
                delay: Duration::ZERO,
            },
        )]),
        fail_user_fetch,
        ..Default::default()
    }));
    let address = spawn_stub_backend(Arc::clone(&state)).await;

    let storage = Arc::new(InMemoryCredentialStorage::default());
    if seed_credential {
        let token = AuthToken::from(state.lock().unwrap().token.clone());
        storage
            .save(&Credential {
                token,
                user_path: TEST_USER_PATH.try_into().unwrap(),
            })
            .unwrap();
    }

    // Explicit bootstrap: store, then client, then session, then restore
    let store = CredentialStore::new(storage.clone());
    let client = Client::new(address, store.clone());
    let session = SessionService::new(client);
    store.restore();

    TestApp {
        state,
        storage,
        store,
        session,
    }
}

fn start_tracing() {
    println!("{}", &*TRACING);
}

impl TestApp {
    pub fn login_args(&self) -> LoginReqArgs {
        LoginReqArgs::new(TEST_USERNAME, TEST_PASSWORD.to_string().into())
    }

    pub async fn login(&self) -> anyhow::Result<()> {
        self.session
            .log_in(self.login_args(), no_cb)
            .await
            .expect("failed to receive on rx")
    }

    pub fn expected_token(&self) -> AuthToken {
        AuthToken::from(self.state.lock().unwrap().token.clone())
    }

    /// Polls until `condition` holds; panics after [`WAIT_TIMEOUT`]
    pub async fn wait_until(&self, condition: impl Fn() -> bool, msg: &str) {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        while !condition() {
            assert!(Instant::now() < deadline, "timed out waiting for: {msg}");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

async fn spawn_stub_backend(state: SharedStubState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let data = web::Data::new(state);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .route("/login_username", web::post().to(login_username))
            .route("/login_email", web::post().to(login_email))
            .route("/activate_account", web::post().to(activate_account))
            .route("/password_reset", web::post().to(password_reset))
            .route("/principals/users/", web::post().to(create_user))
            .route("/principals/users/{id}/", web::get().to(get_user))
    })
    .listen(listener)
    .expect("failed to listen on stub port")
    .run();
    tokio::spawn(server);
    format!("http://127.0.0.1:{port}")
}

fn token_response(state: &StubState) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "user_token": state.token,
        "user_path": TEST_USER_PATH,
    }))
}

async fn login_username(
    state: web::Data<SharedStubState>,
    body: web::Json<serde_json::Value>,
) -> HttpResponse {
    let mut state = state.lock().unwrap();
    state.login_username_hits += 1;
    if body["name"] == TEST_USERNAME && body["password"] == TEST_PASSWORD {
        token_response(&state)
    } else {
        HttpResponse::BadRequest().body("User doesn't exist or password is wrong")
    }
}

async fn login_email(
    state: web::Data<SharedStubState>,
    body: web::Json<serde_json::Value>,
) -> HttpResponse {
    let mut state = state.lock().unwrap();
    state.login_email_hits += 1;
    if body["email"] == TEST_EMAIL && body["password"] == TEST_PASSWORD {
        token_response(&state)
    } else {
        HttpResponse::BadRequest().body("User doesn't exist or password is wrong")
    }
}

async fn activate_account(
    state: web::Data<SharedStubState>,
    body: web::Json<serde_json::Value>,
) -> HttpResponse {
    let state = state.lock().unwrap();
    if body["path"] == TEST_ACTIVATION_PATH {
        token_response(&state)
    } else {
        HttpResponse::BadRequest().body("Unknown or expired activation path")
    }
}

async fn password_reset(
    state: web::Data<SharedStubState>,
    body: web::Json<serde_json::Value>,
) -> HttpResponse {
    let state = state.lock().unwrap();
    if body["path"] == TEST_RESET_PATH && !body["password"].as_str().unwrap_or("").is_empty() {
        token_response(&state)
    } else {
        HttpResponse::BadRequest().body("Unknown or expired password reset path")
    }
}

async fn create_user(
    state: web::Data<SharedStubState>,
    body: web::Json<serde_json::Value>,
) -> HttpResponse {
    let mut state = state.lock().unwrap();
    state.register_bodies.push(body.into_inner());
    match &state.reject_register {
        Some(msg) => HttpResponse::BadRequest().body(msg.clone()),
        None => HttpResponse::Ok().json(serde_json::json!({ "path": CREATED_USER_PATH })),
    }
}

async fn get_user(
    state: web::Data<SharedStubState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let user_path = format!("/principals/users/{}/", path.into_inner());
    let (fail_user_fetch, profile) = {
        let mut state = state.lock().unwrap();
        state.user_fetch_hits += 1;
        let token = req
            .headers()
            .get(HEADER_USER_TOKEN)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        state.user_fetch_tokens.push(token);
        (state.fail_user_fetch, state.profiles.get(&user_path).cloned())
    };

    if fail_user_fetch {
        return HttpResponse::InternalServerError().body("stub backend set to fail user fetches");
    }
    let Some(profile) = profile else {
        return HttpResponse::NotFound().body("no such user");
    };
    if !profile.delay.is_zero() {
        tokio::time::sleep(profile.delay).await;
    }
    HttpResponse::Ok().json(serde_json::json!({
        "content_type": CONTENT_TYPE_USER,
        "path": user_path,
        "data": {
            (SHEET_USER_BASIC): {"name": profile.name, "tzname": profile.tzname}
        }
    }))
}
