use crate::helpers::{no_cb, spawn_app, CREATED_USER_PATH, TEST_EMAIL, TEST_USERNAME};
use adhocracy_shared::{
    req_args::{CaptchaGuess, RegisterReqArgs},
    resource::{
        CONTENT_TYPE_USER, SHEET_CAPTCHA, SHEET_PASSWORD_AUTHENTICATION, SHEET_USER_BASIC,
        SHEET_USER_EXTENDED,
    },
};

fn register_args() -> RegisterReqArgs {
    RegisterReqArgs::new(
        TEST_USERNAME.try_into().unwrap(),
        TEST_EMAIL,
        "a new password".to_string().into(),
        "a new password".to_string().into(),
    )
}

#[tokio::test]
async fn register_without_captcha_omits_the_captcha_sheet() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .session
        .register(&register_args(), no_cb)
        .await
        .expect("failed to receive on rx")
        .unwrap();

    // Assert - response carries the created resource path
    assert_eq!(response.path, CREATED_USER_PATH.try_into().unwrap());

    // Assert - submitted resource shape
    let state = app.state.lock().unwrap();
    let body = state.register_bodies.last().unwrap();
    assert_eq!(body["content_type"], CONTENT_TYPE_USER);
    let data = body["data"].as_object().unwrap();
    assert_eq!(data[SHEET_USER_BASIC]["name"], TEST_USERNAME);
    assert_eq!(data[SHEET_USER_EXTENDED]["email"], TEST_EMAIL);
    assert_eq!(
        data[SHEET_PASSWORD_AUTHENTICATION]["password"],
        "a new password"
    );
    assert!(!data.contains_key(SHEET_CAPTCHA));
}

#[tokio::test]
async fn register_with_captcha_includes_exactly_id_and_solution() {
    // Arrange
    let app = spawn_app().await;
    let args = register_args().captcha(Some(CaptchaGuess {
        id: "captcha-1".to_string(),
        solution: "7".to_string(),
    }));

    // Act
    app.session
        .register(&args, no_cb)
        .await
        .expect("failed to receive on rx")
        .unwrap();

    // Assert
    let state = app.state.lock().unwrap();
    let body = state.register_bodies.last().unwrap();
    let captcha = body["data"][SHEET_CAPTCHA].as_object().unwrap();
    assert_eq!(captcha.len(), 2);
    assert_eq!(captcha["id"], "captcha-1");
    assert_eq!(captcha["solution"], "7");
}

#[tokio::test]
async fn register_does_not_log_the_user_in() {
    // Arrange
    let app = spawn_app().await;

    // Act
    app.session
        .register(&register_args(), no_cb)
        .await
        .expect("failed to receive on rx")
        .unwrap();

    // Assert
    assert_eq!(app.store.token(), None);
    assert!(!app.session.is_logged_in());
}

#[tokio::test]
async fn register_backend_validation_error_is_passed_through() {
    // Arrange
    let app = spawn_app().await;
    let error_msg = "The user login name is already in use";
    app.state.lock().unwrap().reject_register = Some(error_msg.to_string());

    // Act
    let outcome = app
        .session
        .register(&register_args(), no_cb)
        .await
        .expect("failed to receive on rx");

    // Assert
    assert_eq!(outcome.unwrap_err().to_string(), error_msg);
}

#[tokio::test]
async fn register_with_mismatched_passwords_is_rejected_locally() {
    // Arrange
    let app = spawn_app().await;
    let mut args = register_args();
    args.password_check = "something else".to_string().into();

    // Act
    let outcome = app
        .session
        .register(&args, no_cb)
        .await
        .expect("failed to receive on rx");

    // Assert - rejected before any request was made
    assert!(outcome.is_err());
    assert!(app.state.lock().unwrap().register_bodies.is_empty());
}
