//! Login, profile and logout through the JWT endpoint.

#![allow(clippy::unwrap_used)]

use azlan_core::CustomerId;
use azlan_integration_tests::{Backend, FakeWoo, customer};
use azlan_storefront::session::SessionError;
use azlan_storefront::storage::{KeyValueStore, keys};
use azlan_storefront::woo::WooError;
use azlan_storefront::{AppError, NoticeLevel};

fn backend() -> Backend {
    Backend::default().with_customer(customer(
        77,
        "sana@example.com",
        "correct horse",
        "Sana Malik",
    ))
}

#[tokio::test]
async fn test_login_stores_session_and_reads_profile() {
    let woo = FakeWoo::start(backend()).await;
    let (state, store, notices) = woo.app_state();

    let user = state
        .login("sana@example.com", "correct horse")
        .await
        .unwrap();
    assert_eq!(user.id, Some(CustomerId::new(77)));
    assert_eq!(user.display_name, "Sana Malik");

    assert_eq!(store.get(keys::AUTH_TOKEN).unwrap().as_deref(), Some("token-for-77"));
    assert_eq!(store.get(keys::USER_ID).unwrap().as_deref(), Some("77"));
    assert!(state.session().is_logged_in());
    assert_eq!(state.session().customer_id(), Some(CustomerId::new(77)));

    let token = state.session().token().unwrap();
    let profile = state
        .woo()
        .customer_profile(token.as_deref())
        .await
        .unwrap();
    assert_eq!(profile.display_name(), "Sana Malik");

    let notices = notices.drain();
    assert_eq!(notices[0].level, NoticeLevel::Success);
    assert_eq!(notices[0].message, "Welcome back, Sana Malik!");
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let woo = FakeWoo::start(backend()).await;
    let (state, store, _) = woo.app_state();

    let err = state
        .login("sana@example.com", "tr0ub4dor")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Session(SessionError::Login(WooError::Api { status: 403, ref message }))
            if message == "The password you entered is incorrect."
    ));
    assert!(!state.session().is_logged_in());
    assert_eq!(store.get(keys::AUTH_TOKEN).unwrap(), None);
}

#[tokio::test]
async fn test_logout_forgets_everything() {
    let woo = FakeWoo::start(backend()).await;
    let (state, store, _) = woo.app_state();
    state
        .login("sana@example.com", "correct horse")
        .await
        .unwrap();

    state.logout().unwrap();

    for key in keys::SESSION {
        assert_eq!(store.get(key).unwrap(), None, "{key} should be removed");
    }
    assert_eq!(state.session().current_user().unwrap(), None);

    let err = state
        .woo()
        .customer_profile(state.session().token().unwrap().as_deref())
        .await
        .unwrap_err();
    assert!(matches!(err, WooError::NotAuthenticated));
}
