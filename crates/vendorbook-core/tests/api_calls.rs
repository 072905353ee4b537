//! Profile and menu calls through the authenticated request layer.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use vendorbook_core::api::{ApiClient, ApiError};
use vendorbook_core::auth::{FileTokenStore, SessionClient, SessionState};
use vendorbook_core::models::{MenuCategory, MenuItemForm, MenuItemStatus, ProfileUpdate};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn signed_in() -> (MockServer, SessionClient, TempDir) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "abc",
            "user": {"id": 1, "email": "vendor@shop.pk", "fullName": "Ushna"}
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileTokenStore::new(dir.path()));
    let client = SessionClient::new(store, &format!("{}/api", server.uri()), Duration::from_secs(5))
        .unwrap();
    client.login("vendor@shop.pk", "secret").await.unwrap();
    (server, client, dir)
}

#[tokio::test]
async fn update_profile_refreshes_session_user() {
    let (server, client, _dir) = signed_in().await;
    Mock::given(method("PUT"))
        .and(path("/api/users/profile"))
        .and(header("Authorization", "Bearer abc"))
        .and(body_json(json!({"phone": "0300-1234567"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": 1, "email": "vendor@shop.pk", "fullName": "Ushna", "phone": "0300-1234567"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let update = ProfileUpdate {
        phone: Some("0300-1234567".into()),
        ..Default::default()
    };
    let user = client.api().update_profile(&update).await.unwrap();
    assert_eq!(user.phone.as_deref(), Some("0300-1234567"));

    let session = client.session();
    assert_eq!(
        session.user().and_then(|u| u.phone.as_deref()),
        Some("0300-1234567")
    );
    assert_eq!(session.token(), Some("abc"));
}

#[tokio::test]
async fn empty_profile_update_is_rejected_locally() {
    let (_server, client, _dir) = signed_in().await;
    let err = client
        .api()
        .update_profile(&ProfileUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn profile_by_id_unwraps_envelope() {
    let (server, client, _dir) = signed_in().await;
    Mock::given(method("GET"))
        .and(path("/api/profile/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "profile": {"id": 42, "email": "other@shop.pk", "displayName": "Karachi Caterers"}
        })))
        .mount(&server)
        .await;

    let profile = client.api().profile_by_id("42").await.unwrap();
    assert_eq!(profile.id, "42");
    assert_eq!(profile.display_name(), "Karachi Caterers");
}

#[tokio::test]
async fn profile_id_is_escaped_into_one_segment() {
    let (server, client, _dir) = signed_in().await;
    Mock::given(method("GET"))
        .and(path("/api/profile/..%2Fusers%2Fme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "profile": {"id": "x", "email": "other@shop.pk"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let profile = client.api().profile_by_id("../users/me").await.unwrap();
    assert_eq!(profile.id, "x");
}

#[tokio::test]
async fn menus_filtered_by_vendor() {
    let (server, client, _dir) = signed_in().await;
    Mock::given(method("GET"))
        .and(path("/api/menus"))
        .and(query_param("vendor_id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "menus": [
                {"id": 1, "vendor_id": 7, "name": "Samosa", "price": 1.5, "category": "appetizers"},
                {"id": 2, "vendor_id": 7, "name": "Chai", "price": 0.75, "category": "drinks", "status": "inactive"}
            ]
        })))
        .mount(&server)
        .await;

    let menus = client.api().list_menus(Some("7")).await.unwrap();
    assert_eq!(menus.len(), 2);
    assert_eq!(menus[0].category, MenuCategory::Appetizers);
    assert_eq!(menus[1].status, MenuItemStatus::Inactive);
}

#[tokio::test]
async fn create_menu_sends_validated_item() {
    let (server, client, _dir) = signed_in().await;
    Mock::given(method("POST"))
        .and(path("/api/menus"))
        .and(body_json(json!({
            "name": "Biryani",
            "description": "",
            "price": 12.5,
            "category": "main",
            "image": "https://picsum.photos/200",
            "status": "active"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "menu": {"_id": "m1", "name": "Biryani", "price": 12.5, "category": "main"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let form = MenuItemForm {
        name: "Biryani".into(),
        price: "12.5".into(),
        category: "MAIN".into(),
        ..Default::default()
    };
    let item = form.validate().unwrap();
    let created = client.api().create_menu(&item).await.unwrap();
    assert_eq!(created.id, "m1");
}

#[tokio::test]
async fn toggle_and_delete_menu() {
    let (server, client, _dir) = signed_in().await;
    Mock::given(method("PUT"))
        .and(path("/api/menus/m1"))
        .and(body_json(json!({"status": "inactive"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m1", "name": "Biryani", "price": 12.5, "category": "main", "status": "inactive"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/menus/m1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let item: vendorbook_core::models::MenuItem = serde_json::from_value(json!({
        "id": "m1", "name": "Biryani", "price": 12.5, "category": "main"
    }))
    .unwrap();
    let updated = client
        .api()
        .update_menu(&item.id, &item.toggle_visibility())
        .await
        .unwrap();
    assert_eq!(updated.status, MenuItemStatus::Inactive);

    client.api().delete_menu("m1").await.unwrap();
}

#[tokio::test]
async fn server_error_carries_message() {
    let (server, client, _dir) = signed_in().await;
    Mock::given(method("GET"))
        .and(path("/api/menus/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Menu item not found"})),
        )
        .mount(&server)
        .await;

    let err = client.api().menu("missing").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(err.user_message(), "Menu item not found");
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn rate_limited_requests_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "email": "a@b.com"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(SessionState::new(Arc::new(FileTokenStore::new(dir.path()))));
    let api = ApiClient::new(&format!("{}/api", server.uri()), Duration::from_secs(5), state)
        .unwrap()
        .with_initial_backoff(Duration::from_millis(5));

    let profiles = api.all_profiles().await.unwrap();
    assert_eq!(profiles.len(), 1);
}

#[tokio::test]
async fn rate_limit_gives_up_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(429))
        .expect(4)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(SessionState::new(Arc::new(FileTokenStore::new(dir.path()))));
    let api = ApiClient::new(&format!("{}/api", server.uri()), Duration::from_secs(5), state)
        .unwrap()
        .with_initial_backoff(Duration::from_millis(1));

    let err = api.all_profiles().await.unwrap_err();
    assert!(matches!(err, ApiError::RateLimited));
}
