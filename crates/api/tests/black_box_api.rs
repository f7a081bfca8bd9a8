use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use pipilica_api::app::services::AppServices;
use pipilica_auth::Hs256Verifier;
use pipilica_core::{DeleteAck, Document, InsertAck, UpdateAck};
use pipilica_infra::{
    Collection, DocumentStore, Filter, InMemoryDocumentStore, StoreError, StoreResult,
};

const SECRET: &str = "black-box-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(Arc::new(InMemoryDocumentStore::new())).await
    }

    async fn spawn_with(store: Arc<dyn DocumentStore>) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = pipilica_api::app::build_app(
            AppServices::new(store),
            Arc::new(Hs256Verifier::new(SECRET)),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Value,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut req = self.client.request(method, self.url(path)).json(&body);
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }
        let res = req.send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(email: &str) -> String {
    let now = Utc::now().timestamp();
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({"sub": format!("uid-{email}"), "email": email, "iat": now, "exp": now + 600}),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn all_bookings(server: &TestServer) -> Vec<Value> {
    let (_, body) = server.get_json("/allBookings").await;
    body.as_array().cloned().unwrap_or_default()
}

#[tokio::test]
async fn root_and_health_are_live() {
    let server = TestServer::spawn().await;

    let res = server.client.get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Running Server PiPiLiCa Shop");

    let res = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let server = TestServer::spawn().await;

    let res = server.client.get(server.url("/health")).send().await.unwrap();
    let generated = res.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert_eq!(generated.len(), 36);

    let res = server
        .client
        .get(server.url("/health"))
        .header("x-request-id", "req-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers().get("x-request-id").unwrap(), "req-123");
}

#[tokio::test]
async fn product_create_get_list_delete() {
    let server = TestServer::spawn().await;

    let (status, ack) = server
        .send_json(reqwest::Method::POST, "/products", json!({"name": "Mango", "price": 120}), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ack["acknowledged"], true);
    let id = ack["insertedId"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 24);

    let (status, product) = server.get_json(&format!("/products/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["name"], "Mango");
    assert_eq!(product["price"], 120);
    assert_eq!(product["_id"], id);

    let (status, all) = server.get_json("/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);

    let res = server
        .client
        .delete(server.url(&format!("/products/deleteProduct/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let del: Value = res.json().await.unwrap();
    assert_eq!(del["deletedCount"], 1);

    let (_, gone) = server.get_json(&format!("/products/{id}")).await;
    assert_eq!(gone, Value::Null);
}

#[tokio::test]
async fn unknown_product_is_null_not_404() {
    let server = TestServer::spawn().await;
    let (status, body) = server.get_json("/products/507f1f77bcf86cd799439011").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn malformed_id_is_bad_request() {
    let server = TestServer::spawn().await;
    let (status, body) = server.get_json("/products/not-an-id").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn bookings_lifecycle() {
    let server = TestServer::spawn().await;

    for (email, item) in [("a@x.io", "Mango"), ("b@x.io", "Litchi"), ("a@x.io", "Jackfruit")] {
        let (status, _) = server
            .send_json(
                reqwest::Method::POST,
                "/bookings",
                json!({"email": email, "item": item, "status": "pending"}),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, all) = server.get_json("/allBookings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (status, mine) = server.get_json("/bookings?email=a@x.io").await;
    assert_eq!(status, StatusCode::OK);
    let items: Vec<_> = mine.as_array().unwrap().iter().map(|b| b["item"].clone()).collect();
    assert_eq!(items, [json!("Mango"), json!("Jackfruit")]);

    let id = mine[0]["_id"].as_str().unwrap().to_string();
    let (status, ack) = server
        .send_json(
            reqwest::Method::PUT,
            &format!("/bookings/updateBooking/{id}"),
            json!({"status": "approved"}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ack["matchedCount"], 1);
    assert_eq!(ack["modifiedCount"], 1);

    let (_, mine) = server.get_json("/bookings?email=a@x.io").await;
    assert_eq!(mine[0]["status"], "approved");
    assert_eq!(mine[0]["item"], "Mango");

    let res = server
        .client
        .delete(server.url(&format!("/bookings/deleteBooking/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let del: Value = res.json().await.unwrap();
    assert_eq!(del["deletedCount"], 1);

    assert_eq!(all_bookings(&server).await.len(), 2);
}

#[tokio::test]
async fn bookings_without_email_match_documents_lacking_one() {
    let server = TestServer::spawn().await;
    server
        .send_json(reqwest::Method::POST, "/bookings", json!({"status": "pending"}), None)
        .await;
    server
        .send_json(reqwest::Method::POST, "/bookings", json!({"email": "a@x.io"}), None)
        .await;

    let (status, body) = server.get_json("/bookings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["status"], "pending");
}

#[tokio::test]
async fn invalid_token_on_bookings_is_not_a_client_error() {
    let server = TestServer::spawn().await;
    let res = server
        .client
        .get(server.url("/bookings?email=a@x.io"))
        .bearer_auth("garbage.token.value")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .client
        .get(server.url("/bookings?email=a@x.io"))
        .bearer_auth(mint_jwt("a@x.io"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn reviews_create_is_200() {
    let server = TestServer::spawn().await;
    let (status, ack) = server
        .send_json(reqwest::Method::POST, "/reviews", json!({"text": "fresh", "stars": 5}), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["acknowledged"], true);

    let (status, all) = server.get_json("/reviews").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all[0]["text"], "fresh");
}

#[tokio::test]
async fn put_users_upserts_new_email_with_exact_fields() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let server = TestServer::spawn_with(store.clone()).await;

    let (status, ack) = server
        .send_json(
            reqwest::Method::PUT,
            "/users",
            json!({"email": "new@x.io", "displayName": "New"}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["upsertedCount"], 1);
    assert_eq!(ack["matchedCount"], 0);
    let id = ack["upsertedId"].as_str().unwrap();

    let stored = store.find(Collection::Users, Filter::All).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(
        Value::Object(stored[0].clone()),
        json!({"email": "new@x.io", "displayName": "New", "_id": id})
    );
}

#[tokio::test]
async fn put_users_existing_email_changes_only_submitted_fields() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let server = TestServer::spawn_with(store.clone()).await;

    let (status, _) = server
        .send_json(
            reqwest::Method::POST,
            "/users",
            json!({"email": "ann@x.io", "displayName": "Ann", "role": "user"}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, ack) = server
        .send_json(
            reqwest::Method::PUT,
            "/users",
            json!({"email": "ann@x.io", "displayName": "Anna"}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["matchedCount"], 1);
    assert_eq!(ack["upsertedId"], Value::Null);

    let user = store
        .find_one(Collection::Users, Filter::email(Some("ann@x.io".into())))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user["displayName"], "Anna");
    assert_eq!(user["role"], "user");
}

#[tokio::test]
async fn admin_status_reflects_role() {
    let server = TestServer::spawn().await;
    for user in [
        json!({"email": "boss@x.io", "role": "admin"}),
        json!({"email": "ann@x.io", "role": "user"}),
    ] {
        server.send_json(reqwest::Method::POST, "/users", user, None).await;
    }

    assert_eq!(server.get_json("/users/boss@x.io").await, (StatusCode::OK, json!({"admin": true})));
    assert_eq!(server.get_json("/users/ann@x.io").await, (StatusCode::OK, json!({"admin": false})));
    assert_eq!(server.get_json("/users/ghost@x.io").await, (StatusCode::OK, json!({"admin": false})));
}

#[tokio::test]
async fn make_admin_without_auth_is_denied() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let server = TestServer::spawn_with(store.clone()).await;
    server
        .send_json(reqwest::Method::POST, "/users", json!({"email": "ann@x.io", "role": "user"}), None)
        .await;

    let (status, body) = server
        .send_json(reqwest::Method::PUT, "/users/admin", json!({"email": "ann@x.io"}), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"message": "No Access to Make Admin"}));

    let (status, _) = server
        .send_json(
            reqwest::Method::PUT,
            "/users/admin",
            json!({"email": "ann@x.io"}),
            Some("not-a-jwt"),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert_eq!(server.get_json("/users/ann@x.io").await.1, json!({"admin": false}));
}

#[tokio::test]
async fn make_admin_by_admin_promotes_target() {
    let server = TestServer::spawn().await;
    for user in [
        json!({"email": "boss@x.io", "role": "admin"}),
        json!({"email": "ann@x.io", "role": "user"}),
    ] {
        server.send_json(reqwest::Method::POST, "/users", user, None).await;
    }

    let token = mint_jwt("boss@x.io");
    let (status, ack) = server
        .send_json(reqwest::Method::PUT, "/users/admin", json!({"email": "ann@x.io"}), Some(token.as_str()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["acknowledged"], true);
    assert_eq!(ack["matchedCount"], 1);
    assert_eq!(ack["modifiedCount"], 1);

    assert_eq!(server.get_json("/users/ann@x.io").await.1, json!({"admin": true}));
}

#[tokio::test]
async fn make_admin_by_non_admin_or_unknown_is_denied() {
    let server = TestServer::spawn().await;
    for user in [
        json!({"email": "ann@x.io", "role": "user"}),
        json!({"email": "bob@x.io"}),
    ] {
        server.send_json(reqwest::Method::POST, "/users", user, None).await;
    }

    for requester in ["ann@x.io", "ghost@x.io"] {
        let (status, body) = server
            .send_json(
                reqwest::Method::PUT,
                "/users/admin",
                json!({"email": "bob@x.io"}),
                Some(mint_jwt(requester).as_str()),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "No Access to Make Admin");
    }

    assert_eq!(server.get_json("/users/bob@x.io").await.1, json!({"admin": false}));
}

#[tokio::test]
async fn get_users_admin_reports_the_user_named_admin() {
    let server = TestServer::spawn().await;
    assert_eq!(server.get_json("/users/admin").await, (StatusCode::OK, json!({"admin": false})));

    server
        .send_json(reqwest::Method::POST, "/users", json!({"email": "admin", "role": "admin"}), None)
        .await;
    assert_eq!(server.get_json("/users/admin").await, (StatusCode::OK, json!({"admin": true})));
}

#[tokio::test]
async fn make_admin_for_missing_target_matches_nothing_and_inserts_nothing() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let server = TestServer::spawn_with(store.clone()).await;
    server
        .send_json(reqwest::Method::POST, "/users", json!({"email": "boss@x.io", "role": "admin"}), None)
        .await;

    let token = mint_jwt("boss@x.io");
    let (status, ack) = server
        .send_json(reqwest::Method::PUT, "/users/admin", json!({"email": "ghost@x.io"}), Some(token.as_str()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["matchedCount"], 0);
    assert_eq!(ack["modifiedCount"], 0);
    assert_eq!(ack["upsertedCount"], 0);
    assert_eq!(ack["upsertedId"], Value::Null);

    assert_eq!(store.find(Collection::Users, Filter::All).await.unwrap().len(), 1);
}

#[tokio::test]
async fn make_admin_without_email_in_body_promotes_no_one() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let server = TestServer::spawn_with(store.clone()).await;
    for user in [
        json!({"email": "boss@x.io", "role": "admin"}),
        json!({"email": "ann@x.io", "role": "user"}),
    ] {
        server.send_json(reqwest::Method::POST, "/users", user, None).await;
    }

    let token = mint_jwt("boss@x.io");
    let (status, ack) = server
        .send_json(reqwest::Method::PUT, "/users/admin", json!({}), Some(token.as_str()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["matchedCount"], 0);

    assert_eq!(server.get_json("/users/ann@x.io").await.1, json!({"admin": false}));
    assert_eq!(store.find(Collection::Users, Filter::All).await.unwrap().len(), 2);
}

#[tokio::test]
async fn put_users_with_non_object_id_is_rejected() {
    let server = TestServer::spawn().await;
    let (status, body) = server
        .send_json(
            reqwest::Method::PUT,
            "/users",
            json!({"email": "a@x.io", "_id": "mango"}),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
}

/// Store whose every operation fails at the backend.
struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn find(&self, _: Collection, _: Filter) -> StoreResult<Vec<Document>> {
        Err(StoreError::Backend("connection reset".into()))
    }

    async fn find_one(&self, _: Collection, _: Filter) -> StoreResult<Option<Document>> {
        Err(StoreError::Backend("connection reset".into()))
    }

    async fn insert_one(&self, _: Collection, _: Document) -> StoreResult<InsertAck> {
        Err(StoreError::Backend("connection reset".into()))
    }

    async fn update_one(
        &self,
        _: Collection,
        _: Filter,
        _: Document,
        _: bool,
    ) -> StoreResult<UpdateAck> {
        Err(StoreError::Backend("connection reset".into()))
    }

    async fn delete_one(&self, _: Collection, _: Filter) -> StoreResult<DeleteAck> {
        Err(StoreError::Backend("connection reset".into()))
    }
}

#[tokio::test]
async fn store_failures_are_500_store_error() {
    let server = TestServer::spawn_with(Arc::new(FailingStore)).await;

    let (status, body) = server.get_json("/products").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "store_error");

    let (status, body) = server
        .send_json(reqwest::Method::POST, "/reviews", json!({"text": "x"}), None)
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "store_error");

    let (status, _) = server
        .send_json(
            reqwest::Method::PUT,
            "/users/admin",
            json!({"email": "x@x.io"}),
            Some(mint_jwt("boss@x.io").as_str()),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn liveness_does_not_touch_the_store() {
    let server = TestServer::spawn_with(Arc::new(FailingStore)).await;
    let res = server.client.get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
