//! Integration tests for the wedding invitation backend.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{redirect, Client};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::auth::AdminGate;
use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::live::LiveStore;
use crate::{admin_credentials, create_router, AppState};

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "correct-horse";

fn test_config(temp_dir: &TempDir, with_admin: bool) -> Config {
    Config {
        admin_email: with_admin.then(|| ADMIN_EMAIL.to_string()),
        admin_password: with_admin.then(|| ADMIN_PASSWORD.to_string()),
        db_path: temp_dir.path().join("test.sqlite"),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        public_base_url: "https://wedding.example".to_string(),
        session_ttl_hours: 24,
        log_level: "warn".to_string(),
    }
}

/// Start a server on a random port and return its address.
async fn spawn_app(config: Config) -> SocketAddr {
    let pool = init_database(&config.db_path)
        .await
        .expect("Failed to init DB");
    let repo = Arc::new(Repository::new(pool));

    let live = Arc::new(LiveStore::new());
    live.prime(&repo).await.expect("Failed to prime live store");

    let gate = Arc::new(AdminGate::new(
        admin_credentials(&config),
        config.session_ttl_hours,
    ));

    let state = AppState {
        repo,
        live,
        gate,
        config: Arc::new(config),
    };

    let app = create_router(state);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get addr");

    // Spawn server
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    addr
}

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    /// Server with an admin account; the client is already signed in.
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let addr = spawn_app(test_config(&temp_dir, true)).await;
        let base_url = format!("http://{}", addr);

        let login: Value = Client::new()
            .post(format!("{}/api/admin/login", base_url))
            .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let token = login["data"]["token"].as_str().expect("No session token");

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", token).parse().unwrap(),
        );

        TestFixture {
            client: Client::builder().default_headers(headers).build().unwrap(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    /// Server without an admin account; admin routes are open.
    async fn without_admin() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let addr = spawn_app(test_config(&temp_dir, false)).await;

        TestFixture {
            client: Client::new(),
            base_url: format!("http://{}", addr),
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn add_guest(&self, name: &str) -> Value {
        let resp = self
            .client
            .post(self.url("/api/admin/guests"))
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        resp.json().await.unwrap()
    }

    async fn rsvp(&self, slug: &str, name: &str, will_attend: &str) -> Value {
        let resp = self
            .client
            .post(self.url(&format!("/api/invite/{}/responses", slug)))
            .json(&json!({ "name": name, "willAttend": will_attend, "comment": "Congrats!" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        resp.json().await.unwrap()
    }

    async fn get_json(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_missing_session() {
    let fixture = TestFixture::new().await;

    // Fresh client without the session token
    let resp = Client::new()
        .get(fixture.url("/api/admin/guests"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_auth_invalid_session() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .get(fixture.url("/api/admin/dashboard"))
        .header("x-session-token", "not-a-session")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .post(fixture.url("/api/admin/login"))
        .json(&json!({ "email": ADMIN_EMAIL, "password": "wrong" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_login_sets_cookie_and_logout_ends_session() {
    let fixture = TestFixture::new().await;
    let client = Client::new();

    let resp = client
        .post(fixture.url("/api/admin/login"))
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let cookie = resp
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("wedding_admin="));

    let body: Value = resp.json().await.unwrap();
    let token = body["data"]["token"].as_str().unwrap().to_string();

    // Cookie alone authenticates
    let pair = cookie.split(';').next().unwrap().to_string();
    let resp = client
        .get(fixture.url("/api/admin/guests"))
        .header(reqwest::header::COOKIE, pair)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let status: Value = client
        .get(fixture.url("/api/admin/session"))
        .header("x-session-token", &token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["data"]["authenticated"], true);
    assert_eq!(status["data"]["gateEnabled"], true);

    let resp = client
        .post(fixture.url("/api/admin/logout"))
        .header("x-session-token", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .get(fixture.url("/api/admin/guests"))
        .header("x-session-token", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_admin_open_without_account() {
    let fixture = TestFixture::without_admin().await;

    let (status, body) = fixture.get_json("/api/admin/guests").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);

    let (_, session) = fixture.get_json("/api/admin/session").await;
    assert_eq!(session["data"]["authenticated"], true);
    assert_eq!(session["data"]["gateEnabled"], false);
}

#[tokio::test]
async fn test_public_routes_need_no_session() {
    let fixture = TestFixture::new().await;
    fixture.add_guest("Jane Roe").await;

    let client = Client::new();
    let resp = client
        .get(fixture.url("/api/invite/jane-roe"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client.get(fixture.url("/api/config")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_guest_crud() {
    let fixture = TestFixture::new().await;

    // Create guest
    let created = fixture.add_guest("John Doe").await;
    assert_eq!(created["success"], true);
    assert_eq!(created["data"]["slug"], "john-doe");
    assert_eq!(created["data"]["name"], "John Doe");
    assert_eq!(created["data"]["isFamily"], false);

    // Get guest
    let (status, body) = fixture.get_json("/api/admin/guests/john-doe").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["name"], "John Doe");

    // List guests
    fixture.add_guest("Jane Roe").await;
    let (_, body) = fixture.get_json("/api/admin/guests").await;
    let guests = body["data"].as_array().unwrap();
    assert_eq!(guests.len(), 2);
    assert_eq!(guests[0]["slug"], "jane-roe");

    // Delete guest
    let resp = fixture
        .client
        .delete(fixture.url("/api/admin/guests/john-doe"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (status, body) = fixture.get_json("/api/admin/guests/john-doe").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    // Deleting again is not an error
    let resp = fixture
        .client
        .delete(fixture.url("/api/admin/guests/john-doe"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_add_guest_blank_name() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/admin/guests"))
        .json(&json!({ "name": "   " }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_add_guest_same_slug_overwrites() {
    let fixture = TestFixture::new().await;

    fixture.add_guest("John Doe").await;
    let resp = fixture
        .client
        .post(fixture.url("/api/admin/guests"))
        .json(&json!({ "name": "JOHN   DOE", "isFamily": true }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["slug"], "john-doe");
    assert_eq!(body["data"]["name"], "JOHN   DOE");

    let (_, body) = fixture.get_json("/api/admin/guests").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["isFamily"], true);
}

#[tokio::test]
async fn test_rsvp_flow_updates_stats() {
    let fixture = TestFixture::new().await;

    fixture.add_guest("John Doe").await;
    let (_, invite) = fixture.get_json("/api/invite/john-doe").await;
    assert_eq!(invite["data"]["prefilledName"], "john doe");

    let submitted = fixture.rsvp("john-doe", "John Doe", "yes").await;
    assert_eq!(submitted["data"]["guestSlug"], "john-doe");
    assert_eq!(submitted["data"]["willAttend"], "yes");
    assert_eq!(submitted["data"]["comment"], "Congrats!");

    let (_, stats) = fixture.get_json("/api/admin/stats").await;
    assert_eq!(stats["data"]["totalGuests"], 1);
    assert_eq!(stats["data"]["totalResponses"], 1);
    assert_eq!(stats["data"]["attending"], 1);
    assert_eq!(stats["data"]["notAttending"], 0);
    assert_eq!(stats["data"]["noResponse"], 0);

    let (_, dashboard) = fixture.get_json("/api/admin/dashboard").await;
    let row = &dashboard["data"]["guests"][0];
    assert_eq!(row["slug"], "john-doe");
    assert_eq!(row["responseCount"], 1);
    assert_eq!(row["attending"], 1);
}

#[tokio::test]
async fn test_rsvp_each_submission_is_kept() {
    let fixture = TestFixture::new().await;

    fixture.add_guest("John Doe").await;
    fixture.add_guest("Jane Roe").await;
    fixture.rsvp("john-doe", "John Doe", "yes").await;
    fixture.rsvp("john-doe", "John Doe", "no").await;

    let (_, body) = fixture.get_json("/api/invite/john-doe/responses").await;
    let responses = body["data"].as_array().unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["willAttend"], "no");

    let (_, stats) = fixture.get_json("/api/admin/stats").await;
    assert_eq!(stats["data"]["totalGuests"], 2);
    assert_eq!(stats["data"]["totalResponses"], 2);
    assert_eq!(stats["data"]["attending"], 1);
    assert_eq!(stats["data"]["notAttending"], 1);
    assert_eq!(stats["data"]["noResponse"], 1);
}

#[tokio::test]
async fn test_rsvp_requires_name() {
    let fixture = TestFixture::new().await;
    fixture.add_guest("John Doe").await;

    let resp = fixture
        .client
        .post(fixture.url("/api/invite/john-doe/responses"))
        .json(&json!({ "name": " ", "willAttend": "yes" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = fixture
        .client
        .post(fixture.url("/api/invite/john-doe/responses"))
        .json(&json!({ "name": "John", "willAttend": "maybe" }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn test_deleted_guest_keeps_responses() {
    let fixture = TestFixture::new().await;

    fixture.add_guest("John Doe").await;
    fixture.rsvp("john-doe", "John Doe", "yes").await;
    fixture
        .client
        .delete(fixture.url("/api/admin/guests/john-doe"))
        .send()
        .await
        .unwrap();

    let (status, _) = fixture.get_json("/api/invite/john-doe").await;
    assert_eq!(status, 404);

    let (_, body) = fixture.get_json("/api/admin/guests/john-doe/responses").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, stats) = fixture.get_json("/api/admin/stats").await;
    assert_eq!(stats["data"]["totalGuests"], 0);
    assert_eq!(stats["data"]["totalResponses"], 0);
}

#[tokio::test]
async fn test_toggle_family_hides_gift() {
    let fixture = TestFixture::new().await;
    fixture.add_guest("Aunt May").await;

    let (_, invite) = fixture.get_json("/api/invite/aunt-may").await;
    assert_eq!(invite["data"]["showGift"], true);
    assert!(!invite["data"]["config"]["giftAccounts"]
        .as_array()
        .unwrap()
        .is_empty());

    let resp = fixture
        .client
        .post(fixture.url("/api/admin/guests/aunt-may/toggle-family"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["isFamily"], true);

    let (_, invite) = fixture.get_json("/api/invite/aunt-may").await;
    assert_eq!(invite["data"]["showGift"], false);
    assert!(invite["data"]["config"]["giftAccounts"]
        .as_array()
        .unwrap()
        .is_empty());

    fixture
        .client
        .post(fixture.url("/api/admin/guests/aunt-may/toggle-family"))
        .send()
        .await
        .unwrap();
    let (_, invite) = fixture.get_json("/api/invite/aunt-may").await;
    assert_eq!(invite["data"]["showGift"], true);

    // Unknown slug is a no-op
    let resp = fixture
        .client
        .post(fixture.url("/api/admin/guests/nobody/toggle-family"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_share_message() {
    let fixture = TestFixture::new().await;
    fixture.add_guest("John Doe").await;

    let (status, body) = fixture.get_json("/api/admin/guests/john-doe/share").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["link"], "https://wedding.example/invite/john-doe");
    assert_eq!(body["data"]["language"], "id");
    let message = body["data"]["message"].as_str().unwrap();
    assert!(message.contains("John Doe"));
    assert!(message.contains("https://wedding.example/invite/john-doe"));

    let (_, body) = fixture
        .get_json("/api/admin/guests/john-doe/share?lang=en")
        .await;
    assert_eq!(body["data"]["language"], "en");

    let (status, _) = fixture.get_json("/api/admin/guests/nobody/share").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_share_link_with_reserved_characters_resolves() {
    let fixture = TestFixture::new().await;
    let created = fixture.add_guest("Mr./Mrs. Smith").await;
    let slug = created["data"]["slug"].as_str().unwrap().to_string();
    assert_eq!(slug, "mr./mrs.-smith");

    let (status, body) = fixture
        .get_json(&format!("/api/admin/guests/{}/share", urlencoding::encode(&slug)))
        .await;
    assert_eq!(status, 200);
    let link = body["data"]["link"].as_str().unwrap();
    assert_eq!(link, "https://wedding.example/invite/mr.%2Fmrs.-smith");

    // The link path must hit the invitation route as-is
    let path = link.strip_prefix("https://wedding.example").unwrap();
    let (status, invite) = fixture.get_json(&format!("/api{}", path)).await;
    assert_eq!(status, 200);
    assert_eq!(invite["data"]["guest"]["name"], "Mr./Mrs. Smith");
    assert_eq!(invite["data"]["guest"]["slug"], "mr./mrs.-smith");
}

#[tokio::test]
async fn test_config_roundtrip_and_validation() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/admin/config").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["schemaVersion"], 2);

    let mut config = body["data"].clone();
    config["groomName"] = json!("Romeo");
    config["brideName"] = json!("Juliet");
    config["giftAccounts"] = json!([
        { "bankName": "BCA", "accountNumber": "111", "accountName": "Romeo" },
        { "bankName": "BNI", "accountNumber": "222", "accountName": "Juliet" }
    ]);

    let resp = fixture
        .client
        .put(fixture.url("/api/admin/config"))
        .json(&config)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (_, public) = fixture.get_json("/api/config").await;
    assert_eq!(public["data"]["groomName"], "Romeo");
    assert_eq!(public["data"]["giftAccounts"].as_array().unwrap().len(), 2);

    // Missing required field
    config["venueName"] = json!("");
    let resp = fixture
        .client
        .put(fixture.url("/api/admin/config"))
        .json(&config)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Unparseable date
    config["venueName"] = json!("Hall");
    config["weddingDate"] = json!("next spring");
    let resp = fixture
        .client
        .put(fixture.url("/api/admin/config"))
        .json(&config)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Failed writes leave the stored document untouched
    let (_, public) = fixture.get_json("/api/config").await;
    assert_eq!(public["data"]["venueName"], "Venue Name");
    assert_eq!(public["data"]["groomName"], "Romeo");
}

#[tokio::test]
async fn test_landing_redirect() {
    let fixture = TestFixture::new().await;
    let client = Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .unwrap();

    let resp = client
        .get(fixture.url("/go?name=John%20%20Doe"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(
        resp.headers().get(reqwest::header::LOCATION).unwrap(),
        "/invite/john-doe"
    );

    let resp = client
        .get(fixture.url("/go?name=Mr.%2FMrs.%20Smith"))
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.headers().get(reqwest::header::LOCATION).unwrap(),
        "/invite/mr.%2Fmrs.-smith"
    );

    let resp = client.get(fixture.url("/go?name=")).send().await.unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(resp.headers().get(reqwest::header::LOCATION).unwrap(), "/");
}

#[tokio::test]
async fn test_revision_increments() {
    let fixture = TestFixture::new().await;

    let (_, before) = fixture.get_json("/api/revision").await;
    let initial = before["data"]["revisionId"].as_i64().unwrap();

    fixture.add_guest("John Doe").await;
    let submitted = fixture.rsvp("john-doe", "John Doe", "yes").await;
    assert_eq!(submitted["revisionId"].as_i64().unwrap(), initial + 2);

    let (_, after) = fixture.get_json("/api/revision").await;
    assert_eq!(after["data"]["revisionId"].as_i64().unwrap(), initial + 2);
}

/// Read SSE chunks until one contains `needle`.
async fn wait_for_event(resp: &mut reqwest::Response, needle: &str) -> String {
    let mut seen = String::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(chunk) = resp.chunk().await.unwrap() {
            seen.push_str(&String::from_utf8_lossy(&chunk));
            if seen.contains(needle) {
                return;
            }
        }
    })
    .await
    .expect("Timed out waiting for event");
    seen
}

#[tokio::test]
async fn test_dashboard_stream_pushes_updates() {
    let fixture = TestFixture::new().await;

    let mut resp = fixture
        .client
        .get(fixture.url("/api/admin/dashboard/stream"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let first = wait_for_event(&mut resp, "event: dashboard").await;
    assert!(first.contains("\"totalGuests\":0"));

    fixture.add_guest("John Doe").await;
    let update = wait_for_event(&mut resp, "john-doe").await;
    assert!(update.contains("\"totalGuests\":1"));
}

#[tokio::test]
async fn test_responses_stream_pushes_wishes() {
    let fixture = TestFixture::new().await;
    fixture.add_guest("John Doe").await;

    let mut resp = Client::new()
        .get(fixture.url("/api/invite/john-doe/responses/stream"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    wait_for_event(&mut resp, "event: responses").await;

    fixture.rsvp("john-doe", "John Doe", "yes").await;
    let update = wait_for_event(&mut resp, "Congrats!").await;
    assert!(update.contains("\"willAttend\":\"yes\""));
}

#[tokio::test]
async fn test_responses_stream_unknown_guest() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .get(fixture.url("/api/invite/nobody/responses/stream"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_guest_stream_requires_session() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .get(fixture.url("/api/admin/guests/stream"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
