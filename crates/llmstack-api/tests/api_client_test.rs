#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use llmstack_api::models::{CreateConnectionRequest, ResourceId};
use llmstack_api::{ApiClient, Error, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::new(&server.uri(), &TransportConfig::default(), None).unwrap();
    (server, client)
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_profile() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/profiles/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Ada Lovelace",
            "username": "ada",
            "organization": "Analytical Engines",
            "flags": { "IS_ORGANIZATION_OWNER": true }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let profile = client.get_profile().await.unwrap();
    assert_eq!(profile.username, "ada");
    assert_eq!(profile.organization.as_deref(), Some("Analytical Engines"));
    assert!(profile.flags.is_set("IS_ORGANIZATION_OWNER"));
}

#[tokio::test]
async fn test_token_auth_header() {
    let server = MockServer::start().await;
    let token: SecretString = "tok-123".to_string().into();
    let client = ApiClient::new(&server.uri(), &TransportConfig::default(), Some(token)).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/org"))
        .and(header("Authorization", "Token tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Acme",
            "disabled_api_backends": ["openai/dall_e"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let org = client.get_organization().await.unwrap();
    assert_eq!(org.disabled_api_backends, vec!["openai/dall_e".to_string()]);
}

#[tokio::test]
async fn test_list_follows_next_links() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/apps"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "next": null,
            "results": [{ "uuid": "00000000-0000-0000-0000-000000000002", "name": "Second" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    // The first page points at an internal host; only path + query are kept.
    Mock::given(method("GET"))
        .and(path("/api/apps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "next": "http://backend.internal:9000/api/apps?page=2",
            "results": [{ "uuid": "00000000-0000-0000-0000-000000000001", "name": "First" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let apps = client.list_apps().await.unwrap();
    let names: Vec<&str> = apps.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["First", "Second"]);
}

#[tokio::test]
async fn test_bare_array_lists() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/connections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "A" },
            { "id": "b-2", "name": "B", "status": "Active" }
        ])))
        .mount(&server)
        .await;

    let conns = client.list_connections().await.unwrap();
    assert_eq!(conns.len(), 2);
    assert_eq!(conns[0].id, ResourceId::Number(1));
    assert_eq!(conns[1].id, ResourceId::Text("b-2".into()));
}

#[tokio::test]
async fn test_store_search_params() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/store/search"))
        .and(query_param("query", "summarize"))
        .and(query_param("category", "writing"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "next": null,
            "results": [{ "slug": "summarizer", "name": "Summarizer" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client
        .search_store("summarize", Some("writing"), 1)
        .await
        .unwrap();
    assert_eq!(page.count, Some(1));
    assert_eq!(page.results[0].slug, "summarizer");
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_connection_sends_csrf_from_cookie() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/profiles/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "csrftoken=csrf-abc; Path=/")
                .set_body_json(json!({ "name": "Ada" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/connections"))
        .and(header("X-CSRFToken", "csrf-abc"))
        .and(body_json(json!({
            "name": "My OpenAI",
            "connection_type_slug": "api_key_authentication",
            "provider_slug": "openai",
            "base_connection_type": "credentials",
            "configuration": { "api_key": "sk-test" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 7,
            "name": "My OpenAI",
            "status": "Created"
        })))
        .expect(1)
        .mount(&server)
        .await;

    client.get_profile().await.unwrap();
    let created = client
        .create_connection(&CreateConnectionRequest {
            name: "My OpenAI".into(),
            description: String::new(),
            connection_type_slug: "api_key_authentication".into(),
            provider_slug: "openai".into(),
            base_connection_type: "credentials".into(),
            configuration: json!({ "api_key": "sk-test" }),
        })
        .await
        .unwrap();
    assert_eq!(created.id, ResourceId::Number(7));
}

#[tokio::test]
async fn test_delete_accepts_no_content() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/connections/7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_connection(&ResourceId::Number(7)).await.unwrap();
}

// ── Error normalization ─────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/profiles/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Authentication credentials were not provided."
        })))
        .mount(&server)
        .await;

    let err = client.get_profile().await.unwrap_err();
    match err {
        Error::Authentication { message } => {
            assert_eq!(message, "Authentication credentials were not provided.");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_carries_message() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/sheets"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "Sheet storage unavailable"
        })))
        .mount(&server)
        .await;

    let err = client
        .create_sheet(&llmstack_api::models::CreateSheetRequest {
            name: "Leads".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(
        err.to_string().contains("Sheet storage unavailable"),
        "unexpected message: {err}"
    );
}

#[tokio::test]
async fn test_not_found_without_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/store/apps/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.get_store_app("missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, Error::Api { ref message, .. } if message == "Not Found"));
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/profiles/me"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = client.get_profile().await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }), "got {err:?}");
}
