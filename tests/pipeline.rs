//! End-to-end search, enrichment and pagination against a mock directory

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use usersearch_rs::{
    config::Settings, error::NetworkErrorKind, network::HttpClient, AccumulatedResult,
    Accumulator, EnrichedRecord, GitHubDirectory, Phase, RetryGuidance, SearchCriteria,
    SearchError, SearchOptions,
};
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings_for(server: &MockServer, per_page: u32) -> Settings {
    let mut settings = Settings::default();
    settings.directory.base_url = server.uri();
    settings.directory.token = Some("test-token".to_string());
    settings.outgoing.detail_timeout = 0.3;
    settings.search.per_page = per_page;
    settings
}

fn accumulator_for(server: &MockServer, per_page: u32) -> Accumulator {
    let settings = settings_for(server, per_page);
    let client = HttpClient::with_settings(&settings).unwrap();
    let directory =
        GitHubDirectory::new(client).with_detail_timeout(settings.outgoing.detail_timeout());
    Accumulator::new(Arc::new(directory), SearchOptions::from_settings(&settings))
}

fn hit(id: u64, login: &str) -> Value {
    json!({
        "login": login,
        "id": id,
        "avatar_url": format!("https://avatars.example.com/u/{}", id),
        "html_url": format!("https://github.com/{}", login),
        "type": "User",
        "score": 1.0
    })
}

fn profile(id: u64, login: &str, name: &str) -> Value {
    let mut body = hit(id, login);
    body["name"] = json!(name);
    body["location"] = json!("Berlin");
    body["public_repos"] = json!(12);
    body["followers"] = json!(40);
    body["following"] = json!(3);
    body["blog"] = json!("example.com");
    body
}

fn envelope(total: u64, items: Vec<Value>) -> Value {
    json!({
        "total_count": total,
        "incomplete_results": false,
        "items": items
    })
}

async fn mount_profile(server: &MockServer, id: u64, login: &str, name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/users/{}", login)))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile(id, login, name)))
        .mount(server)
        .await;
}

fn logins(result: &AccumulatedResult) -> Vec<&str> {
    result.items.iter().map(|r| r.login()).collect()
}

#[tokio::test]
async fn berlin_search_is_enriched_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/users"))
        .and(query_param("q", "location:\"Berlin\""))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "30"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            3,
            vec![hit(1, "anna"), hit(2, "bernd"), hit(3, "carla")],
        )))
        .expect(1)
        .mount(&server)
        .await;
    mount_profile(&server, 1, "anna", "Anna A").await;
    mount_profile(&server, 2, "bernd", "Bernd B").await;
    mount_profile(&server, 3, "carla", "Carla C").await;

    let acc = accumulator_for(&server, 30);
    let result = assert_ok!(acc.search(&SearchCriteria::new().location("Berlin")).await);

    assert_eq!(logins(&result), vec!["anna", "bernd", "carla"]);
    assert_eq!(result.total_count, 3);
    assert_eq!(result.current_page, 1);
    assert!(!result.has_more);

    let anna = &result.items[0];
    assert!(anna.is_enriched());
    assert_eq!(anna.display_name(), "Anna A");
    assert_eq!(anna.blog_url().as_deref(), Some("https://example.com"));
    assert_eq!(
        anna.repositories_url().as_deref(),
        Some("https://github.com/anna?tab=repositories")
    );
    assert!(acc.degraded().await.is_empty());
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn rate_limited_search_surfaces_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/users"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-limit", "10")
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", "4102444800")
                .set_body_json(json!({"message": "API rate limit exceeded for 127.0.0.1."})),
        )
        .mount(&server)
        .await;

    let acc = accumulator_for(&server, 30);
    let error = assert_err!(acc.search(&SearchCriteria::new().location("Berlin")).await);

    let SearchError::RateLimited(limit) = &error else {
        panic!("expected a rate limit error, got {:?}", error);
    };
    assert_eq!(limit.remaining, Some(0));
    assert_eq!(limit.limit, Some(10));
    assert!(matches!(error.retry_guidance(), RetryGuidance::RetryAfter(Some(_))));
    assert_eq!(acc.phase().await, Phase::Errored(error.clone()));
    assert!(acc.snapshot().await.is_empty());
}

#[tokio::test]
async fn detail_timeout_degrades_only_that_hit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            3,
            vec![hit(1, "anna"), hit(2, "bernd"), hit(3, "carla")],
        )))
        .mount(&server)
        .await;
    mount_profile(&server, 1, "anna", "Anna A").await;
    mount_profile(&server, 3, "carla", "Carla C").await;
    Mock::given(method("GET"))
        .and(path("/users/bernd"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(profile(2, "bernd", "Bernd B"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let acc = accumulator_for(&server, 30);
    let result = assert_ok!(acc.search(&SearchCriteria::new().location("Berlin")).await);

    assert_eq!(logins(&result), vec!["anna", "bernd", "carla"]);
    assert!(result.items[0].is_enriched());
    assert!(result.items[2].is_enriched());

    let bernd: EnrichedRecord = serde_json::from_value::<usersearch_rs::BasicRecord>(hit(2, "bernd"))
        .unwrap()
        .into();
    assert_eq!(result.items[1], bernd);
    assert_eq!(result.items[1].display_name(), "bernd");

    let degraded = acc.degraded().await;
    assert_eq!(degraded.len(), 1);
    assert_eq!(degraded[0].handle, "bernd");
    assert_eq!(
        degraded[0].cause,
        SearchError::NetworkUnavailable {
            kind: NetworkErrorKind::Timeout
        }
    );
    assert_eq!(acc.phase().await, Phase::Loaded);
}

#[tokio::test]
async fn load_more_appends_until_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/users"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(4, vec![hit(1, "anna"), hit(2, "bernd")])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/users"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(4, vec![hit(3, "carla"), hit(4, "dieter")])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/users/[^/]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile(0, "someone", "Someone")))
        .mount(&server)
        .await;

    let acc = accumulator_for(&server, 2);
    let first = assert_ok!(acc.search(&SearchCriteria::new().language("Rust").min_repos(5)).await);
    assert_eq!(first.len(), 2);
    assert!(first.has_more);

    let second = assert_ok!(acc.load_more().await);
    assert_eq!(logins(&second), vec!["anna", "bernd", "carla", "dieter"]);
    assert_eq!(second.current_page, 2);
    assert!(!second.has_more);
    // identity always comes from the search hit
    assert_eq!(second.items[3].basic.id, 4);

    let before = server.received_requests().await.unwrap().len();
    let third = assert_ok!(acc.load_more().await);
    assert_eq!(third, second);
    assert_eq!(server.received_requests().await.unwrap().len(), before);
}

#[tokio::test]
async fn empty_criteria_send_nothing() {
    let server = MockServer::start().await;

    let acc = accumulator_for(&server, 30);
    let error = assert_err!(acc.search(&SearchCriteria::new().username("  ")).await);

    assert_eq!(error, SearchError::EmptyCriteria);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_query_carries_sent_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/users"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Validation Failed",
            "errors": [{"code": "invalid"}]
        })))
        .mount(&server)
        .await;

    let acc = accumulator_for(&server, 30);
    let error = assert_err!(acc.search(&SearchCriteria::new().username("octo")).await);

    assert_eq!(
        error,
        SearchError::InvalidQuery {
            query: "octo".to_string(),
            message: Some("Validation Failed".to_string()),
        }
    );
    assert!(!error.is_retryable());
}
