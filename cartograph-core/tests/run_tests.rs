// End-to-end survey tests against a mock application

use cartograph_core::execute_survey;
use cartograph_engine::artifact::NullSink;
use cartograph_engine::config::SurveyConfig;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PAGE: &str = r#"<html><body>
<form action="/login" method="post">
  <input type="hidden" name="csrf" value="tok-1">
  <input type="email" name="email" placeholder="Email">
  <input type="password" name="password">
  <button type="submit">Sign in</button>
</form>
</body></html>"#;

const HOME_PAGE: &str = r#"<html><head><title>Home</title></head><body>
<nav>
  <a href="/about">About</a>
  <a href="https://elsewhere.example.net/out">External</a>
</nav>
<button class="cta">Get started</button>
</body></html>"#;

const ABOUT_PAGE: &str = r#"<html><head><title>About</title></head><body>
<p>About us.</p>
</body></html>"#;

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

async fn mount_app(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(html(LOGIN_PAGE))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(303)
                .insert_header("location", "/home")
                .insert_header("set-cookie", "sid=abc; Path=/"),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/home"))
        .respond_with(html(HOME_PAGE))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(ABOUT_PAGE))
        .mount(server)
        .await;
}

fn fast_config(server: &MockServer) -> SurveyConfig {
    let base = Url::parse(&server.uri()).unwrap();
    let mut config = SurveyConfig::new(base)
        .with_navigation_timeout(Duration::from_secs(5))
        .with_visit_delay(Duration::ZERO);
    config.retry_delay = Duration::ZERO;
    config.settle_delay = Duration::ZERO;
    config
}

// ============================================================================
// Full Run Tests
// ============================================================================

#[tokio::test]
async fn test_authenticated_run_visits_seeds_and_discovered_pages() {
    let server = MockServer::start().await;
    mount_app(&server).await;

    let config = fast_config(&server)
        .with_credentials("user@example.com".to_string(), "hunter2".to_string())
        .with_seed_routes(vec!["/home".to_string()]);

    let outcome = execute_survey(config, &NullSink, None).await;

    assert!(!outcome.is_fatal());
    assert!(outcome.result.session.authenticated);
    assert_eq!(outcome.result.session.attempts, 1);

    let names: Vec<&str> = outcome.result.pages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["home", "about"], "seed first, then discovery");

    // The external link never enters the run-wide navigation set.
    assert_eq!(outcome.result.navigation.len(), 1);
    assert!(outcome.result.navigation[0].href.ends_with("/about"));
}

#[tokio::test]
async fn test_login_submission_is_captured_as_exchange() {
    let server = MockServer::start().await;
    mount_app(&server).await;

    let config = fast_config(&server)
        .with_credentials("user@example.com".to_string(), "hunter2".to_string())
        .with_seed_routes(vec!["/home".to_string()]);

    let outcome = execute_survey(config, &NullSink, None).await;

    let login_post = outcome
        .result
        .exchanges
        .iter()
        .find(|e| e.method == "POST" && e.url.ends_with("/login"))
        .expect("login POST captured");
    let body = login_post.body.as_deref().unwrap_or("");
    assert!(body.contains("email=user%40example.com"));
    assert!(body.contains("csrf=tok-1"), "hidden field forwarded");

    assert!(outcome
        .summary
        .unique_endpoints
        .contains(&"POST /login".to_string()));
}

#[tokio::test]
async fn test_failed_login_degrades_to_public_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(html(LOGIN_PAGE))
        .mount(&server)
        .await;
    // Rejection: the form posts back to the login page.
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(html(LOGIN_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(ABOUT_PAGE))
        .mount(&server)
        .await;

    let mut config = fast_config(&server)
        .with_credentials("user@example.com".to_string(), "wrong".to_string())
        .with_seed_routes(vec!["/about".to_string()])
        .with_max_login_attempts(2);
    config.retry_delay = Duration::ZERO;

    let outcome = execute_survey(config, &NullSink, None).await;

    assert!(!outcome.is_fatal());
    assert!(!outcome.result.session.authenticated);
    assert_eq!(outcome.result.session.attempts, 2);
    assert!(outcome.result.session.error.is_some());
    assert_eq!(outcome.result.pages.len(), 1, "public crawl still runs");
    assert!(!outcome.summary.auth_success);
}

#[tokio::test]
async fn test_unauthenticated_run_still_crawls() {
    let server = MockServer::start().await;
    mount_app(&server).await;

    let config = fast_config(&server).with_seed_routes(vec!["/about".to_string()]);

    let outcome = execute_survey(config, &NullSink, None).await;

    assert!(!outcome.is_fatal());
    assert_eq!(outcome.result.session.attempts, 0);
    assert_eq!(outcome.result.pages.len(), 1);
}

// ============================================================================
// Frontier Behavior Tests
// ============================================================================

#[tokio::test]
async fn test_discovery_cap_bounds_the_run() {
    let server = MockServer::start().await;
    let hub = r#"<html><body>
      <a href="/p1">1</a><a href="/p2">2</a><a href="/p3">3</a>
      <a href="/p4">4</a><a href="/p5">5</a>
    </body></html>"#;
    Mock::given(method("GET"))
        .and(path("/hub"))
        .respond_with(html(hub))
        .mount(&server)
        .await;
    for p in ["/p1", "/p2", "/p3", "/p4", "/p5"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(html("<html><body>leaf</body></html>"))
            .mount(&server)
            .await;
    }

    let config = fast_config(&server)
        .with_seed_routes(vec!["/hub".to_string()])
        .with_discovery_cap(2);

    let outcome = execute_survey(config, &NullSink, None).await;

    assert_eq!(outcome.result.pages.len(), 3, "one seed plus two discovered");
}

#[tokio::test]
async fn test_each_url_visited_once() {
    let server = MockServer::start().await;
    mount_app(&server).await;

    // Duplicate seeds and query variants collapse onto one visit.
    let config = fast_config(&server).with_seed_routes(vec![
        "/about".to_string(),
        "/about".to_string(),
        "/about?tab=1".to_string(),
    ]);

    let outcome = execute_survey(config, &NullSink, None).await;

    assert_eq!(outcome.result.pages.len(), 1);
    assert_eq!(outcome.summary.total_pages, 1);
}

// ============================================================================
// Progress Callback Tests
// ============================================================================

#[tokio::test]
async fn test_progress_callback_receives_updates() {
    let server = MockServer::start().await;
    mount_app(&server).await;

    let config = fast_config(&server).with_seed_routes(vec!["/about".to_string()]);

    let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::<String>::new()));
    let seen_clone = seen.clone();
    let callback: cartograph_core::SurveyProgressCallback =
        std::sync::Arc::new(move |msg| seen_clone.lock().unwrap().push(msg));

    execute_survey(config, &NullSink, Some(callback)).await;

    let messages = seen.lock().unwrap();
    assert!(messages.iter().any(|m| m.contains("about")));
}
