//! End-to-end tests: real server, mock GitHub upstream, scripted generator.
//!
//! Each test spawns the service on 127.0.0.1:0 with its fetch config pointed
//! at an in-process mock of the GitHub search API, then exercises the HTTP
//! surface exactly as a browser client would.

use std::sync::Arc;

use axum::extract::Query;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use relnotes_github::FetchConfig;
use relnotes_server::generate::GenerateError;
use relnotes_server::test_helpers::{spawn_test_server, ScriptedGenerator, TestServer};
use relnotes_server::NO_PULL_REQUESTS_BODY;

async fn spawn_mock_github(pages: Vec<Value>) -> String {
    let pages = Arc::new(pages);
    let app = Router::new().route(
        "/search/issues",
        get(move |Query(params): Query<std::collections::HashMap<String, String>>| {
            let pages = pages.clone();
            async move {
                let page: usize = params
                    .get("page")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(1);
                let body = pages
                    .get(page - 1)
                    .cloned()
                    .unwrap_or_else(|| json!({ "total_count": 0, "items": [] }));
                Json(body)
            }
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn pr_item(number: u64) -> Value {
    json!({
        "number": number,
        "title": format!("Change number {number}"),
        "body": format!("Details for {number}"),
        "html_url": format!("https://github.com/octocat/Hello-World/pull/{number}"),
        "user": { "login": "octocat" },
        "labels": [],
        "pull_request": { "merged_at": "2024-01-10T08:00:00Z" }
    })
}

async fn spawn_service(
    github_pages: Vec<Value>,
    generator: Arc<ScriptedGenerator>,
    anon_limit: u32,
) -> TestServer {
    let github_url = spawn_mock_github(github_pages).await;
    let fetch_config = FetchConfig {
        base_url: github_url,
        ..FetchConfig::default()
    };
    spawn_test_server(generator, fetch_config, anon_limit).await
}

fn changelog_request(repo: &str) -> Value {
    json!({
        "repository": repo,
        "dateMode": "range",
        "startDate": "2024-01-01",
        "endDate": "2024-01-31",
        "identifier": "fp-test"
    })
}

fn ok_chunks(parts: &[&str]) -> Vec<Result<String, GenerateError>> {
    parts.iter().map(|p| Ok(p.to_string())).collect()
}

#[tokio::test]
async fn zero_prs_returns_the_fixed_not_found_body() {
    let generator = Arc::new(ScriptedGenerator::new(ok_chunks(&["unused"])));
    let server = spawn_service(
        vec![json!({ "total_count": 0, "items": [] })],
        generator.clone(),
        10,
    )
    .await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/changelog", server.base_url))
        .json(&changelog_request("octocat/Hello-World"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), NO_PULL_REQUESTS_BODY);
    // generation never started
    assert!(generator.last_prompt().is_none());
}

#[tokio::test]
async fn streams_generated_chunks_in_order() {
    let generator = Arc::new(ScriptedGenerator::new(ok_chunks(&[
        "## Features\n",
        "- Change number 1 ",
        "([#1](https://github.com/octocat/Hello-World/pull/1)) by @octocat\n",
    ])));
    let pages = vec![json!({
        "total_count": 3,
        "items": [pr_item(1), pr_item(2), pr_item(3)]
    })];
    let server = spawn_service(pages, generator.clone(), 10).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/changelog", server.base_url))
        .json(&changelog_request("octocat/Hello-World"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert_eq!(
        body,
        "## Features\n- Change number 1 \
         ([#1](https://github.com/octocat/Hello-World/pull/1)) by @octocat\n"
    );

    // the assembled prompt saw all three PRs
    let prompt = generator.last_prompt().unwrap();
    for n in 1..=3 {
        assert!(prompt.contains(&format!("PR #{n}:")), "missing PR {n}");
    }
}

#[tokio::test]
async fn mid_stream_failure_appends_the_error_sentinel() {
    let generator = Arc::new(ScriptedGenerator::new(vec![
        Ok("partial changelog".to_string()),
        Err(GenerateError::Stream {
            message: "backend dropped the connection".into(),
        }),
    ]));
    let pages = vec![json!({ "total_count": 1, "items": [pr_item(1)] })];
    let server = spawn_service(pages, generator, 10).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/changelog", server.base_url))
        .json(&changelog_request("octocat/Hello-World"))
        .send()
        .await
        .unwrap();

    // headers were already committed, so still a 200; the failure lives in
    // the body as the trailing marker
    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.starts_with("partial changelog"));
    assert!(body.contains("\n\n---\n\n**Error:** "));
    assert!(body.ends_with("backend dropped the connection"));
}

#[tokio::test]
async fn invalid_repository_is_rejected_before_any_fetch() {
    let generator = Arc::new(ScriptedGenerator::new(ok_chunks(&["unused"])));
    let server = spawn_service(vec![], generator, 10).await;

    for bad in ["no-slash", "a/b/c", "owner/repo.git", "owner/bad name"] {
        let response = reqwest::Client::new()
            .post(format!("{}/api/changelog", server.base_url))
            .json(&changelog_request(bad))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "for {bad:?}");
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn anonymous_requests_require_an_identifier() {
    let generator = Arc::new(ScriptedGenerator::new(ok_chunks(&["unused"])));
    let server = spawn_service(vec![], generator, 10).await;

    let mut request = changelog_request("octocat/Hello-World");
    request.as_object_mut().unwrap().remove("identifier");

    let response = reqwest::Client::new()
        .post(format!("{}/api/changelog", server.base_url))
        .json(&request)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn bad_date_configuration_is_a_400() {
    let generator = Arc::new(ScriptedGenerator::new(ok_chunks(&["unused"])));
    let server = spawn_service(vec![], generator, 10).await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/changelog", server.base_url);

    // unknown mode
    let response = client
        .post(&url)
        .json(&json!({
            "repository": "octocat/Hello-World",
            "dateMode": "fortnight",
            "identifier": "fp"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // inverted range
    let response = client
        .post(&url)
        .json(&json!({
            "repository": "octocat/Hello-World",
            "dateMode": "range",
            "startDate": "2024-02-01",
            "endDate": "2024-01-01",
            "identifier": "fp"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // days mode without a count
    let response = client
        .post(&url)
        .json(&json!({
            "repository": "octocat/Hello-World",
            "dateMode": "days",
            "identifier": "fp"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn anonymous_quota_is_enforced_with_reset_guidance() {
    let generator = Arc::new(ScriptedGenerator::new(ok_chunks(&["ok"])));
    let pages = vec![json!({ "total_count": 1, "items": [pr_item(1)] })];
    let server = spawn_service(pages, generator, 2).await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/changelog", server.base_url);

    for _ in 0..2 {
        let response = client
            .post(&url)
            .json(&changelog_request("octocat/Hello-World"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let response = client
        .post(&url)
        .json(&changelog_request("octocat/Hello-World"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 429);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("2 changelogs per hour"));
    assert!(body["reset"].is_string());
}

#[tokio::test]
async fn authenticated_callers_bypass_the_anonymous_quota() {
    let generator = Arc::new(ScriptedGenerator::new(ok_chunks(&["ok"])));
    let pages = vec![json!({ "total_count": 1, "items": [pr_item(1)] })];
    let server = spawn_service(pages, generator, 1).await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/changelog", server.base_url);

    let mut request = changelog_request("octocat/Hello-World");
    request.as_object_mut().unwrap().remove("identifier");

    // several requests with a user token, all inside the higher user quota
    for _ in 0..3 {
        let response = client
            .post(&url)
            .bearer_auth("gho_user_token")
            .json(&request)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }
}

#[tokio::test]
async fn email_endpoint_streams_a_rewrite_of_the_changelog() {
    let generator = Arc::new(ScriptedGenerator::new(ok_chunks(&[
        "Hi all! ",
        "This month we shipped fast mode.",
    ])));
    let server = spawn_service(vec![], generator.clone(), 10).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/email", server.base_url))
        .json(&json!({
            "repository": "octocat/Hello-World",
            "changelog": "## Features\n- Fast mode ([#1](url)) by @octocat",
            "identifier": "fp-test"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.text().await.unwrap(),
        "Hi all! This month we shipped fast mode."
    );
    let prompt = generator.last_prompt().unwrap();
    assert!(prompt.contains("Fast mode"));
    assert!(prompt.contains("octocat/Hello-World"));
}

#[tokio::test]
async fn health_endpoint_is_open() {
    let generator = Arc::new(ScriptedGenerator::new(vec![]));
    let server = spawn_service(vec![], generator, 10).await;

    let response = reqwest::Client::new()
        .get(format!("{}/api/health", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}
