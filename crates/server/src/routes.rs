//! HTTP routes.
//!
//! Extraction failures are reported in the response body with
//! `success: false`; the status code stays 200.

use anyhow::anyhow;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sitemark_core::{ExtractionResult, LinkListing, LinksResponse, ParseResponse, fetch_url};
use tracing::{error, info};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    url: String,
    #[serde(default)]
    config_name: Option<String>,
    /// Page HTML; when present the page is not fetched
    #[serde(default)]
    html: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractLinksRequest {
    url: String,
    #[serde(default)]
    html: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    message: &'static str,
    version: &'static str,
    rules: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/parse", post(parse_page))
        .route("/extract-links", post(extract_links))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Sitemark API is running",
        version: env!("CARGO_PKG_VERSION"),
        rules: state.rules.len(),
    })
}

async fn parse_page(State(state): State<AppState>, Json(request): Json<ParseRequest>) -> Json<ParseResponse> {
    let url = request.url.clone();
    info!(url = %url, config = ?request.config_name, "parse request");

    let response = match run_parse(state, request).await {
        Ok(result) => {
            info!(url = %url, rule = %result.rule, links = result.links.len(), "parsed page");
            ParseResponse::from(result)
        }
        Err(e) => {
            error!(url = %url, error = %format!("{:#}", e), "parse failed");
            ParseResponse::failure(url, format!("{:#}", e))
        }
    };

    Json(response)
}

async fn extract_links(State(state): State<AppState>, Json(request): Json<ExtractLinksRequest>) -> Json<LinksResponse> {
    let url = request.url.clone();
    info!(url = %url, "extract links request");

    let response = match run_extract_links(state, request).await {
        Ok(listing) => {
            info!(url = %url, links = listing.links.len(), "extracted links");
            LinksResponse::from(listing)
        }
        Err(e) => {
            error!(url = %url, error = %format!("{:#}", e), "link extraction failed");
            LinksResponse::failure(url, format!("{:#}", e))
        }
    };

    Json(response)
}

async fn run_parse(state: AppState, request: ParseRequest) -> anyhow::Result<ExtractionResult> {
    let html = page_html(&state, &request.url, request.html).await?;

    tokio::task::spawn_blocking(move || {
        state.extractor().parse_page(&html, &request.url, request.config_name.as_deref())
    })
    .await
    .map_err(|e| anyhow!("extraction task failed: {}", e))?
    .map_err(Into::into)
}

async fn run_extract_links(state: AppState, request: ExtractLinksRequest) -> anyhow::Result<LinkListing> {
    let html = page_html(&state, &request.url, request.html).await?;

    tokio::task::spawn_blocking(move || state.extractor().list_links(&html, &request.url))
        .await
        .map_err(|e| anyhow!("link extraction task failed: {}", e))?
        .map_err(Into::into)
}

async fn page_html(state: &AppState, url: &str, html: Option<String>) -> anyhow::Result<String> {
    match html {
        Some(html) => Ok(html),
        None => Ok(fetch_url(url, &state.fetch).await?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use sitemark_core::{ExtractConfig, FetchConfig, Rule, RuleIndex};
    use tower::ServiceExt;

    const ARTICLE: &str = r#"
        <html>
        <head><title>Notes | Example</title></head>
        <body>
            <nav><a href="/">Home</a></nav>
            <h1 class="headline">Notes</h1>
            <div class="entry"><p>See <a href="/docs">the docs</a>.</p><div class="ad">Buy</div></div>
        </body>
        </html>
    "#;

    fn app() -> Router {
        let rules = RuleIndex::builder()
            .with_builtin_default()
            .rule(
                Rule::new("notes")
                    .with_title("h1.headline")
                    .with_content("div.entry")
                    .with_exclude(".ad")
                    .with_domain("notes.example.com"),
            )
            .build()
            .unwrap();

        router(AppState::new(rules, FetchConfig::default(), ExtractConfig::default()))
    }

    async fn post_json(path: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn test_health_check() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["rules"], 2);
    }

    #[tokio::test]
    async fn test_parse_with_supplied_html() {
        let (status, json) =
            post_json("/parse", serde_json::json!({ "url": "https://notes.example.com/1", "html": ARTICLE })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["title"], "Notes");
        assert_eq!(json["content"], "See [the docs](https://notes.example.com/docs).");
        assert_eq!(json["url"], "https://notes.example.com/1");
        assert_eq!(json["links"][0]["url"], "https://notes.example.com/");
        assert_eq!(json["links"][1]["title"], "the docs");
        assert!(json["error"].is_null());
    }

    #[tokio::test]
    async fn test_parse_with_config_name() {
        let (_, json) = post_json(
            "/parse",
            serde_json::json!({ "url": "https://other.example.org/", "html": ARTICLE, "config_name": "notes" }),
        )
        .await;

        assert_eq!(json["success"], true);
        assert_eq!(json["title"], "Notes");
    }

    #[tokio::test]
    async fn test_parse_empty_page_is_reported_in_body() {
        let (status, json) =
            post_json("/parse", serde_json::json!({ "url": "https://notes.example.com/1", "html": "  " })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], false);
        assert_eq!(json["content"], "");
        assert_eq!(json["links"], serde_json::json!([]));
        assert!(json["error"].as_str().is_some_and(|e| e.contains("empty")));
    }

    #[tokio::test]
    async fn test_parse_malformed_url_is_reported_in_body() {
        let (status, json) = post_json("/parse", serde_json::json!({ "url": "not a url" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], false);
        assert_eq!(json["url"], "not a url");
        assert!(json["error"].as_str().is_some_and(|e| e.contains("Invalid URL")));
    }

    #[tokio::test]
    async fn test_parse_missing_url_is_rejected() {
        let (status, _) = post_json("/parse", serde_json::json!({ "config_name": "notes" })).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_extract_links() {
        let (status, json) =
            post_json("/extract-links", serde_json::json!({ "url": "https://notes.example.com/1", "html": ARTICLE }))
                .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["title"], "Notes | Example");
        assert_eq!(json["links"].as_array().map(Vec::len), Some(2));
        assert!(json["error"].is_null());
    }

    #[tokio::test]
    async fn test_extract_links_failure() {
        let (status, json) = post_json("/extract-links", serde_json::json!({ "url": "ftp://example.com/" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], false);
        assert_eq!(json["links"], serde_json::json!([]));
    }
}
