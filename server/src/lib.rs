use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use posindex::{Corpus, DocId, InputDoc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_ms: u128,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub title: String,
    pub url: Option<String>,
    pub snippet: Option<String>,
}

#[derive(Serialize)]
pub struct BatchResponse {
    pub added: Vec<DocId>,
    pub num_docs: u32,
}

#[derive(Clone)]
pub struct AppState {
    pub corpus: Arc<Corpus>,
    pub admin_token: Option<String>,
}

type ApiError = (StatusCode, String);

pub fn build_app(corpus: Arc<Corpus>, admin_token: Option<String>) -> Router {
    let app_state = AppState { corpus, admin_token };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index/batch", post(index_batch))
        .route("/index/commit", post(index_commit))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let k = params.k.clamp(1, 100);
    let corpus = Arc::clone(&state.corpus);
    let q = params.q.clone();
    let (total_hits, hits) = blocking(move || corpus.search(&q, k)).await?;

    let raw_terms: Vec<&str> = params
        .q
        .split_whitespace()
        .map(|s| s.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|s| !s.is_empty())
        .collect();
    let results = hits
        .into_iter()
        .map(|hit| SearchHit {
            doc_id: hit.doc_id,
            snippet: snippet(&hit.meta.text, &raw_terms),
            title: hit.meta.title,
            url: hit.meta.url,
        })
        .collect();

    let elapsed = start.elapsed();
    tracing::debug!(query = %params.q, total_hits, "search");
    Ok(Json(SearchResponse { query: params.q, took_ms: elapsed.as_millis(), took_s: elapsed.as_secs_f64(), total_hits, results }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> (StatusCode, Json<serde_json::Value>) {
    match state.corpus.doc(doc_id) {
        Some(meta) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "doc_id": doc_id,
                "external_id": meta.external_id,
                "title": meta.title,
                "url": meta.url,
                "text": meta.text,
            })),
        ),
        None => (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" }))),
    }
}

async fn index_batch(State(state): State<AppState>, headers: HeaderMap, Json(docs): Json<Vec<InputDoc>>) -> Result<Json<BatchResponse>, ApiError> {
    authorize(&state, &headers)?;
    let corpus = Arc::clone(&state.corpus);
    let added = blocking(move || corpus.add_all(docs)).await?;
    tracing::info!(added = added.len(), "indexed batch");
    Ok(Json(BatchResponse { added, num_docs: state.corpus.num_docs() }))
}

/// The index lives in memory; every batch is visible as soon as it is acknowledged.
async fn index_commit(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    Ok(Json(serde_json::json!({ "num_docs": state.corpus.num_docs() })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}

/// Runs corpus work (CPU-bound, takes the corpus lock) off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> posindex::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(internal),
        Err(err) => {
            tracing::error!(error = %err, "corpus task failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "corpus task failed".into()))
        }
    }
}

fn internal(err: posindex::IndexError) -> ApiError {
    tracing::error!(error = %err, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

fn terms_regex(terms: &[&str]) -> Option<regex::Regex> {
    if terms.is_empty() { return None; }
    let alternation = terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    regex::RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Up to ~300 bytes around the first raw query word, with query words wrapped in `<em>`.
pub fn snippet(text: &str, raw_terms: &[&str]) -> Option<String> {
    if text.is_empty() { return None; }
    let re = terms_regex(raw_terms);
    let snippet = match re.as_ref().and_then(|re| re.find(text)) {
        Some(m) => {
            let start = floor_char_boundary(text, m.start().saturating_sub(100));
            let end = ceil_char_boundary(text, (m.start() + 200).min(text.len()));
            &text[start..end]
        }
        None => &text[..ceil_char_boundary(text, 200.min(text.len()))],
    };
    Some(match re {
        Some(re) => re.replace_all(snippet, "<em>$0</em>").into_owned(),
        None => snippet.to_string(),
    })
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    while !s.is_char_boundary(i) { i -= 1; }
    i
}

fn ceil_char_boundary(s: &str, mut i: usize) -> usize {
    while i < s.len() && !s.is_char_boundary(i) { i += 1; }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_highlights_whole_words() {
        let s = snippet("This Python is great", &["python", "is"]).unwrap();
        assert_eq!(s, "This <em>Python</em> <em>is</em> great");
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        let text = format!("{} rust {}", "é".repeat(120), "ü".repeat(200));
        let s = snippet(&text, &["rust"]).unwrap();
        assert!(s.contains("<em>rust</em>"));
        let plain = snippet(&"ß".repeat(150), &[]).unwrap();
        assert_eq!(plain.len(), 200);
    }

    #[test]
    fn empty_text_has_no_snippet() {
        assert!(snippet("", &["rust"]).is_none());
    }
}
