//! HTTP surface: `POST /api/generate-pdf` on an axum [`Router`].
//!
//! Every response, including 404/405/413 fallbacks, goes through the same
//! JSON error shape and, when configured, the same CORS decoration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::Error;
use crate::pipeline::{self, PipelineConfig};
use crate::request::TableRequest;

pub const GENERATE_PDF_PATH: &str = "/api/generate-pdf";

/// Default request body limit (2 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub const DEFAULT_DOWNLOAD_NAME: &str = "report.pdf";

const ALLOWED_METHODS: &str = "POST";

/// Immutable state shared by every request.
#[derive(Debug, Clone)]
pub struct AppState {
    pipeline: Arc<PipelineConfig>,
    cors: CorsPolicy,
    content_disposition: HeaderValue,
    max_body_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: PipelineConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            cors: CorsPolicy::disabled(),
            content_disposition: HeaderValue::from_static("attachment; filename=\"report.pdf\""),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_cors(mut self, cors: CorsPolicy) -> Self {
        self.cors = cors;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Set the attachment filename. Only `[A-Za-z0-9._-]` is accepted so the
    /// header never needs quoting rules.
    pub fn with_download_name(mut self, name: &str) -> crate::error::Result<Self> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(Error::Config(format!("invalid download name '{name}'")));
        }
        let value = format!("attachment; filename=\"{name}\"");
        self.content_disposition = HeaderValue::from_str(&value)
            .map_err(|e| Error::Config(format!("invalid download name '{name}': {e}")))?;
        Ok(self)
    }

    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }
}

/// Optional cross-origin policy, turned into a [`CorsLayer`] at the
/// router boundary.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    allow_origin: Option<HeaderValue>,
}

impl CorsPolicy {
    pub fn disabled() -> Self {
        Self { allow_origin: None }
    }

    /// Allow a single origin, or every origin with `*`.
    pub fn allow_origin(origin: &str) -> crate::error::Result<Self> {
        let value = HeaderValue::from_str(origin.trim())
            .map_err(|e| Error::Config(format!("invalid CORS origin '{origin}': {e}")))?;
        if value.is_empty() {
            return Err(Error::Config("CORS origin must not be empty".into()));
        }
        Ok(Self {
            allow_origin: Some(value),
        })
    }

    /// The layer decorating every response, or `None` when CORS is off.
    pub fn layer(&self) -> Option<CorsLayer> {
        let origin = self.allow_origin.as_ref()?;
        let allow_origin = if origin.as_bytes() == b"*" {
            AllowOrigin::any()
        } else {
            AllowOrigin::exact(origin.clone())
        };
        Some(
            CorsLayer::new()
                .allow_origin(allow_origin)
                .allow_methods([Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .expose_headers([header::CONTENT_DISPOSITION])
                .max_age(Duration::from_secs(86400)),
        )
    }
}

/// Error type for route handlers.
#[derive(Debug)]
pub enum ApiError {
    Pipeline(Error),
    PayloadTooLarge(String),
    NotFound,
    MethodNotAllowed,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Pipeline(err @ (Error::Validation(_) | Error::Parse(_))) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    kind: err.kind(),
                    error: err.to_string(),
                    details: None,
                },
            ),
            ApiError::Pipeline(err) => {
                log::error!("PDF generation failed: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        kind: err.kind(),
                        error: "Failed to generate PDF".to_string(),
                        details: Some(err.to_string()),
                    },
                )
            }
            ApiError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody {
                    error: msg,
                    kind: "PayloadTooLarge",
                    details: None,
                },
            ),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "Not found".to_string(),
                    kind: "NotFound",
                    details: None,
                },
            ),
            ApiError::MethodNotAllowed => {
                let mut response = (
                    StatusCode::METHOD_NOT_ALLOWED,
                    Json(ErrorBody {
                        error: format!("Method not allowed; use {ALLOWED_METHODS}"),
                        kind: "MethodNotAllowed",
                        details: None,
                    }),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
                return response;
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Pipeline(e)
    }
}

/// Build the application router with its middleware stack.
///
/// The CORS layer sits outside the fallbacks so 404/405/413 responses are
/// decorated too, and answers preflight `OPTIONS` requests itself.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route(
            GENERATE_PDF_PATH,
            post(generate_pdf).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.max_body_bytes));
    if let Some(cors) = state.cors.layer() {
        router = router.layer(cors);
    }
    router
        .layer(middleware::from_fn(request_log))
        .with_state(state)
}

async fn generate_pdf(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(format!(
                "Request body exceeds the limit of {} bytes",
                state.max_body_bytes
            ))
        } else {
            ApiError::Pipeline(Error::Validation(rejection.body_text()))
        }
    })?;

    let request = TableRequest::from_json(&body)?;

    let config = Arc::clone(&state.pipeline);
    let (pdf, layout) = tokio::task::spawn_blocking(move || {
        pipeline::generate_pdf(&request.html_table, &config)
    })
    .await
    .map_err(|e| Error::Render(format!("render task failed: {e}")))??;

    log::debug!(
        "Generated {} page(s), {} bytes",
        layout.pages.len(),
        pdf.len()
    );

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    headers.insert(header::CONTENT_DISPOSITION, state.content_disposition.clone());
    Ok((StatusCode::OK, headers, pdf).into_response())
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Logs every request with its status and latency.
async fn request_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    log::info!(
        "{method} {path} -> {} ({:.1} ms)",
        response.status().as_u16(),
        started.elapsed().as_secs_f64() * 1000.0
    );
    response
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_name_is_restricted() {
        let state = AppState::new(PipelineConfig::default());
        assert!(state.clone().with_download_name("assets-2024.pdf").is_ok());
        assert!(state.clone().with_download_name("a\"b.pdf").is_err());
        assert!(state.with_download_name("").is_err());
    }

    #[test]
    fn cors_layer_only_when_configured() {
        assert!(CorsPolicy::disabled().layer().is_none());
        assert!(CorsPolicy::allow_origin("*").unwrap().layer().is_some());
        assert!(CorsPolicy::allow_origin("https://assets.example.com")
            .unwrap()
            .layer()
            .is_some());
    }

    #[test]
    fn cors_origin_must_be_a_header_value() {
        assert_eq!(CorsPolicy::allow_origin("  ").unwrap_err().kind(), "ConfigError");
        assert!(CorsPolicy::allow_origin("bad\norigin").is_err());
    }

    #[test]
    fn render_errors_map_to_500() {
        let response = ApiError::from(Error::Render("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = ApiError::from(Error::Parse("no table".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
