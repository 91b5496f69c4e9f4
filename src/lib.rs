//! # tablepdf – HTML table → PDF service
//!
//! This crate turns an HTML table fragment into a paginated PDF document and
//! serves the conversion over HTTP. The pipeline stages are:
//!
//! 1. **Validate** – JSON request body → [`TableRequest`] ([`request`])
//! 2. **Parse** – HTML string → DOM tree ([`dom`])
//! 3. **Extract** – DOM → rows of styled cells ([`grid`])
//! 4. **Measure** – equal-width columns and wrapped text ([`layout`])
//! 5. **Paginate** – rows placed onto A4 pages ([`pagination`])
//! 6. **Render** – emit PDF bytes via printpdf ([`render`])
//!
//! The axum router lives in [`http`]; the binary's flags in [`config`].

pub mod config;
pub mod dom;
pub mod error;
pub mod fonts;
pub mod grid;
pub mod http;
pub mod layout;
pub mod layout_config;
pub mod pagination;
pub mod pipeline;
pub mod render;
pub mod request;

// Re-exports for convenience
pub use error::{Error, Result};
pub use http::{build_router, AppState, CorsPolicy};
pub use pipeline::{generate_pdf, generate_pdf_from_html, PageOrientation, PipelineConfig};
pub use request::TableRequest;
