//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request data structures
//!
//! # Routes
//!
//! - `GET /upload`: upload form
//! - `POST /upload`, `POST /upload/{*dir}`: store the form's `file` part
//! - `GET /add`: sum of `a` and `b`
//!
//! All endpoints are documented with `utoipa`; the document is served at
//! `/api-docs/openapi.json`.

pub mod handlers;
pub mod models;
