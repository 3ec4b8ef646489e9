//! HTTP request handlers.
//!
//! - [`upload`]: the multipart upload form and the handlers that store its `file` part
//! - [`add`]: renders the sum of two query parameters

pub mod add;
pub mod upload;
