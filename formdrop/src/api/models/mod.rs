//! API request data models.
//!
//! - [`upload`]: the parsed multipart form submission
//! - [`add`]: query parameters for the sum page

pub mod add;
pub mod upload;
