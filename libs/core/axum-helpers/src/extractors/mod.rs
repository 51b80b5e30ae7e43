//! Custom extractors for Axum handlers.
//!
//! Both extractors reject with [`crate::AppError`], so handlers get the
//! standard error body instead of axum's plain-text rejections.

pub mod authorization;
pub mod json_body;

pub use authorization::ForwardedAuthorization;
pub use json_body::JsonBody;
