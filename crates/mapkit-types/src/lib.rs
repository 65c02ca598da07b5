//! Shared types for mapkit.
//!
//! This crate holds what both sides of the method channel agree on:
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`MethodCall`] | Named command plus argument bag |
//! | [`CallError`] | Structured failure (code, message, details) |
//! | [`ErrorCode`] | Stable error codes for every error enum |
//! | [`MarkerSpec`], [`GeoPoint`] | Marker payloads |
//! | [`CameraPosition`] | Initial camera placement |

mod call;
mod camera;
mod error;
mod marker;

pub use call::{CallError, CallResult, MethodCall};
pub use camera::CameraPosition;
pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use marker::{GeoPoint, MarkerSpec};
