//! Machine-readable error codes.
//!
//! Every error that can cross the method channel carries a stable code.
//! The code is what the host sees as the error tag of a failed call, so
//! it is part of the wire contract.
//!
//! # Example
//!
//! ```
//! use mapkit_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum TileError {
//!     Missing,
//!     Throttled,
//! }
//!
//! impl ErrorCode for TileError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Missing => "TILE_MISSING",
//!             Self::Throttled => "TILE_THROTTLED",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Throttled)
//!     }
//! }
//!
//! assert_eq!(TileError::Throttled.code(), "TILE_THROTTLED");
//! assert!(TileError::Throttled.is_recoverable());
//! ```

/// Stable error code interface.
///
/// # Code Format
///
/// - UPPER_SNAKE_CASE, e.g. `"MAP_LAYER_NOT_FOUND"`
/// - Prefixed with the owning layer (`MAP_`, `ENGINE_`)
/// - Never renamed once published
pub trait ErrorCode {
    /// Returns the machine-readable code.
    fn code(&self) -> &'static str;

    /// Returns whether retrying the same call may succeed.
    ///
    /// A malformed argument never becomes valid on retry; an engine that
    /// was not ready yet may be ready next time.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that an error code is non-empty, prefixed and UPPER_SNAKE_CASE.
///
/// # Panics
///
/// Panics with a descriptive message when any check fails.
///
/// ```
/// use mapkit_types::{assert_error_code, ErrorCode};
///
/// struct Gone;
///
/// impl ErrorCode for Gone {
///     fn code(&self) -> &'static str { "MAP_GONE" }
///     fn is_recoverable(&self) -> bool { false }
/// }
///
/// assert_error_code(&Gone, "MAP_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "Error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );
    assert!(
        is_upper_snake_case(code),
        "Error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Runs [`assert_error_code`] over every variant in `errors`.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }

    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
