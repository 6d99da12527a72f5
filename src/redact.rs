//! Redaction of signing keys in logs and debug output
//!
//! [`Redacted`] formats and serializes as `"<redacted>"` whatever it wraps.

use std::fmt::{self, Debug, Display};

/// Wrapper that hides its inner value when formatted or serialized
///
/// ```ignore
/// tracing::info!(key = %Redacted(&private_key), "Connecting signer");
/// // Logs: key = <redacted>
/// ```
#[derive(Clone, Copy)]
pub struct Redacted<T>(pub T);

impl<T> Debug for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl<T> Display for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl<T> serde::Serialize for Redacted<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        "<redacted>".serialize(serializer)
    }
}
