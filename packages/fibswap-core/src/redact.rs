//! Secret redaction for logs and serialized output.
//!
//! The wallet signing key travels through configuration structs that get
//! logged at startup. Wrapping it in [`Redacted`] keeps it out of `Debug`,
//! `Display` and `Serialize` output.

use std::fmt::{self, Debug, Display};

/// Wrapper that prints and serializes as `"<redacted>"`.
///
/// # Example
///
/// ```
/// use fibswap_core::redact::Redacted;
///
/// let key = Redacted("0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80");
/// assert_eq!(format!("{:?}", key), "<redacted>");
/// assert_eq!(key.expose().len(), 66);
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Redacted<T>(pub T);

impl<T> Redacted<T> {
    /// Access the wrapped secret
    pub fn expose(&self) -> &T {
        &self.0
    }
}

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
