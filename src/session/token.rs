//! Opaque resume token.

use std::{borrow::Borrow, fmt};

use bytes::Bytes;

/// Opaque byte sequence identifying a resumable session across transport
/// reconnections.
///
/// The token borrows as `[u8]`, so registries keyed by it can be queried with
/// the raw bytes from a resume handshake.
///
/// # Examples
///
/// ```
/// use reframe::session::ResumeToken;
/// let token = ResumeToken::from_static(b"\x01\xab");
/// assert_eq!(token.to_string(), "01ab");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ResumeToken(Bytes);

impl ResumeToken {
    /// Wrap the given bytes.
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>) -> Self { Self(bytes.into()) }

    /// Wrap a static byte string without copying.
    #[must_use]
    pub const fn from_static(bytes: &'static [u8]) -> Self { Self(Bytes::from_static(bytes)) }

    /// Borrow the raw token bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] { &self.0 }
}

impl Borrow<[u8]> for ResumeToken {
    fn borrow(&self) -> &[u8] { &self.0 }
}

impl From<Bytes> for ResumeToken {
    fn from(bytes: Bytes) -> Self { Self(bytes) }
}

impl fmt::Display for ResumeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ResumeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "ResumeToken({self})") }
}
