use std::fmt;

/// Opaque bearer token for the Drive API.
///
/// Supplied per call by whoever invokes the tool; the gateway reads it, never
/// stores it beyond the call and never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Credential(token.into())
    }

    /// Accepts either a bare token or a full `Bearer <token>` header value.
    /// Blank input, or a scheme with no token, yields `None`.
    pub fn from_header_value(value: &str) -> Option<Self> {
        let value = value.trim_start();
        let token = match value.split_once(char::is_whitespace) {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
            None if value.trim_end().eq_ignore_ascii_case("bearer") => "",
            _ => value.trim(),
        };
        (!token.is_empty()).then(|| Credential(token.to_owned()))
    }

    pub(crate) fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}
