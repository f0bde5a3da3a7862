//! Percent-encoding of the credential segment of MongoDB connection strings.
//!
//! Passwords are often pasted into configuration verbatim, and characters such as `:`
//! `/` or `#` make the driver reject the URI. [`sanitize_uri`] form-encodes the username
//! and password while leaving the scheme, hosts, path and options untouched.
//!
//! This is not a URI parser. The credential segment ends at the first `@` after the
//! scheme, so a raw password containing `@` followed by more text before the real `@`
//! is split in the wrong place; [`split_uri`] reports that case as
//! [`UriSplit::Ambiguous`].

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;

const SCHEME_SEPARATOR: &[u8] = b"://";

/// Bytes escaped by form encoding: everything but ASCII alphanumerics and `_ . - ~`.
const FORM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'_').remove(b'.').remove(b'-').remove(b'~');

/// Credential-bearing connection string split into its parts. All slices borrow from
/// the original string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UriParts<'a> {
    pub scheme: &'a str,
    pub username: &'a str,
    pub password: Option<&'a str>,
    /// Everything after the credential separator: hosts, path and options.
    pub host: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriSplit<'a> {
    /// No `://` in the string.
    NotAUri,
    /// No `@` after the scheme.
    NoCredentials,
    Credentials(UriParts<'a>),
    /// Split at the first `@`, but the host segment contains another `@`: the password
    /// most likely contained a raw `@`.
    Ambiguous(UriParts<'a>),
}

#[derive(Clone, Copy)]
enum Segment {
    Scheme,
    Auth,
    Host,
}

/// Locate scheme, credentials and host by scanning the string once.
pub fn split_uri(uri: &str) -> UriSplit<'_> {
    let bytes = uri.as_bytes();
    let mut segment = Segment::Scheme;
    let mut scheme_end = 0;
    let mut auth_end = 0;
    let mut colon = None;
    let mut extra_at = false;

    let mut pos = 0;
    while pos < bytes.len() {
        match segment {
            Segment::Scheme => {
                if bytes[pos..].starts_with(SCHEME_SEPARATOR) {
                    scheme_end = pos;
                    segment = Segment::Auth;
                    pos += SCHEME_SEPARATOR.len();
                    continue;
                }
            }
            Segment::Auth => match bytes[pos] {
                b':' if colon.is_none() => colon = Some(pos),
                b'@' => {
                    auth_end = pos;
                    segment = Segment::Host;
                }
                _ => {}
            },
            Segment::Host => {
                if bytes[pos] == b'@' {
                    extra_at = true;
                    break;
                }
            }
        }
        pos += 1;
    }

    // Every boundary sits on an ASCII byte, so slicing stays on char boundaries.
    let auth_start = scheme_end + SCHEME_SEPARATOR.len();
    match segment {
        Segment::Scheme => UriSplit::NotAUri,
        Segment::Auth => UriSplit::NoCredentials,
        Segment::Host => {
            let (username, password) = match colon {
                Some(colon) => (&uri[auth_start..colon], Some(&uri[colon + 1..auth_end])),
                None => (&uri[auth_start..auth_end], None),
            };
            let parts = UriParts { scheme: &uri[..scheme_end], username, password, host: &uri[auth_end + 1..] };
            if extra_at {
                UriSplit::Ambiguous(parts)
            } else {
                UriSplit::Credentials(parts)
            }
        }
    }
}

/// Treat the string as already encoded: it contains `%` and at most one `@`.
///
/// A raw password containing `%` is indistinguishable from an encoded one and is left
/// as is.
pub fn looks_encoded(uri: &str) -> bool {
    uri.contains('%') && uri.matches('@').count() <= 1
}

/// `application/x-www-form-urlencoded` encoding of a credential: space becomes `+`,
/// reserved delimiters and non-ASCII bytes become `%XX`.
pub fn form_encode(value: &str) -> String {
    // Spaces come out of the encoder as `%20`; a literal `%` is always `%25`, so every
    // `%20` in the output is an encoded space.
    utf8_percent_encode(value, FORM_ENCODE_SET).to_string().replace("%20", "+")
}

impl UriParts<'_> {
    pub fn encode(&self) -> String {
        let username = form_encode(self.username);
        match self.password {
            Some(password) => format!("{}://{}:{}@{}", self.scheme, username, form_encode(password), self.host),
            None => format!("{}://{}@{}", self.scheme, username, self.host),
        }
    }
}

/// Percent-encode the username and password of a MongoDB connection string.
///
/// Never fails: strings without a scheme or credentials, and strings that already look
/// encoded (see [`looks_encoded`]), are returned unchanged. Idempotent whenever the
/// first pass encoded at least one reserved character and the credentials contain no
/// raw `@`.
pub fn sanitize_uri(uri: &str) -> String {
    if looks_encoded(uri) {
        return uri.to_string();
    }

    match split_uri(uri) {
        UriSplit::NotAUri | UriSplit::NoCredentials => uri.to_string(),
        UriSplit::Credentials(parts) => parts.encode(),
        UriSplit::Ambiguous(parts) => {
            debug!("Connection string has more than one '@' after the credentials, splitting at the first one");
            parts.encode()
        }
    }
}
