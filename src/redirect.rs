//! Best-effort decoding of aggregator redirect links.
//!
//! Search feeds wrap publisher links in an opaque redirect
//! (`news.google.com/rss/articles/<token>`). The token is a base64url blob
//! that, for older links, embeds the publisher URL in plain bytes. Decoding
//! is strictly best-effort: on any failure the input comes back unchanged,
//! and no error ever crosses this boundary.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use tracing::debug;
use url::Url;

/// Resolve a redirect link to the publisher URL it points at.
///
/// Never fails; returns the input unchanged when the link is not a known
/// redirect shape or the embedded URL cannot be recovered.
pub fn resolve_redirect(link: &str) -> String {
    let parsed = match Url::parse(link) {
        Ok(u) => u,
        Err(_) => return link.to_string(),
    };

    // Some redirects carry the target verbatim in a query parameter.
    if let Some((_, target)) = parsed.query_pairs().find(|(k, _)| k == "url") {
        if target.starts_with("http") {
            return target.into_owned();
        }
    }

    if parsed
        .host_str()
        .map(|h| h.ends_with("news.google.com"))
        .unwrap_or(false)
    {
        if let Some(token) = article_token(&parsed) {
            if let Some(decoded) = decode_article_token(token) {
                debug!("decoded redirect {} -> {}", link, decoded);
                return decoded;
            }
        }
    }

    link.to_string()
}

/// Pull the opaque token out of an `/articles/<token>` or
/// `/rss/articles/<token>` path.
fn article_token(url: &Url) -> Option<&str> {
    let mut segments = url.path_segments()?;
    loop {
        match segments.next() {
            Some("articles") => return segments.next().filter(|s| !s.is_empty()),
            Some(_) => continue,
            None => return None,
        }
    }
}

/// Base64url-decode the token and scan the raw bytes for an embedded
/// `http(s)://` URL. Newer token formats do not embed the URL at all; those
/// simply fail the scan and the caller keeps the redirect link.
fn decode_article_token(token: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(token.trim_end_matches('=')).ok()?;

    let start = bytes.windows(4).position(|w| w == b"http")?;
    let mut url_bytes = Vec::new();
    for &b in &bytes[start..] {
        if is_url_byte(b) {
            url_bytes.push(b);
        } else {
            break;
        }
    }

    let candidate = String::from_utf8(url_bytes).ok()?;
    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        Some(candidate)
    } else {
        None
    }
}

fn is_url_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b':' | b'/' | b'.' | b'?' | b'&' | b'=' | b'%' | b'-' | b'_' | b'~' | b'#' | b'+'
                | b',' | b';' | b'@' | b'!' | b'$' | b'(' | b')' | b'*' | b'\''
        )
}
