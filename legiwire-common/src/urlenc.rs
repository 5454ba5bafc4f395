//! URL percent-encoding with the fixed reserved set
//!
//! Source URLs are stored percent-encoded. The reserved set covers the
//! characters legislature sites commonly leave raw in hrefs: ASCII controls,
//! space, `"`, `<`, `>`, backtick, `{`, `}`, `|`, `\`, `^`, and all
//! non-ASCII. `%` is not in the set, so already-encoded `%xx` triplets pass
//! through unchanged (no double-encoding).

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// The fixed reserved set applied to every stored URL
const URL_RESERVED: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^');

/// Percent-encode a URL with the fixed reserved set
pub fn encode_url(url: &str) -> String {
    utf8_percent_encode(url, URL_RESERVED).to_string()
}
