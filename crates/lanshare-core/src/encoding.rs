//! Byte-level escaping for file names.
//!
//! File names are arbitrary bytes on Unix. Everything here works on the raw
//! bytes so that names which are not valid UTF-8 survive the trip through an
//! HTML page and back in a query string unchanged.

use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;
use percent_encoding::percent_decode;
use percent_encoding::percent_encode;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::ffi::OsString;

/// Characters left as-is in link targets: unreserved characters and `/`.
const LINK_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Returns the raw bytes of an OS string.
#[cfg(unix)]
#[must_use]
pub fn os_str_bytes(name: &OsStr) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(name.as_bytes())
}

#[cfg(not(unix))]
#[must_use]
pub fn os_str_bytes(name: &OsStr) -> Cow<'_, [u8]> {
    match name.to_string_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}

/// Builds an OS string from raw bytes.
#[cfg(unix)]
#[must_use]
pub fn os_string_from_bytes(bytes: Vec<u8>) -> OsString {
    use std::os::unix::ffi::OsStringExt;
    OsString::from_vec(bytes)
}

#[cfg(not(unix))]
#[must_use]
pub fn os_string_from_bytes(bytes: Vec<u8>) -> OsString {
    OsString::from(String::from_utf8_lossy(&bytes).into_owned())
}

/// Escapes `&`, `<` and `>` for use as HTML text.
///
/// Every other byte, including bytes that are not valid UTF-8, is copied
/// unchanged.
///
/// # Examples
///
/// ```
/// use lanshare_core::encoding::escape_html;
///
/// assert_eq!(escape_html(b"a<b>&c"), b"a&lt;b&gt;&amp;c".to_vec());
/// ```
#[must_use]
pub fn escape_html(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    for &byte in raw {
        match byte {
            b'&' => out.extend_from_slice(b"&amp;"),
            b'<' => out.extend_from_slice(b"&lt;"),
            b'>' => out.extend_from_slice(b"&gt;"),
            _ => out.push(byte),
        }
    }
    out
}

/// Percent-encodes raw bytes as a relative link target.
///
/// The result is plain ASCII and safe inside a double-quoted attribute.
///
/// # Examples
///
/// ```
/// use lanshare_core::encoding::encode_link;
///
/// assert_eq!(encode_link(b"my file.txt"), "my%20file.txt");
/// assert_eq!(encode_link(b"docs/"), "docs/");
/// assert_eq!(encode_link(&[0xff, b'a']), "%FFa");
/// ```
#[must_use]
pub fn encode_link(raw: &[u8]) -> String {
    percent_encode(raw, LINK_SET).to_string()
}

/// Decodes `%XX` escapes into raw bytes. Malformed escapes are kept literally.
#[must_use]
pub fn decode_percent(encoded: &[u8]) -> Vec<u8> {
    percent_decode(encoded).collect()
}

/// Decodes one `application/x-www-form-urlencoded` component.
#[must_use]
pub fn decode_form(component: &str) -> Vec<u8> {
    let plus_decoded: Vec<u8> = component
        .bytes()
        .map(|b| if b == b'+' { b' ' } else { b })
        .collect();
    decode_percent(&plus_decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_keeps_quotes() {
        assert_eq!(escape_html(b"\"it's\""), b"\"it's\"".to_vec());
    }

    #[test]
    fn test_escape_html_non_utf8() {
        assert_eq!(escape_html(&[0xc3, 0x28, b'<']), vec![0xc3, 0x28, b'&', b'l', b't', b';']);
    }

    #[test]
    fn test_encode_link_reserved() {
        assert_eq!(encode_link(b"a&b=c?d#e"), "a%26b%3Dc%3Fd%23e");
        assert_eq!(encode_link(b"100%"), "100%25");
        assert_eq!(encode_link(b"\"quoted\""), "%22quoted%22");
    }

    #[test]
    fn test_encode_link_utf8() {
        assert_eq!(encode_link("é".as_bytes()), "%C3%A9");
    }

    #[test]
    fn test_decode_form() {
        assert_eq!(decode_form("a+b%20c"), b"a b c".to_vec());
        assert_eq!(decode_form("%zz"), b"%zz".to_vec());
        assert_eq!(decode_form("%FF"), vec![0xff]);
    }

    #[test]
    fn test_link_round_trip() {
        let raw = [b'x', 0x80, b' ', b'%', b'/'];
        assert_eq!(decode_percent(encode_link(&raw).as_bytes()), raw.to_vec());
    }

    #[cfg(unix)]
    #[test]
    fn test_os_bytes_round_trip() {
        let raw = vec![b'n', 0xfe, b'm'];
        let os = os_string_from_bytes(raw.clone());
        assert_eq!(os_str_bytes(&os).as_ref(), raw.as_slice());
    }
}
