use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use std::borrow::Cow;

// Built once on first use
static TEXT_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">"])
        .expect("Failed to build XML text escaper")
});

/// Escape a string for use as XML character data.
///
/// Only `&`, `<` and `>` are replaced; quotes are legal in element content and
/// are left alone to keep rewritten text close to what Office itself writes.
///
/// # Examples
///
/// ```
/// use docstamp::common::xml::escape_text;
/// assert_eq!(escape_text("Smith & Sons <Ltd>"), "Smith &amp; Sons &lt;Ltd&gt;");
/// assert_eq!(escape_text("\"quoted\""), "\"quoted\"");
/// ```
#[inline]
pub fn escape_text(s: &str) -> Cow<'_, str> {
    if TEXT_ESCAPER.find(s).is_none() {
        return Cow::Borrowed(s);
    }
    Cow::Owned(TEXT_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;"]))
}

/// Decode raw XML character data into text.
///
/// Resolves the predefined entities as well as numeric character references
/// (`&#10;`, `&#xA0;`).
///
/// # Examples
///
/// ```
/// use docstamp::common::xml::unescape_text;
/// assert_eq!(unescape_text(b"a &amp; b").unwrap(), "a & b");
/// assert_eq!(unescape_text(b"&#x41;&#66;").unwrap(), "AB");
/// ```
pub fn unescape_text(raw: &[u8]) -> Result<Cow<'_, str>, String> {
    let s = std::str::from_utf8(raw).map_err(|e| e.to_string())?;
    quick_xml::escape::unescape(s).map_err(|e| e.to_string())
}

/// Whether Word/Excel would trim `text` unless the element carries
/// `xml:space="preserve"`.
#[inline]
pub fn needs_space_preserve(text: &str) -> bool {
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
}
