//! Charset declaration rewriting for HTML documents.
//!
//! Finds `<meta>` tags with a minimal attribute scanner instead of a full
//! HTML parser, then canonicalizes the document's charset declaration to
//! `<meta charset="UTF-8">`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// Canonical charset tag, including the line break and indent it is placed with.
pub const CANONICAL_META_LINE: &str = "\n  <meta charset=\"UTF-8\">";

/// Which rewrite was applied to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaStrategy {
    ReplacedMetaCharset,
    ReplacedHttpEquiv,
    InsertedAfterHead,
    NoHead,
}

impl std::fmt::Display for MetaStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetaStrategy::ReplacedMetaCharset => write!(f, "replaced meta charset"),
            MetaStrategy::ReplacedHttpEquiv => write!(f, "replaced http-equiv content-type"),
            MetaStrategy::InsertedAfterHead => write!(f, "inserted after <head>"),
            MetaStrategy::NoHead => write!(f, "no <head>, left unchanged"),
        }
    }
}

/// Result of normalizing a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaOutcome {
    pub html: String,
    pub strategy: MetaStrategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharsetDecl {
    MetaCharset,
    HttpEquiv,
}

// Attribute: name, optionally followed by a quoted or bare value.
const ATTR: &str = r#"[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+))?"#;

// Compiled regex patterns (lazy initialized for performance)
static META_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\s*<meta((?:\s+{ATTR})*)\s*(?:/\s*)?>")).unwrap()
});

static ATTR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#).unwrap()
});

static HEAD_OPEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<head(?:\s[^>]*)?>").unwrap()
});

/// Convert `\r\n` and lone `\r` line endings to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Rewrite the document so it declares `<meta charset="UTF-8">` exactly once.
///
/// Line endings are normalized first. Then the first applicable rule wins:
/// an existing `<meta charset>` is replaced, else an http-equiv content-type
/// declaration is replaced, else the tag is inserted right after `<head>`.
/// Documents without `<head>` are returned unchanged apart from line endings.
pub fn normalize_charset_meta(html: &str) -> MetaOutcome {
    let text = normalize_line_endings(html);
    let decls = find_charset_decls(&text);

    let target = decls
        .iter()
        .position(|(_, kind)| *kind == CharsetDecl::MetaCharset)
        .map(|i| (i, MetaStrategy::ReplacedMetaCharset))
        .or_else(|| {
            decls
                .iter()
                .position(|(_, kind)| *kind == CharsetDecl::HttpEquiv)
                .map(|i| (i, MetaStrategy::ReplacedHttpEquiv))
        });

    if let Some((keep, strategy)) = target {
        // The kept slot gets the canonical tag; every other declaration is dropped.
        let mut result = String::with_capacity(text.len());
        let mut last_end = 0;
        for (i, (range, _)) in decls.iter().enumerate() {
            result.push_str(&text[last_end..range.start]);
            if i == keep {
                result.push_str(CANONICAL_META_LINE);
            }
            last_end = range.end;
        }
        result.push_str(&text[last_end..]);

        return MetaOutcome {
            html: result,
            strategy,
        };
    }

    if let Some(head) = HEAD_OPEN_REGEX.find(&text) {
        let mut result = String::with_capacity(text.len() + CANONICAL_META_LINE.len());
        result.push_str(&text[..head.end()]);
        result.push_str(CANONICAL_META_LINE);
        result.push_str(&text[head.end()..]);

        return MetaOutcome {
            html: result,
            strategy: MetaStrategy::InsertedAfterHead,
        };
    }

    MetaOutcome {
        html: text,
        strategy: MetaStrategy::NoHead,
    }
}

/// Literal rewrite of the charset labels Word writes into exported pages.
pub fn rewrite_legacy_charset(text: &str) -> String {
    text.replace("charset=windows-1252", "charset=utf-8")
        .replace("charset=Windows-1252", "charset=utf-8")
        .replace("charset=unicode", "charset=utf-8")
}

/// Charset-declaring meta tags in document order. Ranges include leading whitespace.
fn find_charset_decls(text: &str) -> Vec<(Range<usize>, CharsetDecl)> {
    META_TAG_REGEX
        .captures_iter(text)
        .filter_map(|caps| {
            let tag = caps.get(0)?;
            let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            classify(attrs).map(|kind| (tag.range(), kind))
        })
        .collect()
}

fn classify(attrs: &str) -> Option<CharsetDecl> {
    let mut http_equiv_content_type = false;
    let mut content_has_charset = false;

    for caps in ATTR_REGEX.captures_iter(attrs) {
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str())
            .unwrap_or("");

        if name.eq_ignore_ascii_case("charset") {
            return Some(CharsetDecl::MetaCharset);
        }
        if name.eq_ignore_ascii_case("http-equiv") {
            http_equiv_content_type = value.trim().eq_ignore_ascii_case("content-type");
        }
        if name.eq_ignore_ascii_case("content") {
            content_has_charset = value.to_ascii_lowercase().contains("charset=");
        }
    }

    (http_equiv_content_type && content_has_charset).then_some(CharsetDecl::HttpEquiv)
}
