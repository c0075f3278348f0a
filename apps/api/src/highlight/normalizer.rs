//! Text Normalizer — canonicalises whitespace in job-description text before skill matching.
//!
//! Two branches, picked by [`is_markup`]:
//! - plain text: lines are trimmed, blank lines dropped, runs of spaces/tabs collapsed.
//! - markup: inter-tag whitespace removed, empty `<p>`/`<div>` pairs dropped, whitespace runs collapsed.
//!
//! Both branches are idempotent: `normalize(normalize(s)) == normalize(s)`.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

// Quoted attribute values may contain `>`; an unbalanced quote falls back to a plain character.
static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<[a-zA-Z/!](?:"[^"]*"|'[^']*'|[^<>])*>"#).expect("Valid tag regex")
});

static HORIZONTAL_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]{2,}").expect("Valid horizontal whitespace regex"));

static NEWLINE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("Valid newline run regex"));

static TRAILING_BEFORE_NEWLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+\n").expect("Valid trailing whitespace regex"));

static LEADING_AFTER_NEWLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]+").expect("Valid leading whitespace regex"));

static BETWEEN_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r">\s+<").expect("Valid inter-tag whitespace regex"));

// `<p>` must not catch `<pre>` or `<param>`, hence the optional attribute group.
static EMPTY_PARAGRAPH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<p(?:\s[^>]*)?>(?:\s|<br\s*/?>)*</p\s*>").expect("Valid empty paragraph regex")
});

static EMPTY_DIV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<div(?:\s[^>]*)?>(?:\s|<br\s*/?>)*</div\s*>").expect("Valid empty div regex")
});

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("Valid whitespace run regex"));

/// True if the document contains at least one `<...>` construct.
pub fn is_markup(text: &str) -> bool {
    TAG.is_match(text)
}

/// Byte ranges of every tag in `text`. Text between tags, including a raw `>`, is not covered.
pub fn tag_spans(text: &str) -> Vec<Range<usize>> {
    TAG.find_iter(text).map(|m| m.range()).collect()
}

/// Normalizes a plain-text or HTML document. Empty input yields an empty string.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    if is_markup(text) {
        normalize_markup(text)
    } else {
        normalize_plain(text)
    }
}

fn normalize_plain(text: &str) -> String {
    let collapsed = HORIZONTAL_RUN.replace_all(text, " ");
    let collapsed = NEWLINE_RUN.replace_all(&collapsed, "\n");
    let collapsed = TRAILING_BEFORE_NEWLINE.replace_all(&collapsed, "\n");
    let collapsed = LEADING_AFTER_NEWLINE.replace_all(&collapsed, "\n");

    collapsed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn normalize_markup(text: &str) -> String {
    let mut current = text.to_string();

    // Removing one empty pair can expose its parent as empty, so run to a fixed point.
    loop {
        let next = BETWEEN_TAGS.replace_all(&current, "><").into_owned();
        let next = EMPTY_PARAGRAPH.replace_all(&next, "").into_owned();
        let next = EMPTY_DIV.replace_all(&next, "").into_owned();
        if next == current {
            break;
        }
        current = next;
    }

    WHITESPACE_RUN.replace_all(&current, " ").trim().to_string()
}
