//! Highlight Engine — wraps skill-name occurrences in a job description with inline markers.
//!
//! Algorithm:
//! 1. Normalize the document (see `normalizer`).
//! 2. Drop rejected annotations and blank names; stable-sort by name length, longest first.
//! 3. For each annotation, scan the normalized document for case-insensitive, word-bounded
//!    occurrences of the escaped literal name. An occurrence is accepted only if it
//!    - does not overlap a span already claimed by a longer name,
//!    - does not overlap a character reference (`&amp;`, `&#39;`, ...),
//!    - in markup, does not overlap a tag (`<...>`, quoted attribute values may hold `>`).
//!      A raw `>` in a text node is ordinary text.
//! 4. Render the claimed spans in document order in a single pass.
//!
//! Cost is O(eligible annotations × document length) scanning, plus one regex compile per
//! distinct name not yet in the process-wide pattern cache (roughly 0.5 ms each, so a cold
//! 200-skill lexicon costs tens of milliseconds once). Markers are inserted only at the end,
//! so no annotation ever re-scans (or nests inside) another annotation's marker.
//! Names are scanned one at a time rather than as one alternation: in "A B C D" the name
//! "B C D" must win over the earlier but shorter "A B".

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::{debug, warn};

use crate::highlight::normalizer::{is_markup, normalize, tag_spans};
use crate::models::annotation::SkillAnnotation;

/// Base CSS class carried by every marker.
pub const MARKER_CLASS: &str = "skill-highlight";

/// Compiled name patterns kept between calls; the skill lexicon changes slowly.
const PATTERN_CACHE_SIZE: usize = 4096;

static PATTERNS: Lazy<Mutex<LruCache<String, Arc<Regex>>>> = Lazy::new(|| {
    Mutex::new(LruCache::new(
        NonZeroUsize::new(PATTERN_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
    ))
});

static CHARACTER_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);")
        .expect("Valid character reference regex")
});

/// Result of one highlight pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlighted {
    pub html: String,
    pub marker_count: usize,
}

/// Highlights every eligible annotation in `document`.
pub fn highlight(annotations: &[SkillAnnotation], document: &str) -> Highlighted {
    let normalized = normalize(document);

    if annotations.is_empty() || normalized.is_empty() {
        return Highlighted {
            html: normalized,
            marker_count: 0,
        };
    }

    let mut eligible: Vec<&SkillAnnotation> = annotations
        .iter()
        .filter(|a| a.is_highlightable())
        .collect();
    // sort_by is stable: equal-length names keep their input order
    eligible.sort_by(|a, b| b.name.chars().count().cmp(&a.name.chars().count()));

    let markup = is_markup(&normalized);
    let mut protected: Vec<Range<usize>> = CHARACTER_REFERENCE
        .find_iter(&normalized)
        .map(|m| m.range())
        .collect();
    if markup {
        protected.extend(tag_spans(&normalized));
    }

    let mut claimed: BTreeMap<usize, (usize, &SkillAnnotation)> = BTreeMap::new();

    for annotation in &eligible {
        let Some(pattern) = literal_pattern(&annotation.name) else {
            continue;
        };

        let mut pos = 0;
        while let Some(found) = pattern.find_at(&normalized, pos) {
            let span = found.range();
            let accepted = is_word_bounded(&normalized, &span)
                && !overlaps_claimed(&claimed, &span)
                && !protected.iter().any(|p| overlaps(p, &span));

            if accepted {
                pos = span.end;
                claimed.insert(span.start, (span.end, *annotation));
            } else {
                pos = next_char_boundary(&normalized, span.start);
            }

            if pos >= normalized.len() {
                break;
            }
        }
    }

    let marker_count = claimed.len();
    let mut html = String::with_capacity(normalized.len() + marker_count * 96);
    let mut cursor = 0;
    for (start, (end, annotation)) in &claimed {
        html.push_str(&normalized[cursor..*start]);
        html.push_str(&render_marker(annotation, &normalized[*start..*end]));
        cursor = *end;
    }
    html.push_str(&normalized[cursor..]);

    debug!(
        eligible = eligible.len(),
        markers = marker_count,
        markup,
        "Highlight pass complete"
    );

    Highlighted { html, marker_count }
}

/// Builds the marker for one matched occurrence. `matched` is copied verbatim.
pub fn render_marker(annotation: &SkillAnnotation, matched: &str) -> String {
    let token = kind_token(annotation.kind.as_deref());
    let class = if token.is_empty() {
        MARKER_CLASS.to_string()
    } else {
        format!("{MARKER_CLASS} skill-{token}")
    };

    format!(
        r#"<span class="{}" data-skill-id="{}" title="{}">{}</span>"#,
        escape_attr(&class),
        escape_attr(&annotation.id),
        escape_attr(&tooltip(annotation)),
        matched
    )
}

/// "<category> (<score>)", score at two decimal places.
pub fn tooltip(annotation: &SkillAnnotation) -> String {
    format!(
        "{} ({:.2})",
        annotation.category, annotation.confidence_score
    )
}

/// Lower-cased `kind` with whitespace runs joined by `-`; empty when absent.
pub fn kind_token(kind: Option<&str>) -> String {
    kind.map(|k| {
        k.split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-")
    })
    .unwrap_or_default()
}

/// Compiled, case-insensitive pattern for a literal skill name, shared across calls.
fn literal_pattern(name: &str) -> Option<Arc<Regex>> {
    if let Some(re) = lock_patterns().get(name) {
        return Some(Arc::clone(re));
    }

    // Compiled outside the lock; concurrent misses on one name just race to insert.
    match RegexBuilder::new(&regex::escape(name))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => {
            let re = Arc::new(re);
            lock_patterns().put(name.to_string(), Arc::clone(&re));
            Some(re)
        }
        Err(e) => {
            warn!("Skipping skill name that cannot be compiled into a pattern: {e}");
            None
        }
    }
}

fn lock_patterns() -> MutexGuard<'static, LruCache<String, Arc<Regex>>> {
    PATTERNS.lock().unwrap_or_else(PoisonError::into_inner)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_word_bounded(text: &str, span: &Range<usize>) -> bool {
    let before = text[..span.start].chars().next_back();
    let after = text[span.end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

fn overlaps_claimed(claimed: &BTreeMap<usize, (usize, &SkillAnnotation)>, span: &Range<usize>) -> bool {
    // Claimed spans never overlap each other, so only the last one starting before
    // `span.end` can reach into `span`.
    claimed
        .range(..span.end)
        .next_back()
        .is_some_and(|(_, (end, _))| *end > span.start)
}

fn next_char_boundary(text: &str, from: usize) -> usize {
    text[from..]
        .chars()
        .next()
        .map_or(text.len(), |c| from + c.len_utf8())
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
