//! Text selection → candidate skill term.
//!
//! Offsets are passed in explicitly (character offsets into the normalized document)
//! so the term extraction stays a pure function of its inputs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::highlight::normalizer::{is_markup, normalize};
use crate::models::annotation::SkillAnnotation;

/// Longest phrase accepted as a skill name.
pub const MAX_TERM_CHARS: usize = 100;

/// Half-open `[start, end)` range in characters of the normalized document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSelection {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedTerm {
    pub text: String,
    pub start: usize,
    pub end: usize,
    /// Id of a non-rejected annotation with the same name, if one already exists.
    pub existing_annotation_id: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Selection is empty (start {start} >= end {end})")]
    EmptySelection { start: usize, end: usize },

    #[error("Selection end {end} is beyond the document length {len}")]
    OutOfBounds { end: usize, len: usize },

    #[error("Selection crosses markup")]
    CrossesMarkup,

    #[error("Selection contains only whitespace")]
    Blank,

    #[error("Selected term is longer than {} characters", MAX_TERM_CHARS)]
    TooLong,
}

/// Extracts the selected term from the normalized `document`.
pub fn select_term(
    document: &str,
    selection: TextSelection,
    annotations: &[SkillAnnotation],
) -> Result<SelectedTerm, SelectionError> {
    let TextSelection { start, end } = selection;
    if start >= end {
        return Err(SelectionError::EmptySelection { start, end });
    }

    let normalized = normalize(document);
    let len = normalized.chars().count();
    if end > len {
        return Err(SelectionError::OutOfBounds { end, len });
    }

    let raw: String = normalized.chars().skip(start).take(end - start).collect();
    if is_markup(&normalized) && raw.contains(['<', '>']) {
        return Err(SelectionError::CrossesMarkup);
    }

    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return Err(SelectionError::Blank);
    }
    if text.chars().count() > MAX_TERM_CHARS {
        return Err(SelectionError::TooLong);
    }

    let lowered = text.to_lowercase();
    let existing_annotation_id = annotations
        .iter()
        .filter(|a| a.approval_state.is_highlightable())
        .find(|a| a.name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase() == lowered)
        .map(|a| a.id.clone());

    Ok(SelectedTerm {
        text,
        start,
        end,
        existing_annotation_id,
    })
}
