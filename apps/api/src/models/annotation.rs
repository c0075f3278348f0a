use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Review state of a skill annotation. Only `Rejected` removes an annotation from highlighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    Approved,
    #[default]
    Pending,
    Rejected,
}

impl ApprovalState {
    pub fn is_highlightable(self) -> bool {
        self != ApprovalState::Rejected
    }
}

/// One skill entry supplied by the skills-management side for a single job description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillAnnotation {
    pub id: String,
    /// Literal text searched for in the document (case-insensitive).
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// Sub-classification such as "general" or "specialized"; drives the marker class.
    #[serde(default)]
    pub kind: Option<String>,
    /// 0.0 – 1.0, display only.
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub approval_state: ApprovalState,
}

impl SkillAnnotation {
    pub fn is_highlightable(&self) -> bool {
        self.approval_state.is_highlightable() && !self.name.trim().is_empty()
    }
}

// Value equality with the score compared bit-for-bit, so annotation lists can key a cache.
impl PartialEq for SkillAnnotation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.category == other.category
            && self.kind == other.kind
            && self.confidence_score.to_bits() == other.confidence_score.to_bits()
            && self.approval_state == other.approval_state
    }
}

impl Eq for SkillAnnotation {}

impl Hash for SkillAnnotation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.name.hash(state);
        self.category.hash(state);
        self.kind.hash(state);
        self.confidence_score.to_bits().hash(state);
        self.approval_state.hash(state);
    }
}
