// Skill highlighting: normalization, longest-match-first marking, memoization.
// The engine is pure and synchronous; only `cache` holds shared state.

pub mod cache;
pub mod engine;
pub mod handlers;
pub mod normalizer;
pub mod selection;
