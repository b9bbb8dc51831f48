//! Content quality checks
//!
//! Scores marketing copy for tropes typical of machine-written text: banned
//! words and phrases, em dashes, choppy fragment triplets, "not just X"
//! negations, rhetorical questions and overused superlatives.

mod detectors;
mod lexicon;
mod service;
mod text;

pub use detectors::{PatternMatch, PhraseMatch, WordMatch};
pub use lexicon::{
    weights, BANNED_PHRASES, BANNED_WORDS, LIMITED_USE_WORDS, MAX_LIMITED_USE_WORDS_PER_PAGE,
    QUALITY_SCORE_PASS_THRESHOLD, RHETORICAL_OPENERS,
};
pub use service::{
    BatchItemOutcome, BatchQualityResult, ContentInput, ContentQualityService,
    QualityCheckResult, TropeDetectionResult,
};
pub use text::strip_html;
