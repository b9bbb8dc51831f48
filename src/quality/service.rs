//! Content quality scoring

use crate::config::QualityConfig;
use crate::quality::detectors::{
    count_em_dashes, count_limited_use_words, find_banned_phrases, find_banned_words,
    find_negation_patterns, find_rhetorical_questions, find_triplets, LexiconEntry, PatternMatch,
    PhraseMatch, WordMatch,
};
use crate::quality::lexicon::{
    weights, BANNED_PHRASES, BANNED_WORDS, LIMITED_USE_WORDS, NEGATION_PATTERNS,
    QUALITY_SCORE_PASS_THRESHOLD, RHETORICAL_OPENERS,
};
use crate::quality::text::{normalize_apostrophes, strip_html};
use crate::ValidationError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Copy to be checked before publication
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentInput {
    #[serde(default)]
    pub h1: Option<String>,
    #[serde(default)]
    pub title_tag: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub top_description: Option<String>,
    /// Main body copy, required
    pub bottom_description: String,
}

impl ContentInput {
    /// Content with only the required body
    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            bottom_description: body.into(),
            ..Self::default()
        }
    }

    /// Tag-stripped fields joined by blank lines, in display order
    fn analysis_text(&self) -> String {
        let fields = [
            self.h1.as_deref(),
            self.title_tag.as_deref(),
            self.meta_description.as_deref(),
            self.top_description.as_deref(),
            Some(self.bottom_description.as_str()),
        ];

        fields
            .into_iter()
            .flatten()
            .map(|field| normalize_apostrophes(strip_html(field).trim()))
            .filter(|field| !field.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Everything the detectors found, with the resulting score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TropeDetectionResult {
    pub banned_words: Vec<WordMatch>,
    pub banned_phrases: Vec<PhraseMatch>,
    pub em_dash_count: usize,
    pub triplet_patterns: Vec<PatternMatch>,
    pub negation_patterns: Vec<PatternMatch>,
    pub rhetorical_questions: Vec<PatternMatch>,
    pub limited_use_words: BTreeMap<String, usize>,
    pub overall_score: f64,
    pub is_approved: bool,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityCheckResult {
    pub passed_qa: bool,
    pub score: f64,
    pub tropes: TropeDetectionResult,
    pub checked_at: DateTime<Utc>,
}

/// Outcome for one item of a batch; exactly one of `result` and `error` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemOutcome {
    pub index: usize,
    pub result: Option<QualityCheckResult>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchQualityResult {
    pub results: Vec<BatchItemOutcome>,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

/// Scores copy for machine-written tropes
///
/// Lexicons are compiled once at construction; the service is read-only
/// afterwards and can be shared freely.
///
/// # Example
///
/// ```
/// use seo_frontier::quality::{ContentInput, ContentQualityService};
///
/// let service = ContentQualityService::with_defaults().unwrap();
/// let result = service
///     .check_content_quality(&ContentInput::from_body("Soft leather boots for daily wear."))
///     .unwrap();
/// assert!(result.passed_qa);
/// assert_eq!(result.score, 100.0);
/// ```
#[derive(Debug, Clone)]
pub struct ContentQualityService {
    banned_words: Vec<LexiconEntry>,
    banned_phrases: Vec<LexiconEntry>,
    limited_use_words: Vec<LexiconEntry>,
    negation_patterns: Vec<Regex>,
    max_limited_use: usize,
}

impl ContentQualityService {
    /// Builds the service, adding any configured extra words and phrases
    pub fn new(config: &QualityConfig) -> Result<Self, regex::Error> {
        let banned_words =
            compile_lexicon(BANNED_WORDS, &config.extra_banned_words, LexiconEntry::word)?;
        let banned_phrases =
            compile_lexicon(BANNED_PHRASES, &config.extra_banned_phrases, LexiconEntry::phrase)?;
        let limited_use_words = compile_lexicon(LIMITED_USE_WORDS, &[], LexiconEntry::word)?;
        let negation_patterns = NEGATION_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            banned_words,
            banned_phrases,
            limited_use_words,
            negation_patterns,
            max_limited_use: config.max_limited_use_words_per_page,
        })
    }

    pub fn with_defaults() -> Result<Self, regex::Error> {
        Self::new(&QualityConfig::default())
    }

    /// Runs every detector over plain text and scores the findings
    pub fn detect_tropes(&self, text: &str) -> TropeDetectionResult {
        let mut result = TropeDetectionResult {
            banned_words: find_banned_words(text, &self.banned_words),
            banned_phrases: find_banned_phrases(text, &self.banned_phrases),
            em_dash_count: count_em_dashes(text),
            triplet_patterns: find_triplets(text),
            negation_patterns: find_negation_patterns(text, &self.negation_patterns),
            rhetorical_questions: find_rhetorical_questions(text, RHETORICAL_OPENERS),
            limited_use_words: count_limited_use_words(text, &self.limited_use_words),
            overall_score: 100.0,
            is_approved: true,
            suggestions: Vec::new(),
        };

        result.overall_score = self.score(&result);
        result.is_approved = result.overall_score >= QUALITY_SCORE_PASS_THRESHOLD;
        result.suggestions = self.suggestions(&result);
        result
    }

    /// Checks one piece of content
    ///
    /// # Returns
    ///
    /// * `Err(ValidationError::EmptyField)` - `bottom_description` is blank
    pub fn check_content_quality(
        &self,
        content: &ContentInput,
    ) -> Result<QualityCheckResult, ValidationError> {
        if content.bottom_description.trim().is_empty() {
            return Err(ValidationError::EmptyField("bottom_description"));
        }

        let tropes = self.detect_tropes(&content.analysis_text());
        tracing::debug!(
            score = tropes.overall_score,
            approved = tropes.is_approved,
            "Content quality checked"
        );

        Ok(QualityCheckResult {
            passed_qa: tropes.is_approved,
            score: tropes.overall_score,
            tropes,
            checked_at: Utc::now(),
        })
    }

    /// Checks every item independently; an invalid item never affects the rest
    pub fn check_batch(&self, items: &[ContentInput]) -> BatchQualityResult {
        let mut batch = BatchQualityResult {
            results: Vec::with_capacity(items.len()),
            passed: 0,
            failed: 0,
            errored: 0,
        };

        for (index, item) in items.iter().enumerate() {
            let outcome = match self.check_content_quality(item) {
                Ok(result) => {
                    if result.passed_qa {
                        batch.passed += 1;
                    } else {
                        batch.failed += 1;
                    }
                    BatchItemOutcome {
                        index,
                        result: Some(result),
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping invalid batch item");
                    batch.errored += 1;
                    BatchItemOutcome {
                        index,
                        result: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            batch.results.push(outcome);
        }

        batch
    }

    fn limited_use_excess(&self, counts: &BTreeMap<String, usize>) -> usize {
        counts
            .values()
            .map(|count| count.saturating_sub(self.max_limited_use))
            .sum()
    }

    fn score(&self, result: &TropeDetectionResult) -> f64 {
        let banned_words: usize = result.banned_words.iter().map(|m| m.count).sum();
        let banned_phrases: usize = result.banned_phrases.iter().map(|m| m.count).sum();

        let penalty = banned_words as f64 * weights::BANNED_WORD
            + banned_phrases as f64 * weights::BANNED_PHRASE
            + result.em_dash_count as f64 * weights::EM_DASH
            + result.triplet_patterns.len() as f64 * weights::TRIPLET
            + result.negation_patterns.len() as f64 * weights::NEGATION
            + result.rhetorical_questions.len() as f64 * weights::RHETORICAL_QUESTION
            + self.limited_use_excess(&result.limited_use_words) as f64
                * weights::LIMITED_USE_EXCESS;

        (100.0 - penalty).clamp(0.0, 100.0)
    }

    fn suggestions(&self, result: &TropeDetectionResult) -> Vec<String> {
        let mut suggestions = Vec::new();

        if !result.banned_words.is_empty() {
            let words: Vec<&str> = result.banned_words.iter().map(|m| m.word.as_str()).collect();
            suggestions.push(format!("Replace banned words: {}", words.join(", ")));
        }
        if !result.banned_phrases.is_empty() {
            let phrases: Vec<&str> = result
                .banned_phrases
                .iter()
                .map(|m| m.phrase.as_str())
                .collect();
            suggestions.push(format!("Rewrite banned phrases: {}", phrases.join(", ")));
        }
        if result.em_dash_count > 0 {
            suggestions.push(format!(
                "Replace em dashes with commas or periods ({} found)",
                result.em_dash_count
            ));
        }
        if !result.triplet_patterns.is_empty() {
            suggestions.push(format!(
                "Break up choppy three-fragment sequences ({} found)",
                result.triplet_patterns.len()
            ));
        }
        if !result.negation_patterns.is_empty() {
            suggestions.push(format!(
                "Rephrase \"not just X, but Y\" constructions ({} found)",
                result.negation_patterns.len()
            ));
        }
        if !result.rhetorical_questions.is_empty() {
            suggestions.push(format!(
                "Replace rhetorical questions with direct statements ({} found)",
                result.rhetorical_questions.len()
            ));
        }

        let overused: Vec<String> = result
            .limited_use_words
            .iter()
            .filter(|(_, count)| **count > self.max_limited_use)
            .map(|(word, count)| format!("{} ({})", word, count))
            .collect();
        if !overused.is_empty() {
            suggestions.push(format!("Limit overused words: {}", overused.join(", ")));
        }

        suggestions
    }
}

/// Compiles built-in terms followed by extras, skipping repeats
fn compile_lexicon(
    builtin: &[&str],
    extra: &[String],
    compile: fn(&str) -> Result<LexiconEntry, regex::Error>,
) -> Result<Vec<LexiconEntry>, regex::Error> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    let terms = builtin
        .iter()
        .map(|term| term.to_string())
        .chain(extra.iter().cloned());
    for term in terms {
        let key = term.trim().to_lowercase();
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        entries.push(compile(&term)?);
    }

    Ok(entries)
}
