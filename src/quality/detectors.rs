//! Individual trope detectors
//!
//! Every detector takes the prepared analysis text and reports its findings
//! with character offsets into that text.

use crate::quality::text::{char_offset, split_sentences, Sentence};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A banned word and where it occurs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordMatch {
    pub word: String,
    pub count: usize,
    pub positions: Vec<usize>,
}

/// A banned phrase and where it occurs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseMatch {
    pub phrase: String,
    pub count: usize,
    pub positions: Vec<usize>,
}

/// A matched stylistic construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub text: String,
    pub position: usize,
}

/// A lexicon entry compiled to a case-insensitive matcher
#[derive(Debug, Clone)]
pub struct LexiconEntry {
    pub term: String,
    regex: Regex,
}

impl LexiconEntry {
    /// Matches the term as a whole word
    pub fn word(term: &str) -> Result<Self, regex::Error> {
        let term = term.trim().to_lowercase();
        let regex = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&term)))?;
        Ok(Self { term, regex })
    }

    /// Matches the term anywhere, including inside longer words
    pub fn phrase(term: &str) -> Result<Self, regex::Error> {
        let term = term.trim().to_lowercase();
        let regex = Regex::new(&format!("(?i){}", regex::escape(&term)))?;
        Ok(Self { term, regex })
    }

    fn positions(&self, text: &str) -> Vec<usize> {
        self.regex
            .find_iter(text)
            .map(|m| char_offset(text, m.start()))
            .collect()
    }
}

/// Finds banned words, in lexicon order
pub fn find_banned_words(text: &str, lexicon: &[LexiconEntry]) -> Vec<WordMatch> {
    lexicon
        .iter()
        .filter_map(|entry| {
            let positions = entry.positions(text);
            (!positions.is_empty()).then(|| WordMatch {
                word: entry.term.clone(),
                count: positions.len(),
                positions,
            })
        })
        .collect()
}

/// Finds banned phrases, in lexicon order
pub fn find_banned_phrases(text: &str, lexicon: &[LexiconEntry]) -> Vec<PhraseMatch> {
    lexicon
        .iter()
        .filter_map(|entry| {
            let positions = entry.positions(text);
            (!positions.is_empty()).then(|| PhraseMatch {
                phrase: entry.term.clone(),
                count: positions.len(),
                positions,
            })
        })
        .collect()
}

/// Counts em dashes (U+2014 only)
pub fn count_em_dashes(text: &str) -> usize {
    text.chars().filter(|&c| c == '\u{2014}').count()
}

/// Tallies limited-use words that appear at least once
pub fn count_limited_use_words(text: &str, lexicon: &[LexiconEntry]) -> BTreeMap<String, usize> {
    lexicon
        .iter()
        .filter_map(|entry| {
            let count = entry.regex.find_iter(text).count();
            (count > 0).then(|| (entry.term.clone(), count))
        })
        .collect()
}

/// Finds every match of the negation constructions
pub fn find_negation_patterns(text: &str, patterns: &[Regex]) -> Vec<PatternMatch> {
    let mut matches: Vec<PatternMatch> = patterns
        .iter()
        .flat_map(|pattern| pattern.find_iter(text))
        .map(|m| PatternMatch {
            text: m.as_str().to_string(),
            position: char_offset(text, m.start()),
        })
        .collect();
    matches.sort_by_key(|m| m.position);
    matches
}

/// Finds runs of three short one-to-three word sentences ("Bold. Simple. Done.")
///
/// A run of `n` consecutive short sentences on one line counts `n / 3` times.
pub fn find_triplets(text: &str) -> Vec<PatternMatch> {
    let sentences = split_sentences(text);
    let mut matches = Vec::new();
    let mut run: Vec<Sentence<'_>> = Vec::new();

    for sentence in sentences {
        let continues = run
            .last()
            .map_or(true, |previous| previous.line == sentence.line);

        if is_short_fragment(sentence.text) && continues {
            run.push(sentence);
            continue;
        }

        flush_run(text, &mut run, &mut matches);
        if is_short_fragment(sentence.text) {
            run.push(sentence);
        }
    }
    flush_run(text, &mut run, &mut matches);

    matches
}

fn flush_run(text: &str, run: &mut Vec<Sentence<'_>>, matches: &mut Vec<PatternMatch>) {
    for group in run.chunks_exact(3) {
        let joined: Vec<&str> = group.iter().map(|s| s.text).collect();
        matches.push(PatternMatch {
            text: joined.join(" "),
            position: char_offset(text, group[0].start),
        });
    }
    run.clear();
}

fn is_short_fragment(sentence: &str) -> bool {
    let Some(body) = sentence.strip_suffix('.') else {
        return false;
    };
    if body.ends_with('.') {
        return false;
    }

    let words: Vec<&str> = body.split_whitespace().collect();
    if words.is_empty() || words.len() > 3 {
        return false;
    }

    let starts_upper = words[0].chars().next().is_some_and(char::is_uppercase);
    starts_upper
        && words.iter().all(|word| {
            word.chars()
                .all(|c| c.is_alphanumeric() || c == '\'' || c == '-')
        })
}

/// Finds questions opening with one of the rhetorical openers
pub fn find_rhetorical_questions(text: &str, openers: &[&str]) -> Vec<PatternMatch> {
    split_sentences(text)
        .into_iter()
        .filter(|sentence| sentence.text.ends_with('?'))
        .filter(|sentence| {
            let lowered = sentence.text.to_lowercase();
            openers.iter().any(|opener| starts_with_phrase(&lowered, opener))
        })
        .map(|sentence| PatternMatch {
            text: sentence.text.to_string(),
            position: char_offset(text, sentence.start),
        })
        .collect()
}

fn starts_with_phrase(sentence: &str, phrase: &str) -> bool {
    match sentence.strip_prefix(phrase) {
        Some(rest) => !rest.chars().next().is_some_and(char::is_alphanumeric),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(terms: &[&str]) -> Vec<LexiconEntry> {
        terms.iter().map(|t| LexiconEntry::word(t).unwrap()).collect()
    }

    fn phrases(terms: &[&str]) -> Vec<LexiconEntry> {
        terms.iter().map(|t| LexiconEntry::phrase(t).unwrap()).collect()
    }

    #[test]
    fn test_banned_words_whole_word_case_insensitive() {
        let found = find_banned_words(
            "Delve in. We delve. Delved and delves do not count.",
            &words(&["delve", "tapestry"]),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].word, "delve");
        assert_eq!(found[0].count, 2);
        assert_eq!(found[0].positions, vec![0, 13]);
    }

    #[test]
    fn test_hyphenated_banned_word() {
        let found = find_banned_words("A true game-changer.", &words(&["game-changer"]));
        assert_eq!(found[0].count, 1);
        assert_eq!(found[0].positions, vec![7]);
    }

    #[test]
    fn test_positions_are_characters() {
        let found = find_banned_words("café realm", &words(&["realm"]));
        assert_eq!(found[0].positions, vec![5]);
    }

    #[test]
    fn test_banned_phrases_substring() {
        let found = find_banned_phrases(
            "Look no further. LOOK NO FURTHERMORE.",
            &phrases(&["look no further"]),
        );
        assert_eq!(found[0].count, 2);
        assert_eq!(found[0].positions, vec![0, 17]);
    }

    #[test]
    fn test_em_dash_only() {
        assert_eq!(count_em_dashes("a \u{2014} b \u{2013} c - d \u{2014}"), 2);
        assert_eq!(count_em_dashes("a &mdash; b"), 0);
    }

    #[test]
    fn test_limited_use_counts() {
        let counts = count_limited_use_words(
            "The perfect gift. Perfect for all. An ideal pick.",
            &words(&["perfect", "ideal", "premium"]),
        );
        assert_eq!(counts.get("perfect"), Some(&2));
        assert_eq!(counts.get("ideal"), Some(&1));
        assert!(!counts.contains_key("premium"));
    }

    #[test]
    fn test_triplets() {
        let found = find_triplets("Bold. Simple. Effective. Our shoes last for years.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "Bold. Simple. Effective.");
        assert_eq!(found[0].position, 0);
    }

    #[test]
    fn test_triplet_runs_and_lines() {
        assert_eq!(find_triplets("One. Two. Three. Four. Five. Six.").len(), 2);
        assert_eq!(find_triplets("One. Two. Three. Four. Five.").len(), 1);
        assert!(find_triplets("One. Two.\nThree.").is_empty());
        assert!(find_triplets("These shoes are great for long runs. Yes. Really.").is_empty());
    }

    #[test]
    fn test_short_fragment_rules() {
        assert!(is_short_fragment("Built to last."));
        assert!(!is_short_fragment("built to last."));
        assert!(!is_short_fragment("Four words are here."));
        assert!(!is_short_fragment("Wait..."));
        assert!(!is_short_fragment("Really?"));
    }

    #[test]
    fn test_negation_patterns() {
        let patterns: Vec<Regex> = crate::quality::lexicon::NEGATION_PATTERNS
            .iter()
            .map(|p| Regex::new(p).unwrap())
            .collect();
        let text = "These aren't just shoes. They are more than just gear. \
                    Not only comfy but also light. It's not about speed, it's about joy.";
        let found = find_negation_patterns(text, &patterns);
        assert_eq!(found.len(), 4);
        assert_eq!(found[0].text, "aren't just");
        assert!(found.windows(2).all(|w| w[0].position <= w[1].position));
    }

    #[test]
    fn test_rhetorical_questions() {
        let openers = ["are you", "looking for", "need a"];
        let found = find_rhetorical_questions(
            "Looking for shoes? Are you ready? Need another pair? What size? Are you here.",
            &openers,
        );
        let texts: Vec<&str> = found.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Looking for shoes?", "Are you ready?"]);
        assert_eq!(found[1].position, 19);
    }
}
