//! Trope lexicons and scoring weights

/// Score at or above which content passes review
pub const QUALITY_SCORE_PASS_THRESHOLD: f64 = 80.0;

/// Uses of each limited-use word allowed per page
pub const MAX_LIMITED_USE_WORDS_PER_PAGE: usize = 1;

/// Points deducted per finding in each category
pub mod weights {
    pub const BANNED_WORD: f64 = 20.0;
    pub const BANNED_PHRASE: f64 = 15.0;
    pub const EM_DASH: f64 = 10.0;
    pub const TRIPLET: f64 = 10.0;
    pub const NEGATION: f64 = 10.0;
    pub const RHETORICAL_QUESTION: f64 = 5.0;
    /// Per use beyond the limited-use cap
    pub const LIMITED_USE_EXCESS: f64 = 5.0;
}

/// Words that read as machine-written and are never allowed
pub const BANNED_WORDS: &[&str] = &[
    "delve",
    "delves",
    "delving",
    "tapestry",
    "testament",
    "realm",
    "unleash",
    "unlock",
    "elevate",
    "elevates",
    "embark",
    "bustling",
    "seamless",
    "seamlessly",
    "game-changer",
    "game-changing",
    "cutting-edge",
    "revolutionize",
    "revolutionary",
    "meticulous",
    "meticulously",
    "paramount",
    "pivotal",
    "synergy",
    "leverage",
    "harness",
    "ever-evolving",
    "intricate",
    "nestled",
    "beacon",
    "myriad",
    "plethora",
    "utilize",
    "holistic",
    "robust",
    "endeavor",
    "navigate",
    "landscape",
    "symphony",
    "unparalleled",
    "transformative",
    "captivating",
];

/// Stock phrases matched as case-insensitive substrings
pub const BANNED_PHRASES: &[&str] = &[
    "in today's fast-paced world",
    "in today's digital age",
    "look no further",
    "it's important to note",
    "it's worth noting",
    "when it comes to",
    "to the next level",
    "in the world of",
    "dive into",
    "a testament to",
    "unlock the power",
    "whether you're a",
    "the perfect blend",
    "designed with you in mind",
    "stand the test of time",
    "at the end of the day",
    "we've got you covered",
];

/// Words allowed sparingly, penalized only past the per-page cap
pub const LIMITED_USE_WORDS: &[&str] = &[
    "perfect",
    "ideal",
    "premium",
    "essential",
    "ultimate",
    "amazing",
    "stunning",
    "exceptional",
    "innovative",
    "curated",
    "effortless",
    "timeless",
    "luxurious",
    "versatile",
];

/// Sentence openers marking a rhetorical question
pub const RHETORICAL_OPENERS: &[&str] = &[
    "are you",
    "looking for",
    "want to",
    "ready to",
    "need a",
    "tired of",
    "wondering",
    "have you ever",
    "did you know",
    "why settle",
    "what if",
    "searching for",
];

/// "Not just X, but Y" style constructions
pub const NEGATION_PATTERNS: &[&str] = &[
    r"(?i)\b(?:isn't|aren't|wasn't|weren't|is not|are not|was not|were not)\s+just\b",
    r"(?i)\bmore than just\b",
    r"(?i)\bnot only\b[^.!?]{1,100}?\bbut(?:\s+also)?\b",
    r"(?i)\bit's not about\b[^!?\n]{1,100}?\bit's about\b",
];
