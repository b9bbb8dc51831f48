//! Content fingerprinting

use crate::config::ChangeDetectionConfig;

/// Default number of body characters included in a fingerprint
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 5000;

/// Page fields that make up a content fingerprint
///
/// Missing fields hash as empty strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashFields<'a> {
    pub title: Option<&'a str>,
    pub h1: Option<&'a str>,
    pub meta_description: Option<&'a str>,
    pub body_text: Option<&'a str>,
}

/// Computes stable fingerprints of page content
///
/// The body is truncated to `max_content_length` characters before hashing,
/// so two bodies that differ only past that point share a fingerprint.
///
/// # Examples
///
/// ```
/// use seo_frontier::changes::{ContentHasher, HashFields};
///
/// let hasher = ContentHasher::default();
/// let a = hasher.compute_hash(&HashFields { title: Some("Title"), ..Default::default() });
/// let b = hasher.compute_hash(&HashFields { title: Some("title"), ..Default::default() });
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHasher {
    max_content_length: usize,
    normalize_whitespace: bool,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTENT_LENGTH, true)
    }
}

impl ContentHasher {
    pub fn new(max_content_length: usize, normalize_whitespace: bool) -> Self {
        Self {
            max_content_length,
            normalize_whitespace,
        }
    }

    pub fn from_config(config: &ChangeDetectionConfig) -> Self {
        Self::new(config.max_content_length, config.normalize_whitespace)
    }

    pub fn max_content_length(&self) -> usize {
        self.max_content_length
    }

    /// Returns the 32-character lowercase hex MD5 of the normalized fields
    pub fn compute_hash(&self, fields: &HashFields<'_>) -> String {
        let body = truncate_chars(fields.body_text.unwrap_or(""), self.max_content_length);

        let parts = [
            self.normalize(fields.title.unwrap_or("")),
            self.normalize(fields.h1.unwrap_or("")),
            self.normalize(fields.meta_description.unwrap_or("")),
            self.normalize(body),
        ];

        format!("{:x}", md5::compute(parts.join("|").as_bytes()))
    }

    fn normalize(&self, text: &str) -> String {
        let folded = text.to_lowercase();
        if self.normalize_whitespace {
            folded.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            folded
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
