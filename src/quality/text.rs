//! Text preparation for trope detection

/// Tags whose closing form (or any form, for `br`) ends a line
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "table",
    "section", "article", "blockquote", "header", "footer",
];

/// Removes HTML tags, turning block-closing tags into line breaks
///
/// Entities are left as written. A `<` with no closing `>` is kept as text.
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find('>') {
            Some(close) => {
                if ends_line(&after[..close]) {
                    out.push('\n');
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push('<');
                rest = after;
            }
        }
    }
    out.push_str(rest);

    out
}

fn ends_line(tag: &str) -> bool {
    let tag = tag.trim();
    let (closing, body) = match tag.strip_prefix('/') {
        Some(body) => (true, body),
        None => (false, tag),
    };

    let name: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();

    if name == "br" {
        return true;
    }
    closing && BLOCK_TAGS.contains(&name.as_str())
}

/// Replaces typographic apostrophes with ASCII ones, keeping character offsets
pub fn normalize_apostrophes(text: &str) -> String {
    text.replace(|c: char| c == '\u{2019}' || c == '\u{2018}', "'")
}

/// Converts a byte offset into a character offset
pub fn char_offset(text: &str, byte_index: usize) -> usize {
    text[..byte_index].chars().count()
}

/// A sentence within analysed text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence<'a> {
    pub text: &'a str,
    /// Byte offset of the sentence in the full text
    pub start: usize,
    /// Zero-based line the sentence sits on
    pub line: usize,
}

/// Splits text into sentences
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace or the end of
/// the line, and never spans a line break.
pub fn split_sentences(text: &str) -> Vec<Sentence<'_>> {
    let mut sentences = Vec::new();
    let mut line_start = 0;

    for (line_no, line) in text.split('\n').enumerate() {
        let mut start = 0;
        let mut chars = line.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            if !matches!(c, '.' | '!' | '?') {
                continue;
            }
            let at_boundary = match chars.peek() {
                None => true,
                Some(&(_, next)) => next.is_whitespace(),
            };
            if at_boundary {
                let end = i + c.len_utf8();
                push_sentence(&mut sentences, line, line_start, start, end, line_no);
                start = end;
            }
        }
        push_sentence(&mut sentences, line, line_start, start, line.len(), line_no);

        line_start += line.len() + 1;
    }

    sentences
}

fn push_sentence<'a>(
    sentences: &mut Vec<Sentence<'a>>,
    line: &'a str,
    line_start: usize,
    start: usize,
    end: usize,
    line_no: usize,
) {
    let raw = &line[start..end];
    let trimmed = raw.trim_start();
    let offset = start + (raw.len() - trimmed.len());
    let trimmed = trimmed.trim_end();

    if !trimmed.is_empty() {
        sentences.push(Sentence {
            text: trimmed,
            start: line_start + offset,
            line: line_no,
        });
    }
}
