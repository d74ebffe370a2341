/// Sentences with this many words or fewer carry too little to ask about.
pub const MIN_SENTENCE_WORDS: usize = 6;

const CLOSERS: &[char] = &['"', '\'', ')', ']', '\u{201d}', '\u{2019}'];
const OPENERS: &[char] = &['"', '\'', '(', '[', '\u{201c}', '\u{2018}'];

/// Tokens ending in '.' that do not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "dr.", "mr.", "mrs.", "ms.", "prof.", "sr.", "jr.", "st.", "vs.", "e.g.", "i.e.", "fig.",
    "eq.", "no.", "approx.", "cf.", "etc.",
];

fn ends_with_abbreviation(piece: &str) -> bool {
    let Some(last) = piece.split_whitespace().last() else {
        return false;
    };
    let last = last.trim_start_matches(OPENERS).to_lowercase();
    if ABBREVIATIONS.contains(&last.as_str()) {
        return true;
    }
    // Initials such as the "J." in "J. Smith"
    let mut chars = last.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some('.'), None) if c.is_alphabetic()
    )
}

fn push_sentence(sentences: &mut Vec<String>, piece: &str) {
    let normalized = piece.split_whitespace().collect::<Vec<_>>().join(" ");
    if !normalized.is_empty() {
        sentences.push(normalized);
    }
}

/// Split text into sentences on terminal punctuation followed by whitespace and
/// something that can start a sentence. Whitespace inside a sentence is collapsed.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i].1;
        if !matches!(c, '.' | '!' | '?') {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && (matches!(chars[j].1, '.' | '!' | '?') || CLOSERS.contains(&chars[j].1)) {
            j += 1;
        }
        if j >= chars.len() || !chars[j].1.is_whitespace() {
            i = j;
            continue;
        }

        let mut k = j;
        while k < chars.len() && chars[k].1.is_whitespace() {
            k += 1;
        }
        let starts_sentence = k < chars.len() && {
            let next = chars[k].1;
            next.is_uppercase() || next.is_ascii_digit() || OPENERS.contains(&next)
        };
        let end = chars[j].0;
        let abbreviated = c == '.' && ends_with_abbreviation(&text[start..end]);

        if starts_sentence && !abbreviated {
            push_sentence(&mut sentences, &text[start..end]);
            start = chars[k].0;
        }
        i = k;
    }

    push_sentence(&mut sentences, &text[start..]);
    sentences
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Sentences long enough to generate questions from, first `limit` of them.
pub fn informative_sentences(text: &str, limit: usize) -> Vec<String> {
    split_sentences(text)
        .into_iter()
        .filter(|s| word_count(s) > MIN_SENTENCE_WORDS)
        .take(limit)
        .collect()
}

/// Reduce generated text to a single question: drop anything from an
/// `Options:`/`Answer:` marker on, keep up to the first '?', trim.
pub fn clean_question(text: &str) -> String {
    let cut = ["Options:", "Answer:"]
        .iter()
        .filter_map(|marker| text.find(marker))
        .min()
        .unwrap_or(text.len());
    let head = &text[..cut];

    match head.find('?') {
        Some(q) => head[..=q].trim().to_string(),
        None => head.trim().to_string(),
    }
}

/// At most `max_chars` characters of `text`.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
