use std::collections::HashMap;

const MIN_KEYWORD_LEN: usize = 4;

const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "also", "because", "been", "before", "being", "below",
    "between", "both", "could", "does", "doing", "down", "during", "each", "even", "every",
    "from", "further", "going", "have", "having", "here", "into", "just", "know", "like",
    "made", "make", "many", "more", "most", "much", "must", "only", "other", "over", "really",
    "right", "said", "same", "should", "some", "such", "than", "that", "their", "them",
    "then", "there", "these", "they", "thing", "things", "this", "those", "through", "today",
    "under", "until", "very", "want", "well", "were", "what", "when", "where", "which",
    "while", "will", "with", "would", "your", "okay", "yeah", "gonna", "let's",
];

/// Most frequent content words, most frequent first. Ties keep first-occurrence order.
pub fn keywords_by_frequency(text: &str, max: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let words = text
        .split(|c: char| !(c.is_alphabetic() || c == '\''))
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| w.chars().count() >= MIN_KEYWORD_LEN && !STOP_WORDS.contains(&w.as_str()));

    for (position, word) in words.enumerate() {
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().take(max).map(|(word, _, _)| word).collect()
}

/// One concept per line of model output, with list bullets and numbering removed.
pub fn parse_concept_list(output: &str, max: usize) -> Vec<String> {
    output
        .lines()
        .filter(|line| line.trim().chars().count() > 3)
        .map(|line| {
            line.trim_matches(|c: char| {
                c.is_ascii_digit() || matches!(c, '•' | '-' | '*' | '.' | ')' | ' ' | '\t')
            })
            .to_string()
        })
        .filter(|c| !c.is_empty())
        .take(max)
        .collect()
}
