use std::collections::{BTreeMap, HashSet};
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Serialize, Serializer};

use crate::study::text::clean_question;

pub const QUESTION_MARKER: &str = "QUESTION:";
pub const CORRECT_MARKER: &str = "CORRECT:";
pub const OPTION_COUNT: usize = 4;
/// Pads fallback questions when the lecture has too few sentences for distractors.
pub const NONE_OF_THE_ABOVE: &str = "None of the above";

/// Position of an option within a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; OPTION_COUNT] =
        [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(OptionLabel::A),
            'B' => Some(OptionLabel::B),
            'C' => Some(OptionLabel::C),
            'D' => Some(OptionLabel::D),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            OptionLabel::A => 'A',
            OptionLabel::B => 'B',
            OptionLabel::C => 'C',
            OptionLabel::D => 'D',
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl std::str::FromStr for OptionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c.to_ascii_uppercase())
                .ok_or_else(|| format!("not an option label: {}", s.trim())),
            _ => Err(format!("not an option label: {}", s.trim())),
        }
    }
}

/// A complete multiple-choice question. Always has exactly four options, one
/// per label, and the answer is one of them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct McqRecord {
    question: String,
    #[serde(serialize_with = "serialize_options")]
    options: [String; OPTION_COUNT],
    answer: OptionLabel,
}

fn serialize_options<S: Serializer>(
    options: &[String; OPTION_COUNT],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let map: BTreeMap<OptionLabel, &str> = OptionLabel::ALL
        .iter()
        .map(|&label| (label, options[label.index()].as_str()))
        .collect();
    map.serialize(serializer)
}

impl McqRecord {
    /// `options` are given in label order A, B, C, D.
    pub fn new(question: impl Into<String>, options: [String; OPTION_COUNT], answer: OptionLabel) -> Self {
        Self {
            question: question.into(),
            options,
            answer,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> OptionLabel {
        self.answer
    }

    pub fn option(&self, label: OptionLabel) -> &str {
        &self.options[label.index()]
    }

    pub fn options(&self) -> impl Iterator<Item = (OptionLabel, &str)> {
        OptionLabel::ALL
            .into_iter()
            .map(move |label| (label, self.option(label)))
    }

    pub fn answer_text(&self) -> &str {
        self.option(self.answer)
    }

    pub fn is_correct(&self, choice: OptionLabel) -> bool {
        choice == self.answer
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// One block of model output that passed every format check, still in the
/// model's own label order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBlock {
    pub question: String,
    pub options: BTreeMap<OptionLabel, String>,
    pub correct: OptionLabel,
}

/// Why a block of model output was not turned into a question.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockRejection {
    #[error("block has no CORRECT: marker")]
    MissingCorrectMarker,
    #[error("nothing follows the CORRECT: marker")]
    MissingAnswerLabel,
    #[error("expected 4 options, found {0}")]
    IncompleteOptions(usize),
    #[error("answer '{0}' is not one of the parsed options")]
    DanglingAnswer(char),
}

/// Parse the text that followed one `QUESTION:` marker.
pub fn parse_block(block: &str) -> Result<ParsedBlock, BlockRejection> {
    let Some((_, after_correct)) = block.split_once(CORRECT_MARKER) else {
        return Err(BlockRejection::MissingCorrectMarker);
    };

    let trimmed = block.trim();
    let question = clean_question(trimmed.lines().next().unwrap_or(""));

    let mut options = BTreeMap::new();
    for line in trimmed.lines() {
        let line = line.trim_start();
        let mut chars = line.chars();
        if let (Some(c), Some(')')) = (chars.next(), chars.next()) {
            if let Some(label) = OptionLabel::from_char(c) {
                options.insert(label, line[2..].trim().to_string());
            }
        }
    }

    let answer_char = after_correct
        .trim_start()
        .chars()
        .next()
        .ok_or(BlockRejection::MissingAnswerLabel)?;

    if options.len() != OPTION_COUNT {
        return Err(BlockRejection::IncompleteOptions(options.len()));
    }

    let correct = OptionLabel::from_char(answer_char)
        .filter(|label| options.contains_key(label))
        .ok_or(BlockRejection::DanglingAnswer(answer_char))?;

    Ok(ParsedBlock {
        question,
        options,
        correct,
    })
}

/// Split model output on `QUESTION:` and keep every block that parses.
/// Rejected blocks are logged and dropped; the result may be shorter than asked for.
pub fn parse_mcq_blocks(output: &str) -> Vec<ParsedBlock> {
    output
        .split(QUESTION_MARKER)
        .enumerate()
        .filter_map(|(i, block)| match parse_block(block) {
            Ok(parsed) => Some(parsed),
            Err(BlockRejection::MissingCorrectMarker) => None,
            Err(reason) => {
                tracing::debug!("Dropping MCQ block {}: {}", i, reason);
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Answer-key normalization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("expected 4 options, found {0}")]
    WrongOptionCount(usize),
    #[error("correct label {0} has no option")]
    MissingCorrectOption(OptionLabel),
}

/// Shuffle the options of a parsed block into a random label order and point
/// the answer at wherever the originally correct text landed.
pub fn normalize<R: Rng + ?Sized>(block: ParsedBlock, rng: &mut R) -> Result<McqRecord, NormalizeError> {
    if block.options.len() != OPTION_COUNT {
        return Err(NormalizeError::WrongOptionCount(block.options.len()));
    }
    if !block.options.contains_key(&block.correct) {
        return Err(NormalizeError::MissingCorrectOption(block.correct));
    }

    let mut items: Vec<(OptionLabel, String)> = block.options.into_iter().collect();
    items.shuffle(rng);

    let answer_index = items
        .iter()
        .position(|(old, _)| *old == block.correct)
        .ok_or(NormalizeError::MissingCorrectOption(block.correct))?;
    let answer = OptionLabel::from_index(answer_index)
        .ok_or(NormalizeError::WrongOptionCount(items.len()))?;

    let texts: Vec<String> = items.into_iter().map(|(_, text)| text).collect();
    let options: [String; OPTION_COUNT] = texts
        .try_into()
        .map_err(|v: Vec<String>| NormalizeError::WrongOptionCount(v.len()))?;

    Ok(McqRecord::new(block.question, options, answer))
}

/// Parse model output and normalize every surviving block.
pub fn records_from_output<R: Rng + ?Sized>(output: &str, rng: &mut R) -> Vec<McqRecord> {
    parse_mcq_blocks(output)
        .into_iter()
        .filter_map(|block| match normalize(block, rng) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!("Skipping MCQ block: {}", e);
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// Build questions straight from lecture sentences. For each of the first
/// `count` sentences the sentence itself is the correct option and up to three
/// other distinct sentences are the distractors.
pub fn fallback_mcqs<R: Rng + ?Sized>(sentences: &[String], count: usize, rng: &mut R) -> Vec<McqRecord> {
    let pool: Vec<&str> = sentences
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    pool.iter()
        .take(count)
        .map(|&correct| {
            // Repeated sentences still get their own question; only the distractors must be distinct.
            let mut seen = HashSet::new();
            let others: Vec<&str> = pool
                .iter()
                .copied()
                .filter(|&s| s != correct && seen.insert(s))
                .collect();
            let mut options: Vec<String> = others
                .choose_multiple(rng, OPTION_COUNT - 1)
                .map(|s| s.to_string())
                .collect();
            while options.len() < OPTION_COUNT - 1 {
                options.push(NONE_OF_THE_ABOVE.to_string());
            }
            options.push(correct.to_string());
            options.shuffle(rng);

            let answer_index = options.iter().rposition(|o| o == correct).unwrap_or(0);
            let answer = OptionLabel::from_index(answer_index).unwrap_or(OptionLabel::A);
            let options: [String; OPTION_COUNT] = [
                options[0].clone(),
                options[1].clone(),
                options[2].clone(),
                options[3].clone(),
            ];

            McqRecord::new(clean_question(correct), options, answer)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Grading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionResult {
    pub selected: Option<OptionLabel>,
    pub correct: OptionLabel,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Score {
    pub results: Vec<QuestionResult>,
    pub correct: usize,
    pub total: usize,
}

/// Grade one answer per question; `None` means the question was skipped.
/// Missing trailing answers count as skipped.
pub fn grade(records: &[McqRecord], answers: &[Option<OptionLabel>]) -> Score {
    let results: Vec<QuestionResult> = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let selected = answers.get(i).copied().flatten();
            QuestionResult {
                selected,
                correct: record.answer(),
                is_correct: selected.is_some_and(|s| record.is_correct(s)),
            }
        })
        .collect();
    let correct = results.iter().filter(|r| r.is_correct).count();
    Score {
        total: records.len(),
        correct,
        results,
    }
}
