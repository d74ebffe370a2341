use anyhow::Result;
use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::study::chat::ChatTurn;
use crate::study::generate::StudyGenerator;
use crate::study::mcq::{self, McqRecord, OptionLabel, Score};
use crate::transcribe::backend::Transcript;

/// Study views produced during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Quiz,
    Mcqs,
    Flashcards,
    LongAnswers,
    RevisionNotes,
    Concepts,
    Chatbot,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quiz => write!(f, "Quiz"),
            Self::Mcqs => write!(f, "MCQs"),
            Self::Flashcards => write!(f, "Flashcards"),
            Self::LongAnswers => write!(f, "Long Answers"),
            Self::RevisionNotes => write!(f, "Revision Notes"),
            Self::Concepts => write!(f, "Concepts"),
            Self::Chatbot => write!(f, "Chatbot"),
        }
    }
}

/// In-memory state for one user working through one lecture at a time.
/// Loading a new transcript drops everything derived from the old one.
pub struct Session {
    started_at: DateTime<Local>,
    transcript: Option<Transcript>,
    lecture_text: String,
    mcqs: Option<Vec<McqRecord>>,
    chat_history: Vec<ChatTurn>,
    history: Vec<Section>,
    rng: StdRng,
}

impl Session {
    /// `seed` fixes the option shuffling; `None` draws a fresh seed.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            started_at: Local::now(),
            transcript: None,
            lecture_text: String::new(),
            mcqs: None,
            chat_history: Vec::new(),
            history: Vec::new(),
            rng,
        }
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn load_transcript(&mut self, transcript: Transcript) {
        tracing::info!(
            "Loaded transcript from {} ({} segments)",
            transcript.source,
            transcript.segments.len()
        );
        self.lecture_text = transcript.text();
        self.transcript = Some(transcript);
        self.mcqs = None;
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        self.transcript.as_ref()
    }

    /// Joined lecture text, or an error if nothing is loaded yet.
    pub fn lecture(&self) -> Result<&str> {
        match self.transcript {
            Some(_) => Ok(&self.lecture_text),
            None => anyhow::bail!("No lecture loaded. Transcribe or open a lecture first"),
        }
    }

    /// The session's MCQ set, generated on first request and reused after.
    pub fn mcqs(
        &mut self,
        generator: &StudyGenerator<'_>,
        difficulty: &str,
        count: usize,
    ) -> Result<&[McqRecord]> {
        if self.mcqs.is_none() {
            self.lecture()?;
            let records = generator.mcqs(&self.lecture_text, difficulty, count, &mut self.rng);
            self.mcqs = Some(records);
        }
        Ok(self.mcqs.as_deref().unwrap_or_default())
    }

    pub fn cached_mcqs(&self) -> Option<&[McqRecord]> {
        self.mcqs.as_deref()
    }

    /// Grade answers against the cached MCQ set.
    pub fn grade(&self, answers: &[Option<OptionLabel>]) -> Result<Score> {
        let records = self
            .mcqs
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No MCQs generated for this lecture yet"))?;
        Ok(mcq::grade(records, answers))
    }

    /// Ask the chatbot. Blank questions are ignored and return `None`.
    pub fn ask(&mut self, generator: &StudyGenerator<'_>, question: &str) -> Result<Option<&ChatTurn>> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(None);
        }
        let answer = generator.answer(self.lecture()?, question);
        self.chat_history.push(ChatTurn {
            question: question.to_string(),
            answer,
        });
        Ok(self.chat_history.last())
    }

    /// Chat turns, newest first.
    pub fn chat_history(&self) -> impl Iterator<Item = &ChatTurn> {
        self.chat_history.iter().rev()
    }

    pub fn clear_chat(&mut self) {
        self.chat_history.clear();
    }

    pub fn record_section(&mut self, section: Section) {
        self.history.push(section);
    }

    pub fn history(&self) -> &[Section] {
        &self.history
    }
}
