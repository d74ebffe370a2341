use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::Config;
use crate::interactive;
use crate::session::{Section, Session};
use crate::study::generate::StudyGenerator;
use crate::transcribe::runner::{build_backend, save_transcript, transcribe_file};

/// Write the commented default config to `path`, or the platform config path.
pub fn init_config(path: Option<&Path>, force: bool) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => Config::platform_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, Config::generate_default_commented())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Transcribe one audio file and save it next to the audio unless `output` is given.
pub fn transcribe(
    config: &Config,
    audio: &Path,
    output: Option<&Path>,
    backend_override: Option<&str>,
) -> Result<PathBuf> {
    let backend = build_backend(config, backend_override)?;
    let transcript = transcribe_file(backend.as_ref(), audio)?;
    if transcript.is_empty() {
        tracing::warn!("No speech recognized in {}", audio.display());
    }

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| audio.with_extension("json"));
    save_transcript(&transcript, &path)?;
    Ok(path)
}

fn emit<W: Write, T: Serialize + ?Sized>(
    out: &mut W,
    json: bool,
    value: &T,
    text: impl FnOnce() -> String,
) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    } else {
        writeln!(out, "{}", text())?;
    }
    Ok(())
}

fn numbered<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn bulleted<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    items
        .into_iter()
        .map(|item| format!("• {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One lecture loaded into a session, plus the output settings of this run.
pub struct StudyContext<'a> {
    pub session: Session,
    generator: StudyGenerator<'a>,
    difficulty: String,
    json: bool,
}

impl<'a> StudyContext<'a> {
    pub fn new(session: Session, generator: StudyGenerator<'a>, json: bool) -> Self {
        let difficulty = generator.settings().difficulty.clone();
        Self {
            session,
            generator,
            difficulty,
            json,
        }
    }

    pub fn quiz<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let questions = self.generator.quiz(self.session.lecture()?, &self.difficulty);
        self.session.record_section(Section::Quiz);
        emit(out, self.json, &questions, || {
            if questions.is_empty() {
                "No quiz questions could be generated from this lecture.".to_string()
            } else {
                numbered(questions.iter().map(String::as_str))
            }
        })
    }

    pub fn flashcards<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let cards = self.generator.flashcards(self.session.lecture()?);
        self.session.record_section(Section::Flashcards);
        emit(out, self.json, &cards, || {
            if cards.is_empty() {
                return "No flashcards could be generated from this lecture.".to_string();
            }
            cards
                .iter()
                .map(|c| format!("Q: {}\nA: {}", c.question, c.answer))
                .collect::<Vec<_>>()
                .join("\n\n")
        })
    }

    pub fn long_answers<W: Write>(&mut self, out: &mut W, pairs: Option<usize>) -> Result<()> {
        let pairs = pairs.unwrap_or(self.generator.settings().long_answer_pairs);
        let answers = self
            .generator
            .long_answers(self.session.lecture()?, &self.difficulty, pairs);
        self.session.record_section(Section::LongAnswers);
        emit(out, self.json, &answers, || {
            if answers.is_empty() {
                return "No long-answer questions could be generated from this lecture.".to_string();
            }
            answers
                .iter()
                .enumerate()
                .map(|(i, qa)| format!("Q{}. {}\n{}", i + 1, qa.question, qa.answer))
                .collect::<Vec<_>>()
                .join("\n\n")
        })
    }

    /// Print the MCQ set with its answer key, or with `input` set, ask each
    /// question and print the score.
    pub fn mcqs<R: BufRead, W: Write>(
        &mut self,
        out: &mut W,
        count: Option<usize>,
        input: Option<&mut R>,
    ) -> Result<()> {
        let count = count.unwrap_or(self.generator.settings().mcq_count);
        let records = self
            .session
            .mcqs(&self.generator, &self.difficulty, count)?
            .to_vec();
        self.session.record_section(Section::Mcqs);

        let Some(input) = input else {
            return emit(out, self.json, &records, || {
                if records.is_empty() {
                    return "No MCQs could be generated from this lecture.".to_string();
                }
                records
                    .iter()
                    .enumerate()
                    .map(|(i, r)| format!("{}\n  Answer: {}", interactive::render_mcq(i + 1, r), r.answer()))
                    .collect::<Vec<_>>()
                    .join("\n\n")
            });
        };

        if records.is_empty() {
            writeln!(out, "No MCQs could be generated from this lecture.")?;
            return Ok(());
        }
        let answers = interactive::take_mcq_quiz(&records, input, out)?;
        let score = self.session.grade(&answers)?;
        emit(out, self.json, &score, || format!("\n{}", interactive::render_score(&score)))
    }

    pub fn notes<W: Write>(&mut self, out: &mut W, per_concept: bool) -> Result<()> {
        let lecture = self.session.lecture()?;
        if !per_concept {
            let notes = self.generator.lecture_notes(lecture);
            self.session.record_section(Section::RevisionNotes);
            return emit(out, self.json, &notes, || bulleted(notes.iter().map(String::as_str)));
        }

        let max = self.generator.settings().max_concepts;
        let concepts = self.generator.concepts(lecture, max);
        let notes = self.generator.concept_notes(&concepts, &self.difficulty);
        self.session.record_section(Section::Concepts);
        self.session.record_section(Section::RevisionNotes);

        let value = serde_json::json!({ "concepts": concepts, "notes": notes });
        emit(out, self.json, &value, || {
            let mut text = format!("Key concepts:\n{}", bulleted(concepts.iter().map(String::as_str)));
            if !notes.is_empty() {
                text.push_str("\n\n");
                text.push_str(&notes.join("\n\n"));
            }
            text
        })
    }

    pub fn concepts<W: Write>(&mut self, out: &mut W, max: Option<usize>) -> Result<()> {
        let max = max.unwrap_or(self.generator.settings().max_concepts);
        let concepts = self.generator.concepts(self.session.lecture()?, max);
        self.session.record_section(Section::Concepts);
        emit(out, self.json, &concepts, || {
            if concepts.is_empty() {
                "No key concepts found in this lecture.".to_string()
            } else {
                bulleted(concepts.iter().map(String::as_str))
            }
        })
    }

    pub fn ask<W: Write>(&mut self, out: &mut W, question: &str) -> Result<()> {
        self.session.record_section(Section::Chatbot);
        let json = self.json;
        match self.session.ask(&self.generator, question)? {
            Some(turn) => emit(out, json, turn, || turn.answer.clone()),
            None => anyhow::bail!("Question is empty"),
        }
    }

    pub fn chat<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> Result<()> {
        self.session.record_section(Section::Chatbot);
        interactive::chat_loop(&mut self.session, &self.generator, input, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::llm::gateway::{GenerationOptions, TextGenerator};
    use crate::transcribe::backend::Transcript;
    use std::io::Cursor;
    use tempfile::TempDir;

    struct Fixed(&'static str);

    impl TextGenerator for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    impl TextGenerator for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> Result<String> {
            anyhow::bail!("connection refused")
        }
    }

    const LECTURE: &str = "Photosynthesis converts light energy into chemical energy inside plant cells. \
        Chlorophyll absorbs mostly blue and red light from the visible spectrum. \
        The Calvin cycle fixes carbon dioxide into sugars using ATP and NADPH. \
        Stomata regulate how much water vapour leaves the leaf during the day.";

    fn context(model: &dyn TextGenerator, json: bool) -> StudyContext<'_> {
        let mut session = Session::new(Some(3));
        session.load_transcript(Transcript::from_text("lecture.txt", LECTURE));
        StudyContext::new(session, StudyGenerator::new(model, GenerationConfig::default()), json)
    }

    fn printed(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_init_config_refuses_overwrite() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("lecturenotes.toml");

        let written = init_config(Some(&path), false).unwrap();
        assert_eq!(written, path);
        let parsed = Config::load(Some(&path)).unwrap();
        assert_eq!(parsed.generation.mcq_count, 5);

        assert!(init_config(Some(&path), false).is_err());
        assert!(init_config(Some(&path), true).is_ok());
    }

    #[test]
    fn test_mcq_fallback_printed_with_answer_key() {
        let model = Failing;
        let mut ctx = context(&model, false);
        let mut out = Vec::new();
        ctx.mcqs::<Cursor<&[u8]>, _>(&mut out, Some(2), None).unwrap();

        let text = printed(out);
        assert!(text.starts_with("Q1. "));
        assert!(text.contains("Q2. "));
        assert!(!text.contains("Q3. "));
        assert_eq!(text.matches("Answer: ").count(), 2);
        assert_eq!(ctx.session.history(), &[Section::Mcqs]);
    }

    #[test]
    fn test_mcq_interactive_prints_score() {
        let model = Fixed("QUESTION: Why?\nA) x\nB) y\nC) z\nD) w\nCORRECT: B");
        let mut ctx = context(&model, false);
        let mut out = Vec::new();
        let mut input = Cursor::new("\n".as_bytes());
        ctx.mcqs(&mut out, Some(1), Some(&mut input)).unwrap();

        let text = printed(out);
        assert!(text.contains("Correct answer is"));
        assert!(text.contains("Final Score: 0 / 1"));
    }

    #[test]
    fn test_quiz_json_output() {
        let model = Fixed("Why does chlorophyll absorb red light? Options: none");
        let mut ctx = context(&model, true);
        let mut out = Vec::new();
        ctx.quiz(&mut out).unwrap();

        let questions: Vec<String> = serde_json::from_str(&printed(out)).unwrap();
        assert_eq!(questions, vec!["Why does chlorophyll absorb red light?"]);
    }

    #[test]
    fn test_ask_failure_prints_placeholder() {
        let model = Failing;
        let mut ctx = context(&model, false);
        let mut out = Vec::new();
        ctx.ask(&mut out, "What is photosynthesis?").unwrap();
        assert_eq!(
            printed(out).trim(),
            crate::study::generate::ANSWER_UNAVAILABLE
        );
        assert!(ctx.ask(&mut Vec::new(), "  ").is_err());
    }

    #[test]
    fn test_chat_commands() {
        let model = Fixed("Plants make sugar from light.");
        let mut ctx = context(&model, false);
        let mut input = Cursor::new("What is it about?\n:history\n:clear\n:history\n:quit\nignored\n");
        let mut out = Vec::new();
        ctx.chat(&mut input, &mut out).unwrap();

        let text = printed(out);
        assert_eq!(text.matches("AI: Plants make sugar from light.").count(), 2);
        assert!(text.contains("Chat cleared."));
        assert_eq!(ctx.session.chat_history().count(), 0);
    }

    #[test]
    fn test_notes_without_lecture_fails() {
        let model = Failing;
        let generator = StudyGenerator::new(&model, GenerationConfig::default());
        let mut ctx = StudyContext::new(Session::new(None), generator, false);
        assert!(ctx.notes(&mut Vec::new(), false).is_err());
    }
}
