use rand::Rng;
use serde::Serialize;

use crate::config::GenerationConfig;
use crate::llm::gateway::TextGenerator;
use crate::study::chat::is_vague_question;
use crate::study::concepts::{keywords_by_frequency, parse_concept_list};
use crate::study::mcq::{fallback_mcqs, records_from_output, McqRecord};
use crate::study::prompt::{Prompt, PromptBuilder, CONCEPT_SENTENCES};
use crate::study::text::{clean_question, informative_sentences, split_sentences};

/// Lectures shorter than this (trimmed, in characters) are not summarized.
pub const MIN_NOTES_CHARS: usize = 100;
/// Pieces of the notes output this short are dropped.
const MIN_NOTE_CHARS: usize = 30;

pub const INSUFFICIENT_NOTES: &str = "Lecture content is insufficient to generate revision notes.";
pub const NOTES_UNAVAILABLE: &str = "Unable to generate revision notes at this time.";
pub const ANSWER_UNAVAILABLE: &str = "Unable to answer this question right now.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

impl QaPair {
    /// `None` unless both sides have text.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Option<Self> {
        let question = question.into().trim().to_string();
        let answer = answer.into().trim().to_string();
        if question.is_empty() || answer.is_empty() {
            None
        } else {
            Some(Self { question, answer })
        }
    }
}

pub struct StudyGenerator<'a> {
    model: &'a dyn TextGenerator,
    prompts: PromptBuilder,
    settings: GenerationConfig,
}

impl<'a> StudyGenerator<'a> {
    pub fn new(model: &'a dyn TextGenerator, settings: GenerationConfig) -> Self {
        Self {
            model,
            prompts: PromptBuilder::new(settings.passage_chars, settings.notes_chars),
            settings,
        }
    }

    pub fn settings(&self) -> &GenerationConfig {
        &self.settings
    }

    /// Run a prompt; a failed call is logged and yields `None`.
    fn call(&self, task: &str, prompt: &Prompt) -> Option<String> {
        match self.model.generate(&prompt.text, &prompt.options) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("{} generation failed on {}: {:#}", task, self.model.name(), e);
                None
            }
        }
    }

    /// One WHY/HOW question per informative sentence, without duplicates.
    pub fn quiz(&self, lecture: &str, difficulty: &str) -> Vec<String> {
        let mut questions: Vec<String> = Vec::new();
        for sentence in informative_sentences(lecture, self.settings.sentence_limit) {
            let prompt = self.prompts.quiz_question(difficulty, &sentence);
            let Some(output) = self.call("quiz", &prompt) else {
                continue;
            };
            let question = clean_question(&output);
            if !question.is_empty() && !questions.contains(&question) {
                questions.push(question);
            }
        }
        questions
    }

    /// A WHAT/DEFINE question per informative sentence, answered by the sentence.
    pub fn flashcards(&self, lecture: &str) -> Vec<QaPair> {
        informative_sentences(lecture, self.settings.sentence_limit)
            .into_iter()
            .filter_map(|sentence| {
                let prompt = self.prompts.flashcard_question(&sentence);
                let output = self.call("flashcard", &prompt)?;
                QaPair::new(clean_question(&output), sentence)
            })
            .collect()
    }

    pub fn long_answers(&self, lecture: &str, difficulty: &str, pairs: usize) -> Vec<QaPair> {
        informative_sentences(lecture, pairs)
            .into_iter()
            .filter_map(|idea| {
                let question =
                    self.call("long-answer question", &self.prompts.long_answer_question(difficulty, &idea))?;
                let answer = self.call("long answer", &self.prompts.long_answer(difficulty, &idea))?;
                QaPair::new(clean_question(&question), answer)
            })
            .collect()
    }

    /// Ask the model for `count` questions, keep the ones that parse, and fall
    /// back to sentence-built questions if none do.
    pub fn mcqs<R: Rng + ?Sized>(
        &self,
        lecture: &str,
        difficulty: &str,
        count: usize,
        rng: &mut R,
    ) -> Vec<McqRecord> {
        let prompt = self.prompts.mcqs(difficulty, count, lecture);
        let output = self.call("mcq", &prompt).unwrap_or_default();

        let mut records = records_from_output(&output, rng);
        if records.is_empty() {
            let mut sentences = informative_sentences(lecture, usize::MAX);
            if sentences.is_empty() {
                sentences = split_sentences(lecture);
            }
            tracing::info!(
                "No usable MCQs in model output, building {} from {} lecture sentences",
                count.min(sentences.len()),
                sentences.len()
            );
            records = fallback_mcqs(&sentences, count, rng);
        }
        records.truncate(count);
        records
    }

    /// Bullet-point notes for each concept.
    pub fn concept_notes(&self, concepts: &[String], difficulty: &str) -> Vec<String> {
        concepts
            .iter()
            .filter_map(|concept| {
                let output = self.call("revision notes", &self.prompts.concept_notes(difficulty, concept))?;
                let output = output.trim();
                (!output.is_empty()).then(|| output.to_string())
            })
            .collect()
    }

    /// Notes for the whole lecture, split into sentence-sized points.
    pub fn lecture_notes(&self, lecture: &str) -> Vec<String> {
        if lecture.trim().chars().count() < MIN_NOTES_CHARS {
            return vec![INSUFFICIENT_NOTES.to_string()];
        }

        let Some(output) = self.call("revision notes", &self.prompts.lecture_notes(lecture)) else {
            return vec![NOTES_UNAVAILABLE.to_string()];
        };

        let notes: Vec<String> = output
            .split(". ")
            .map(str::trim)
            .filter(|line| line.chars().count() > MIN_NOTE_CHARS)
            .map(str::to_string)
            .collect();

        if notes.is_empty() {
            vec![output]
        } else {
            notes
        }
    }

    /// Key concepts named by the model, or the most frequent keywords when the
    /// model gives nothing usable.
    pub fn concepts(&self, lecture: &str, max: usize) -> Vec<String> {
        let head = split_sentences(lecture)
            .into_iter()
            .take(CONCEPT_SENTENCES)
            .collect::<Vec<_>>()
            .join(" ");

        let concepts = self
            .call("concept", &self.prompts.concepts(max, &head))
            .map(|output| parse_concept_list(&output, max))
            .unwrap_or_default();

        if concepts.is_empty() {
            tracing::debug!("Falling back to keyword frequency for concepts");
            keywords_by_frequency(lecture, max)
        } else {
            concepts
        }
    }

    pub fn answer(&self, transcript: &str, question: &str) -> String {
        let vague = is_vague_question(question);
        let prompt = self.prompts.chat(transcript, question, vague);
        match self.call("chat", &prompt) {
            Some(answer) => answer.trim().to_string(),
            None => ANSWER_UNAVAILABLE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::gateway::GenerationOptions;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned outputs in order; `Err` entries simulate failed calls.
    struct Scripted {
        outputs: RefCell<VecDeque<Result<String, String>>>,
        prompts: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(outputs: Vec<Result<&str, &str>>) -> Self {
            Self {
                outputs: RefCell::new(
                    outputs
                        .into_iter()
                        .map(|r| r.map(String::from).map_err(String::from))
                        .collect(),
                ),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn generate(&self, prompt: &str, _options: &GenerationOptions) -> anyhow::Result<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            match self.outputs.borrow_mut().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(e)) => Err(anyhow::anyhow!(e)),
                None => Err(anyhow::anyhow!("no more scripted output")),
            }
        }
    }

    const LECTURE: &str = "Photosynthesis converts light energy into chemical energy in plants. \
        Chlorophyll absorbs mostly blue and red wavelengths of light. \
        The Calvin cycle fixes carbon dioxide into three carbon sugars. \
        Stomata open and close to regulate the exchange of gases. \
        Water is split during the light dependent reactions of photosynthesis. \
        Oxygen is released as a byproduct of splitting water molecules.";

    fn generator(model: &Scripted) -> StudyGenerator<'_> {
        StudyGenerator::new(model, GenerationConfig::default())
    }

    #[test]
    fn test_quiz_dedupes_and_skips_failures() {
        let model = Scripted::new(vec![
            Ok("Why do plants need light? Because."),
            Ok("Why do plants need light?"),
            Err("timeout"),
            Ok("   "),
            Ok("How does water get split?"),
        ]);
        let questions = generator(&model).quiz(LECTURE, "Hard");
        assert_eq!(
            questions,
            vec!["Why do plants need light?", "How does water get split?"]
        );
        assert!(model.prompts.borrow()[0].contains("hard WHY or HOW"));
    }

    #[test]
    fn test_flashcards_pair_question_with_sentence() {
        let model = Scripted::new(vec![Ok("What is photosynthesis?"), Err("down")]);
        let cards = generator(&model).flashcards(LECTURE);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].question, "What is photosynthesis?");
        assert!(cards[0].answer.starts_with("Photosynthesis converts light energy"));
    }

    #[test]
    fn test_long_answers_need_both_calls() {
        let model = Scripted::new(vec![
            Ok("Explain how photosynthesis stores energy?"),
            Ok("Plants capture light. They store it in sugar."),
            Ok("Discuss chlorophyll?"),
            Err("rate limited"),
        ]);
        let pairs = generator(&model).long_answers(LECTURE, "Medium", 2);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].question, "Explain how photosynthesis stores energy?");
        assert_eq!(pairs[0].answer, "Plants capture light. They store it in sugar.");
    }

    #[test]
    fn test_mcqs_from_model_output() {
        let model = Scripted::new(vec![Ok(
            "QUESTION: What do plants release?\nA) Oxygen\nB) Nitrogen\nC) Helium\nD) Argon\nCORRECT: A\n\
             QUESTION: What absorbs light?\nA) Chlorophyll\nB) Water\nC) Stomata\nD) Roots\nCORRECT: A",
        )]);
        let mut rng = StdRng::seed_from_u64(1);
        let records = generator(&model).mcqs(LECTURE, "Medium", 5, &mut rng);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].answer_text(), "Oxygen");
        assert_eq!(records[1].answer_text(), "Chlorophyll");
    }

    #[test]
    fn test_mcqs_truncated_to_count() {
        let block = "QUESTION: Q?\nA) a\nB) b\nC) c\nD) d\nCORRECT: D\n";
        let output = block.repeat(4);
        let model = Scripted::new(vec![Ok(output.as_str())]);
        let records = generator(&model).mcqs(LECTURE, "Medium", 3, &mut StdRng::seed_from_u64(2));
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.answer_text() == "d"));
    }

    #[test]
    fn test_mcqs_fall_back_on_garbage() {
        let model = Scripted::new(vec![Ok("I cannot do that.")]);
        let records = generator(&model).mcqs(LECTURE, "Medium", 5, &mut StdRng::seed_from_u64(3));
        assert_eq!(records.len(), 5);
        let sentences = informative_sentences(LECTURE, usize::MAX);
        for (record, sentence) in records.iter().zip(&sentences) {
            assert_eq!(record.answer_text(), sentence);
            assert!(record.options().all(|(_, t)| t != crate::study::mcq::NONE_OF_THE_ABOVE));
        }
    }

    #[test]
    fn test_mcqs_fall_back_on_model_failure() {
        let model = Scripted::new(vec![Err("connection refused")]);
        let records = generator(&model).mcqs(LECTURE, "Medium", 2, &mut StdRng::seed_from_u64(4));
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_mcqs_short_sentences_still_fall_back() {
        let model = Scripted::new(vec![Ok("")]);
        let records = generator(&model).mcqs("Cells divide. Genes mutate.", "Easy", 5, &mut StdRng::seed_from_u64(5));
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_mcqs_empty_lecture() {
        let model = Scripted::new(vec![Ok("")]);
        let records = generator(&model).mcqs("", "Easy", 5, &mut StdRng::seed_from_u64(6));
        assert!(records.is_empty());
    }

    #[test]
    fn test_lecture_notes_insufficient_input() {
        let model = Scripted::new(vec![]);
        let notes = generator(&model).lecture_notes("Too short.");
        assert_eq!(notes, vec![INSUFFICIENT_NOTES]);
        assert!(model.prompts.borrow().is_empty());
    }

    #[test]
    fn test_lecture_notes_split_into_points() {
        let model = Scripted::new(vec![Ok(
            "Photosynthesis turns light into chemical energy. Short bit. Chlorophyll absorbs red and blue light strongly",
        )]);
        let notes = generator(&model).lecture_notes(LECTURE);
        assert_eq!(
            notes,
            vec![
                "Photosynthesis turns light into chemical energy",
                "Chlorophyll absorbs red and blue light strongly"
            ]
        );
    }

    #[test]
    fn test_lecture_notes_keeps_short_output_whole() {
        let model = Scripted::new(vec![Ok("Plants. Light.")]);
        assert_eq!(generator(&model).lecture_notes(LECTURE), vec!["Plants. Light."]);
    }

    #[test]
    fn test_lecture_notes_model_failure_placeholder() {
        let model = Scripted::new(vec![Err("boom")]);
        assert_eq!(generator(&model).lecture_notes(LECTURE), vec![NOTES_UNAVAILABLE]);
    }

    #[test]
    fn test_concept_notes_skip_failures() {
        let model = Scripted::new(vec![Ok("- light\n- energy"), Err("nope"), Ok("  ")]);
        let concepts = vec!["Photosynthesis".to_string(), "Stomata".to_string(), "Water".to_string()];
        let notes = generator(&model).concept_notes(&concepts, "Easy");
        assert_eq!(notes, vec!["- light\n- energy"]);
        assert!(model.prompts.borrow()[0].contains("easy revision notes"));
    }

    #[test]
    fn test_concepts_from_model() {
        let model = Scripted::new(vec![Ok("1. Photosynthesis\n2. Calvin cycle\n3. Stomata")]);
        let concepts = generator(&model).concepts(LECTURE, 2);
        assert_eq!(concepts, vec!["Photosynthesis", "Calvin cycle"]);
    }

    #[test]
    fn test_concepts_fall_back_to_keywords() {
        let model = Scripted::new(vec![Err("offline")]);
        let concepts = generator(&model).concepts(LECTURE, 3);
        assert_eq!(concepts.len(), 3);
        assert_eq!(concepts[0], "light");
    }

    #[test]
    fn test_answer_uses_vague_template() {
        let model = Scripted::new(vec![Ok("  Plants make food from light.  ")]);
        let answer = generator(&model).answer(LECTURE, "explain it simply");
        assert_eq!(answer, "Plants make food from light.");
        assert!(model.prompts.borrow()[0].contains("vague question"));
    }

    #[test]
    fn test_answer_failure_placeholder() {
        let model = Scripted::new(vec![Err("503")]);
        assert_eq!(generator(&model).answer(LECTURE, "What is chlorophyll?"), ANSWER_UNAVAILABLE);
    }

    #[test]
    fn test_qa_pair_requires_text() {
        assert!(QaPair::new("", "answer").is_none());
        assert!(QaPair::new("question", "  ").is_none());
        assert!(QaPair::new(" q ", " a ").is_some());
    }
}
