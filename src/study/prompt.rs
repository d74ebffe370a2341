use crate::llm::gateway::GenerationOptions;
use crate::study::mcq::{CORRECT_MARKER, QUESTION_MARKER};
use crate::study::text::excerpt;

/// Sentences of the lecture given to the concept extractor.
pub const CONCEPT_SENTENCES: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub text: String,
    pub options: GenerationOptions,
}

impl Prompt {
    fn new(text: String, options: GenerationOptions) -> Self {
        Self { text, options }
    }
}

/// Builds prompts with lecture excerpts cut to fixed character budgets.
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    passage_chars: usize,
    notes_chars: usize,
}

impl PromptBuilder {
    pub fn new(passage_chars: usize, notes_chars: usize) -> Self {
        Self {
            passage_chars,
            notes_chars,
        }
    }

    pub fn quiz_question(&self, difficulty: &str, sentence: &str) -> Prompt {
        Prompt::new(
            format!(
                "Generate a {} WHY or HOW question.\n\
                 Do NOT ask WHAT questions.\n\n\
                 Sentence:\n{}",
                difficulty.to_lowercase(),
                sentence
            ),
            GenerationOptions::sampled(80, 0.9),
        )
    }

    pub fn flashcard_question(&self, sentence: &str) -> Prompt {
        Prompt::new(
            format!(
                "Generate a short WHAT or DEFINE style flashcard question.\n\n\
                 Sentence:\n{}",
                sentence
            ),
            GenerationOptions::sampled(60, 0.6),
        )
    }

    pub fn long_answer_question(&self, difficulty: &str, idea: &str) -> Prompt {
        Prompt::new(
            format!(
                "Generate a {} long-answer exam question based on the idea below:\n\n{}",
                difficulty.to_lowercase(),
                idea
            ),
            GenerationOptions::sampled(90, 0.9),
        )
    }

    pub fn long_answer(&self, difficulty: &str, idea: &str) -> Prompt {
        Prompt::new(
            format!(
                "Write a detailed {} answer of at least six sentences \
                 explaining the idea below:\n\n{}",
                difficulty.to_lowercase(),
                idea
            ),
            GenerationOptions::sampled(400, 0.8),
        )
    }

    pub fn mcqs(&self, difficulty: &str, count: usize, lecture: &str) -> Prompt {
        Prompt::new(
            format!(
                "Generate {count} {difficulty} multiple choice questions.\n\
                 FORMAT STRICTLY:\n\
                 {q} <question>\n\
                 A) <option>\n\
                 B) <option>\n\
                 C) <option>\n\
                 D) <option>\n\
                 {c} <A/B/C/D>\n\n\
                 PASSAGE:\n{passage}",
                count = count,
                difficulty = difficulty.to_lowercase(),
                q = QUESTION_MARKER,
                c = CORRECT_MARKER,
                passage = excerpt(lecture, self.passage_chars),
            ),
            GenerationOptions::sampled(1200, 0.9),
        )
    }

    pub fn concept_notes(&self, difficulty: &str, concept: &str) -> Prompt {
        Prompt::new(
            format!(
                "Write {} revision notes in bullet points for the following concept:\n\n{}",
                difficulty.to_lowercase(),
                concept
            ),
            GenerationOptions::sampled(120, 0.6),
        )
    }

    pub fn lecture_notes(&self, lecture: &str) -> Prompt {
        Prompt::new(
            format!(
                "Generate clear, concise revision notes for a student from the following lecture:\n\n{}",
                excerpt(lecture, self.notes_chars)
            ),
            GenerationOptions::greedy(220),
        )
    }

    /// `lecture_head` should already be limited to the first few sentences.
    pub fn concepts(&self, max_concepts: usize, lecture_head: &str) -> Prompt {
        Prompt::new(
            format!(
                "Extract {} important key concepts or topics\n\
                 from the lecture content below.\n\
                 Return only the concept names as a list.\n\n\
                 LECTURE:\n{}\n\n\
                 CONCEPTS:\n",
                max_concepts, lecture_head
            ),
            GenerationOptions::greedy(120),
        )
    }

    pub fn chat(&self, transcript: &str, question: &str, vague: bool) -> Prompt {
        let lecture = excerpt(transcript, self.passage_chars);
        let text = if vague {
            format!(
                "You are an intelligent AI tutor.\n\n\
                 TASK:\n\
                 - The user asked a vague question.\n\
                 - First, identify the MOST IMPORTANT concept in the lecture.\n\
                 - Then explain that concept in SIMPLE and UNDERSTANDABLE terms.\n\
                 - Use ONLY the lecture content.\n\
                 - Do NOT say you are an AI.\n\
                 - Do NOT refuse.\n\n\
                 LECTURE:\n{}\n\n\
                 USER QUESTION:\n{}\n\n\
                 ANSWER (simple explanation):\n",
                lecture, question
            )
        } else {
            format!(
                "You are an AI study assistant.\n\n\
                 RULES:\n\
                 - Answer using ONLY the lecture content.\n\
                 - Explain in SIMPLE and CLEAR language.\n\
                 - If the answer is not found, say:\n  \
                 \"This topic is not clearly explained in the lecture.\"\n\n\
                 LECTURE:\n{}\n\n\
                 QUESTION:\n{}\n\n\
                 ANSWER:\n",
                lecture, question
            )
        };
        Prompt::new(text, GenerationOptions::sampled(220, 0.5))
    }
}
