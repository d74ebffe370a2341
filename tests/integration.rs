use std::cell::RefCell;
use std::collections::VecDeque;

use lecturenotes::config::GenerationConfig;
use lecturenotes::llm::gateway::{GenerationOptions, TextGenerator};
use lecturenotes::session::{Section, Session};
use lecturenotes::study::generate::StudyGenerator;
use lecturenotes::study::mcq::{OptionLabel, NONE_OF_THE_ABOVE};
use lecturenotes::transcribe::backend::{Segment, Transcript};
use lecturenotes::transcribe::runner::{load_lecture, save_transcript};
use tempfile::TempDir;

/// Replies in order; once the script runs out every call fails.
struct Scripted {
    replies: RefCell<VecDeque<&'static str>>,
    prompts: RefCell<Vec<String>>,
}

impl Scripted {
    fn new(replies: &[&'static str]) -> Self {
        Self {
            replies: RefCell::new(replies.iter().copied().collect()),
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
        self.replies
            .borrow_mut()
            .pop_front()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("model unavailable"))
    }
}

fn lecture_transcript() -> Transcript {
    Transcript::new(
        "thermo.wav",
        vec![
            Segment {
                text: "The first law of thermodynamics states that energy is conserved.".into(),
                start: Some(0.0),
                end: Some(4.2),
            },
            Segment {
                text: " Entropy of an isolated system never decreases over time. ".into(),
                start: Some(4.2),
                end: Some(8.0),
            },
            Segment {
                text: "Heat flows spontaneously from hotter bodies to colder bodies.".into(),
                start: Some(8.0),
                end: Some(12.5),
            },
        ],
    )
}

#[test]
fn test_transcript_round_trips_through_disk_and_drives_mcqs() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("out").join("thermo.json");
    save_transcript(&lecture_transcript(), &path).unwrap();

    let config = lecturenotes::config::Config::default();
    let loaded = load_lecture(&config, &path, None).unwrap();
    assert_eq!(loaded, lecture_transcript());
    assert_eq!(loaded.duration_secs(), Some(12.5));

    let model = Scripted::new(&[
        "QUESTION: What is conserved according to the first law?\n\
         A) Entropy\nB) Energy\nC) Temperature\nD) Pressure\nCORRECT: B\n\n\
         QUESTION: Broken block\nA) one\nB) two\nCORRECT: A",
    ]);
    let generator = StudyGenerator::new(&model, GenerationConfig::default());
    let mut session = Session::new(Some(42));
    session.load_transcript(loaded);

    let records = session.mcqs(&generator, "Hard", 5).unwrap().to_vec();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.answer_text(), "Energy");
    let mut texts: Vec<&str> = record.options().map(|(_, t)| t).collect();
    texts.sort();
    assert_eq!(texts, vec!["Energy", "Entropy", "Pressure", "Temperature"]);

    let prompts = model.prompts.borrow();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("5 hard multiple choice questions"));
    assert!(prompts[0].contains("Entropy of an isolated system never decreases over time."));
    drop(prompts);

    let score = session.grade(&[Some(record.answer())]).unwrap();
    assert_eq!((score.correct, score.total), (1, 1));
}

#[test]
fn test_unusable_model_output_falls_back_to_sentences() {
    let model = Scripted::new(&["I'm sorry, I cannot produce questions."]);
    let generator = StudyGenerator::new(&model, GenerationConfig::default());
    let mut session = Session::new(Some(7));
    session.load_transcript(lecture_transcript());

    let records = session.mcqs(&generator, "Medium", 5).unwrap().to_vec();
    // three informative sentences, so at most three questions
    assert_eq!(records.len(), 3);
    for record in &records {
        let correct = record.answer_text();
        assert!(record.question().contains(correct));
        let padded = record
            .options()
            .filter(|(_, text)| *text == NONE_OF_THE_ABOVE)
            .count();
        assert_eq!(padded, 1);
    }
}

#[test]
fn test_plain_text_lecture_full_session() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("notes.txt");
    std::fs::write(
        &path,
        "Mitochondria produce most of the chemical energy that powers the cell. \
         Ribosomes translate messenger RNA into chains of amino acids. \
         The nucleus stores the genetic material of eukaryotic cells.",
    )
    .unwrap();

    let config = lecturenotes::config::Config::default();
    let transcript = load_lecture(&config, &path, None).unwrap();
    assert_eq!(transcript.segments.len(), 1);

    let model = Scripted::new(&[
        "Why do cells need mitochondria?",
        "How do ribosomes build proteins?",
        "Why do cells need mitochondria?",
        "1. Mitochondria\n2. Ribosomes",
        "It is the site of protein synthesis.",
    ]);
    let generator = StudyGenerator::new(&model, GenerationConfig::default());
    let mut session = Session::new(None);
    session.load_transcript(transcript);

    let quiz = generator.quiz(session.lecture().unwrap(), "Easy");
    session.record_section(Section::Quiz);
    assert_eq!(
        quiz,
        vec!["Why do cells need mitochondria?", "How do ribosomes build proteins?"]
    );

    let concepts = generator.concepts(session.lecture().unwrap(), 5);
    session.record_section(Section::Concepts);
    assert_eq!(concepts, vec!["Mitochondria", "Ribosomes"]);

    let turn = session
        .ask(&generator, "What do ribosomes do?")
        .unwrap()
        .unwrap()
        .clone();
    assert_eq!(turn.answer, "It is the site of protein synthesis.");

    // script exhausted: the model is now down
    let notes = generator.lecture_notes(session.lecture().unwrap());
    assert_eq!(
        notes,
        vec![lecturenotes::study::generate::NOTES_UNAVAILABLE.to_string()]
    );

    assert_eq!(session.history(), &[Section::Quiz, Section::Concepts]);
    assert_eq!(session.chat_history().count(), 1);
}

#[test]
fn test_skipped_answers_score_zero() {
    let model = Scripted::new(&[
        "QUESTION: Pick B\nA) a\nB) b\nC) c\nD) d\nCORRECT: B\n\
         QUESTION: Pick C\nA) a\nB) b\nC) c\nD) d\nCORRECT: C",
    ]);
    let generator = StudyGenerator::new(&model, GenerationConfig::default());
    let mut session = Session::new(Some(1));
    session.load_transcript(lecture_transcript());
    let records = session.mcqs(&generator, "Medium", 2).unwrap().to_vec();
    assert_eq!(records.len(), 2);

    let wrong = OptionLabel::ALL
        .into_iter()
        .find(|l| *l != records[0].answer())
        .unwrap();
    let score = session.grade(&[Some(wrong)]).unwrap();
    assert_eq!(score.correct, 0);
    assert_eq!(score.total, 2);
    assert_eq!(score.results[1].selected, None);
}
