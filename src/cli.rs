use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "lecturenotes",
    version,
    about = "Turn lecture recordings into quizzes, MCQs, flashcards and revision notes"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Difficulty label passed to the model (e.g. Easy, Medium, Hard)
    #[arg(short, long, global = true)]
    pub difficulty: Option<String>,

    /// Seed for option shuffling, for reproducible MCQ sets
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe an audio file and save the transcript as JSON
    Transcribe {
        /// Audio file (wav, mp3, m4a, flac, ogg)
        audio: PathBuf,

        /// Where to write the transcript (defaults to <AUDIO>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Force a specific backend (azure or local)
        #[arg(long)]
        backend: Option<String>,
    },

    /// Short WHY/HOW quiz questions
    Quiz {
        /// Audio file, transcript JSON or plain text
        input: PathBuf,
    },

    /// WHAT/DEFINE flashcards
    Flashcards {
        /// Audio file, transcript JSON or plain text
        input: PathBuf,
    },

    /// Long-answer question and answer pairs
    Long {
        /// Audio file, transcript JSON or plain text
        input: PathBuf,

        /// Number of pairs to generate
        #[arg(long)]
        pairs: Option<usize>,
    },

    /// Multiple-choice questions
    Mcq {
        /// Audio file, transcript JSON or plain text
        input: PathBuf,

        /// Number of questions
        #[arg(long)]
        count: Option<usize>,

        /// Answer the questions in the terminal and get a score
        #[arg(short, long)]
        interactive: bool,
    },

    /// Revision notes for the lecture
    Notes {
        /// Audio file, transcript JSON or plain text
        input: PathBuf,

        /// Extract key concepts first and write notes for each
        #[arg(long)]
        per_concept: bool,
    },

    /// Key concepts covered in the lecture
    Concepts {
        /// Audio file, transcript JSON or plain text
        input: PathBuf,

        /// Maximum number of concepts
        #[arg(long)]
        max: Option<usize>,
    },

    /// Ask one question about the lecture
    Ask {
        /// Audio file, transcript JSON or plain text
        input: PathBuf,

        question: String,
    },

    /// Chat about the lecture interactively
    Chat {
        /// Audio file, transcript JSON or plain text
        input: PathBuf,
    },

    /// Write a commented default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Commands {
    /// The lecture input for commands that study one.
    pub fn input(&self) -> Option<&Path> {
        match self {
            Self::Quiz { input }
            | Self::Flashcards { input }
            | Self::Long { input, .. }
            | Self::Mcq { input, .. }
            | Self::Notes { input, .. }
            | Self::Concepts { input, .. }
            | Self::Ask { input, .. }
            | Self::Chat { input } => Some(input),
            Self::Transcribe { .. } | Self::InitConfig { .. } => None,
        }
    }
}
