use std::io;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use lecturenotes::cli::{Cli, Commands};
use lecturenotes::commands::{self, StudyContext};
use lecturenotes::config::Config;
use lecturenotes::llm::client::LlmClient;
use lecturenotes::session::Session;
use lecturenotes::study::generate::StudyGenerator;
use lecturenotes::transcribe::runner::load_lecture;

fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lecturenotes=info".parse()?),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitConfig { force } => {
            let path = commands::init_config(cli.config.as_deref(), force)?;
            println!("Wrote default config to {}", path.display());
            Ok(())
        }
        Commands::Transcribe { audio, output, backend } => {
            let config = load_config(cli.config.as_deref(), cli.difficulty, cli.seed)?;
            let path = commands::transcribe(&config, &audio, output.as_deref(), backend.as_deref())?;
            println!("Transcript saved to {}", path.display());
            Ok(())
        }
        command => {
            let config = load_config(cli.config.as_deref(), cli.difficulty, cli.seed)?;
            run_study(&config, cli.json, command)
        }
    }
}

/// Load the config file and apply the command-line overrides.
fn load_config(path: Option<&Path>, difficulty: Option<String>, seed: Option<u64>) -> Result<Config> {
    let mut config = Config::load(path)?;
    if let Some(difficulty) = difficulty {
        config.generation.difficulty = difficulty;
    }
    if seed.is_some() {
        config.generation.seed = seed;
    }
    Ok(config)
}

fn run_study(config: &Config, json: bool, command: Commands) -> Result<()> {
    let input = command
        .input()
        .ok_or_else(|| anyhow::anyhow!("Command does not take a lecture input"))?;
    let transcript = load_lecture(config, input, None)?;
    if transcript.is_empty() {
        anyhow::bail!("Lecture {} contains no text", input.display());
    }

    let model = LlmClient::from_config(&config.llm)?;
    let mut session = Session::new(config.generation.seed);
    session.load_transcript(transcript);
    let generator = StudyGenerator::new(&model, config.generation.clone());
    let mut study = StudyContext::new(session, generator, json);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match command {
        Commands::Quiz { .. } => study.quiz(&mut out),
        Commands::Flashcards { .. } => study.flashcards(&mut out),
        Commands::Long { pairs, .. } => study.long_answers(&mut out, pairs),
        Commands::Mcq { count, interactive, .. } => {
            let mut stdin = io::stdin().lock();
            study.mcqs(&mut out, count, interactive.then_some(&mut stdin))
        }
        Commands::Notes { per_concept, .. } => study.notes(&mut out, per_concept),
        Commands::Concepts { max, .. } => study.concepts(&mut out, max),
        Commands::Ask { question, .. } => study.ask(&mut out, &question),
        Commands::Chat { .. } => study.chat(&mut io::stdin().lock(), &mut out),
        other => anyhow::bail!("{:?} does not study a lecture", other),
    }
}
