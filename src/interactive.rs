use std::io::{BufRead, Write};

use anyhow::Result;

use crate::session::Session;
use crate::study::generate::StudyGenerator;
use crate::study::mcq::{McqRecord, OptionLabel, Score};

/// Print `label`, read one trimmed line. `None` at end of input.
pub fn prompt_input<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> Result<Option<String>> {
    write!(output, "{label}: ")?;
    output.flush()?;

    let mut buf = String::new();
    if input.read_line(&mut buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(buf.trim().to_string()))
}

/// Keep asking until the user types a label A-D or an empty line (skip).
/// End of input also counts as a skip.
pub fn prompt_label<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Option<OptionLabel>> {
    loop {
        let Some(line) = prompt_input(input, output, "  Choose one (A-D, Enter to skip)")? else {
            return Ok(None);
        };
        if line.is_empty() {
            return Ok(None);
        }
        match line.parse::<OptionLabel>() {
            Ok(label) => return Ok(Some(label)),
            Err(_) => writeln!(output, "  Please answer A, B, C or D.")?,
        }
    }
}

pub fn render_mcq(number: usize, record: &McqRecord) -> String {
    let mut lines = vec![format!("Q{}. {}", number, record.question())];
    for (label, text) in record.options() {
        lines.push(format!("  {}. {}", label, text));
    }
    lines.join("\n")
}

pub fn render_score(score: &Score) -> String {
    let mut lines: Vec<String> = score
        .results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            if r.is_correct {
                format!("Q{}: ✔ Correct", i + 1)
            } else {
                format!("Q{}: ✘ Correct answer is {}", i + 1, r.correct)
            }
        })
        .collect();
    lines.push(format!("Final Score: {} / {}", score.correct, score.total));
    lines.join("\n")
}

/// Ask every question in turn and collect the answers.
pub fn take_mcq_quiz<R: BufRead, W: Write>(
    records: &[McqRecord],
    input: &mut R,
    output: &mut W,
) -> Result<Vec<Option<OptionLabel>>> {
    let mut answers = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        writeln!(output, "\n{}", render_mcq(i + 1, record))?;
        answers.push(prompt_label(input, output)?);
    }
    Ok(answers)
}

/// Question-and-answer loop over the loaded lecture.
/// `:history` lists earlier turns (newest first), `:clear` forgets them, `:quit` leaves.
pub fn chat_loop<R: BufRead, W: Write>(
    session: &mut Session,
    generator: &StudyGenerator<'_>,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    writeln!(
        output,
        "Session started {}. Ask a question from the lecture (:history, :clear, :quit)",
        session.started_at().format("%H:%M")
    )?;
    while let Some(line) = prompt_input(input, output, "You")? {
        match line.as_str() {
            ":quit" | ":q" => break,
            ":clear" => {
                session.clear_chat();
                writeln!(output, "Chat cleared.")?;
            }
            ":history" => {
                for turn in session.chat_history() {
                    writeln!(output, "You: {}\nAI: {}\n---", turn.question, turn.answer)?;
                }
            }
            question => {
                if let Some(turn) = session.ask(generator, question)? {
                    writeln!(output, "AI: {}", turn.answer)?;
                }
            }
        }
    }
    Ok(())
}
