// SPDX-License-Identifier: MIT

//! Interactive read loop around a [`Runner`]

use crate::adk::error::Result;
use crate::adk::runner::{final_responses, Runner};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

fn is_quit(line: &str) -> bool {
    matches!(line.to_lowercase().as_str(), "quit" | "exit" | "q")
}

/// Prompt with `You: ` until the input ends or the user quits. Failures
/// of a single run are printed and the loop keeps going.
pub async fn run_console<R, W>(
    runner: &Runner,
    user_id: &str,
    session_id: &str,
    input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "{} started. Type 'quit' or 'exit' to leave.\n", runner.agent().name())?;
    let mut lines = input.lines();

    loop {
        write!(out, "You: ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        let line = line.trim();

        if is_quit(line) {
            writeln!(out, "\nGoodbye!")?;
            break;
        }
        if line.is_empty() {
            continue;
        }

        writeln!(out, "\nProcessing...\n")?;
        match runner.run(user_id, session_id, line).await {
            Ok(events) => {
                let responses = final_responses(&events);
                if responses.is_empty() {
                    writeln!(out, "Agent: (no final response)\n")?;
                }
                for text in responses {
                    writeln!(out, "Agent: {}\n", text)?;
                }
            }
            Err(e) => {
                log::error!("Run failed: {}", e);
                writeln!(out, "\nError: {}\n", e)?;
            }
        }
    }
    Ok(())
}
