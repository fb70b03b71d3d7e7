//! Line-oriented terminal chat against the conversation engine.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::services::conversation::ConversationEngine;

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Exit,
    Reset,
    Skip,
    Say(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let trimmed = line.trim();
    match trimmed.to_lowercase().as_str() {
        "" => Command::Skip,
        "exit" | "quit" => Command::Exit,
        "reset" => Command::Reset,
        _ => Command::Say(trimmed),
    }
}

/// Runs until `exit`, `quit` or end of input. The session starts fresh.
pub async fn run<R, W>(
    engine: &ConversationEngine,
    caller_id: &str,
    input: R,
    mut output: W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut session = engine.reset(caller_id).await?;
    let clinic = engine.profile().clinic_info.name.clone();

    output
        .write_all(format!("{clinic} front desk. Type 'reset' to start over, 'exit' to quit.\n").as_bytes())
        .await?;

    let mut lines = input.lines();
    loop {
        output
            .write_all(format!("Caller ({}): ", session.state).as_bytes())
            .await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_command(&line) {
            Command::Skip => continue,
            Command::Exit => break,
            Command::Reset => {
                session = engine.reset(caller_id).await?;
                output.write_all(b"Conversation reset.\n").await?;
            }
            Command::Say(text) => match engine.process_message(caller_id, text).await {
                Ok(turn) => {
                    session.state = turn.state;
                    output
                        .write_all(format!("{clinic}: {}\n", turn.reply).as_bytes())
                        .await?;
                }
                Err(e) => {
                    tracing::error!(phone = caller_id, error = %e, "turn failed");
                    output.write_all(format!("Error: {e}\n").as_bytes()).await?;
                }
            },
        }
    }

    output.write_all(b"Goodbye!\n").await?;
    output.flush().await?;
    Ok(())
}
