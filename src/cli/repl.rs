//! Interactive terminal chat.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::agent::ConversationAgent;
use crate::error::Result;
use crate::types::TurnRole;

const HELP: &str = "Commands: /clear (forget the conversation), /history, /quit";

/// Read lines from `input` and chat until EOF or `/quit`.
///
/// Streamed chunks and usage captions go to `out`.
pub async fn run<R, W>(
    agent: &mut ConversationAgent,
    system_prompt: Option<&str>,
    stream: bool,
    input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send,
{
    writeln!(out, "Chatting with {}. {HELP}", agent.model_id())?;
    let mut lines = input.lines();

    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => writeln!(out, "{HELP}")?,
            "/clear" => {
                agent.clear();
                writeln!(out, "Conversation cleared.")?;
            }
            "/history" => {
                if agent.is_empty() {
                    writeln!(out, "(no history)")?;
                }
                for turn in agent.history() {
                    let who = match turn.role() {
                        TurnRole::User => "you",
                        TurnRole::Assistant => "gemini",
                    };
                    writeln!(out, "[{who}] {}", turn.content())?;
                }
            }
            message => {
                let reply = if stream {
                    let reply = agent
                        .send_streaming(message, system_prompt, |chunk| {
                            let _ = write!(out, "{chunk}");
                            let _ = out.flush();
                        })
                        .await;
                    if reply.is_error() {
                        writeln!(out, "{}", reply.text)?;
                    } else {
                        writeln!(out)?;
                    }
                    reply
                } else {
                    let reply = agent.send(message, system_prompt).await;
                    writeln!(out, "{}", reply.text)?;
                    reply
                };
                if let Some(usage) = reply.usage {
                    writeln!(out, "  ({usage})")?;
                }
            }
        }
    }

    Ok(())
}
