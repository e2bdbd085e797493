// Interactive chat loop
//
// Reads one query per line from stdin, answers through the assistant and
// prints the route that was chosen.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::commands::{handle_command, Command};
use crate::assistant::Assistant;

pub async fn run_chat(assistant: &Assistant, show_route: bool) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(b"Ask me anything about products, orders, or just chat! (/help for commands)\n")
        .await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };

        if let Some(command) = Command::parse(&line) {
            let output = handle_command(&command, assistant.router()).await?;
            stdout.write_all(format!("{}\n", output).as_bytes()).await?;
            if command == Command::Quit {
                break;
            }
            continue;
        }

        let reply = assistant.respond(&line).await;
        if let (true, Some(decision)) = (show_route, &reply.decision) {
            let score = decision
                .score
                .map(|s| format!(" {:.3}", s))
                .unwrap_or_default();
            stdout
                .write_all(
                    format!("[{} via {}{}]\n", decision.route, decision.method.as_str(), score)
                        .as_bytes(),
                )
                .await?;
        }
        stdout.write_all(format!("{}\n", reply.text).as_bytes()).await?;
    }

    Ok(())
}
