//! Terminal front end: reads user lines from stdin and relays streamed
//! replies to stdout.
//!
//! Commands: `/models`, `/model <name>`, `/history`, `/reset`, `/quit`.
//! Ctrl-C during a reply abandons that turn and returns to the prompt;
//! Ctrl-C at the prompt exits.

use std::future::Future;
use std::io::Write;

use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use localai_desktop::config::load_or_default;
use localai_desktop::{init_tracing, App};

/// The terminal is a single user, so a single session.
const SESSION_ID: &str = "terminal";

/// Messages shown by `/history`.
const HISTORY_LEN: usize = 10;

#[tokio::main]
async fn main() -> Result<()> {
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let (config, config_path) = load_or_default(&cwd).context("failed to load configuration")?;
    let log_path = init_tracing(&config.logging).context("failed to initialize logging")?;
    tracing::info!(config_file = ?config_path, "configuration loaded");

    let app = App::new(config).context("failed to build the model client")?;
    let mut model = app.config.backend.default_model.clone();

    println!("localai-desktop {}", env!("CARGO_PKG_VERSION"));
    println!("backend: {}  model: {model}", app.client.base_url());
    println!("log: {}", log_path.display());
    if !app.client.health_check().await {
        println!("warning: the model backend is not reachable; is `ollama serve` running?");
    }
    println!("type /quit to exit, /models to list models\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        // The first turn installs a SIGINT handler, so Ctrl-C at the prompt
        // must be watched here too
        let Some(line) = next_input(&mut lines, tokio::signal::ctrl_c()).await? else {
            println!();
            break;
        };
        let input = line.trim();

        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                app.sessions.reset(SESSION_ID).await;
                println!("conversation cleared");
            }
            "/models" => match app.client.list_models().await {
                Ok(models) if models.is_empty() => println!("no models installed"),
                Ok(models) => {
                    for name in models {
                        let marker = if name == model { "*" } else { " " };
                        println!("{marker} {name}");
                    }
                }
                Err(e) => println!("{}", e.user_message()),
            },
            "/history" => {
                for msg in app.sessions.recent(SESSION_ID, HISTORY_LEN).await {
                    println!("[{:?}] {}", msg.role, msg.content);
                }
            }
            _ if input.starts_with("/model ") => {
                model = input["/model ".len()..].trim().to_string();
                println!("model set to {model}");
            }
            _ => relay_turn(&app, input, &model).await?,
        }
    }

    tracing::info!("terminal session ended");
    Ok(())
}

/// Next input line, or `None` on end of input or when `interrupt` fires first.
async fn next_input<R, F>(lines: &mut Lines<R>, interrupt: F) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    F: Future,
{
    tokio::select! {
        line = lines.next_line() => line,
        _ = interrupt => {
            tracing::info!("interrupted at prompt");
            Ok(None)
        }
    }
}

/// Run one turn and print fragments as they arrive.
async fn relay_turn(app: &App, input: &str, model: &str) -> Result<()> {
    let mut conversation = app.sessions.lock(SESSION_ID).await;
    conversation.push_user(input);

    let stream = app.orchestrator.respond_stream(&mut conversation, Some(model));
    futures::pin_mut!(stream);

    let mut stdout = std::io::stdout();
    let relay = async {
        while let Some(fragment) = stream.next().await {
            stdout.write_all(fragment.as_bytes())?;
            stdout.flush()?;
        }
        Ok::<_, std::io::Error>(())
    };

    tokio::select! {
        result = relay => result.context("failed to write reply")?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("turn interrupted by user");
            print!("\n[interrupted]");
        }
    }
    println!("\n");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_next_input_reads_lines_until_eof() {
        let mut lines = BufReader::new(&b"hello\n/quit\n"[..]).lines();
        let never = std::future::pending::<()>();
        futures::pin_mut!(never);

        assert_eq!(next_input(&mut lines, &mut never).await.unwrap().as_deref(), Some("hello"));
        assert_eq!(next_input(&mut lines, &mut never).await.unwrap().as_deref(), Some("/quit"));
        assert_eq!(next_input(&mut lines, &mut never).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_next_input_stops_on_interrupt() {
        // stdin that never yields a line
        let (_writer, reader) = tokio::io::duplex(64);
        let mut lines = BufReader::new(reader).lines();

        let line = next_input(&mut lines, std::future::ready(())).await.unwrap();
        assert_eq!(line, None);
    }
}
