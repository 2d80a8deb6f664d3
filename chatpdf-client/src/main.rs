use anyhow::Context;
use chatpdf_client::command::Command;
use chatpdf_client::config::ClientSettings;
use chatpdf_client::session::{start_session, UploadFile};
use chatpdf_client::transcript::render;
use chatpdf_client::GatewayClient;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they do not interleave with the chat.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = ClientSettings::load().context("Failed to load client configuration")?;
    let gateway = GatewayClient::new(settings).context("Failed to build gateway client")?;
    println!("Chat with PDF via {}", gateway.server_url());

    let session = start_session(Arc::new(gateway));
    println!("Session {}", session.id());
    println!("Commands: /upload <path>, /quit. Anything else is a question.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let seen = session.len();

        match Command::parse(&line) {
            Command::Quit => break,
            Command::MissingPath => println!("usage: /upload <path>"),
            Command::Upload(path) => match UploadFile::from_path(path).await {
                Ok(file) => {
                    if let Err(e) = session.submit_upload(file).await {
                        println!("!! Upload failed: {}", e);
                    }
                }
                Err(e) => println!("!! {}", e),
            },
            Command::Ask(text) => {
                if !text.trim().is_empty() {
                    println!("Thinking...");
                }
                session.submit_question(text).await;
            }
        }

        print!("{}", render(&session.transcript()[seen..]));
    }

    Ok(())
}
