use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quiz_generator::ai::mime::resolve_mime;
use quiz_generator::app::App;
use quiz_generator::client::render::{render_quizzes, render_status};
use quiz_generator::client::{QuizClient, QuizStore};
use quiz_generator::models::{Attachment, QuizForm};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "quiz-generator")]
#[command(about = "Generate multiple-choice quizzes from notes or documents")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// Address to bind, overriding BIND_ADDR.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Submit material to a running server and print the quizzes.
    Generate {
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        server: String,
        /// File to upload; may be repeated.
        #[arg(long = "file", value_name = "PATH")]
        files: Vec<PathBuf>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        count: Option<u32>,
        #[arg(long)]
        difficulty: Option<String>,
        #[arg(long)]
        topic: Option<String>,
        /// Echo generated text while it streams.
        #[arg(long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quiz_generator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    match args.command {
        Command::Serve { bind } => {
            info!("Starting quiz-generator server");
            let app = match App::new() {
                Ok(app) => app,
                Err(e) => {
                    error!("Failed to initialize application: {}", e);
                    std::process::exit(1);
                }
            };
            app.run(bind.as_deref()).await?;
            Ok(())
        }
        Command::Generate {
            server,
            files,
            notes,
            count,
            difficulty,
            topic,
            verbose,
        } => {
            let mut attachments = Vec::with_capacity(files.len());
            for path in &files {
                attachments.push(read_attachment(path).await?);
            }
            let form = QuizForm {
                files: attachments,
                notes,
                quiz_count: count,
                difficulty,
                topic,
            };

            let client = QuizClient::new(server);
            let mut store = QuizStore::new();
            let outcome = client
                .generate_with(&form, &mut store, |text| {
                    if verbose {
                        eprint!("{}", text);
                        let _ = std::io::stderr().flush();
                    }
                })
                .await;

            match store.quizzes() {
                Some(quizzes) => {
                    println!("{}", render_quizzes(quizzes));
                    Ok(())
                }
                None => {
                    error!("{}", render_status(&store));
                    if let Err(e) = outcome {
                        error!("Generation failed: {}", e);
                    }
                    std::process::exit(1);
                }
            }
        }
    }
}

async fn read_attachment(path: &Path) -> Result<Attachment> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let mime_type = resolve_mime(None, &data);
    Ok(Attachment {
        file_name,
        mime_type,
        data: data.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_args_parse() {
        let args = CliArgs::try_parse_from([
            "quiz-generator",
            "generate",
            "--file",
            "a.pdf",
            "--file",
            "b.png",
            "--count",
            "3",
            "--difficulty",
            "Hard",
        ])
        .unwrap();

        match args.command {
            Command::Generate {
                files,
                count,
                difficulty,
                ..
            } => {
                assert_eq!(files.len(), 2);
                assert_eq!(count, Some(3));
                assert_eq!(difficulty.as_deref(), Some("Hard"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_zero_count_rejected() {
        assert!(CliArgs::try_parse_from(["quiz-generator", "generate", "--count", "0"]).is_err());
    }

    #[tokio::test]
    async fn test_read_attachment_sniffs_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Cells divide by mitosis.").unwrap();

        let attachment = read_attachment(&path).await.unwrap();
        assert_eq!(attachment.file_name, "notes.txt");
        assert_eq!(attachment.mime_type, "text/plain");
    }
}
