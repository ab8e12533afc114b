//! Kairox CLI
//!
//! Terminal front end for the research conversation pipeline: one-shot
//! answers or an interactive session.

mod config;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use config::{resolve_model_config, FileConfig, ModelFlags};
use kairox_core::agent::OpenAiCompatAgent;
use kairox_core::pipeline::{ConversationOptions, Orchestrator};
use kairox_core::roles::{ResearchPreference, RoleRegistry};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about = "Kairox - cited research answers from your terminal")]
struct Args {
    /// Question to answer once; omit for an interactive session
    question: Option<String>,
    /// Suppress streamed stage output; print only the final answer
    #[arg(short, long)]
    quiet: bool,
    /// Print the full conversation result as JSON
    #[arg(long)]
    json: bool,
    /// Steer research towards Tavily deep search instead of Firecrawl
    #[arg(long)]
    deep_research: bool,
    /// Model name (overrides KAIROX_MODEL)
    #[arg(long)]
    model: Option<String>,
    /// Chat-completions base URL (overrides KAIROX_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,
    /// nvidia, openai, openrouter or deepseek (overrides KAIROX_PROVIDER)
    #[arg(long)]
    provider: Option<String>,
    /// Config file (default: .kairox/config.json)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// How a finished turn is rendered
#[derive(Debug, Clone, Copy)]
struct OutputMode {
    quiet: bool,
    json: bool,
}

fn is_exit_command(input: &str) -> bool {
    matches!(input.to_lowercase().as_str(), "quit" | "exit" | "q")
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    logging::init_tracing();

    let args = Args::parse();
    let file = FileConfig::load(args.config.as_deref())?;

    let flags = ModelFlags {
        provider: args.provider.clone(),
        model: args.model.clone(),
        base_url: args.base_url.clone(),
    };
    let model_config = resolve_model_config(&flags, &file, |name| std::env::var(name).ok())?;
    tracing::info!(
        provider = %model_config.provider.display_name(),
        model = %model_config.model,
        "Model configured"
    );

    let registry = Arc::new(RoleRegistry::default());
    let agent = OpenAiCompatAgent::new(model_config, registry.clone())
        .context("Failed to create agent")?;
    let orchestrator = Orchestrator::new(Arc::new(agent), registry);

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                stop.store(true, Ordering::SeqCst);
            }
        });
    }

    let mode = OutputMode {
        quiet: args.quiet || file.quiet.unwrap_or(false),
        json: args.json,
    };
    let preference = if args.deep_research || file.deep_research.unwrap_or(false) {
        ResearchPreference::Tavily
    } else {
        ResearchPreference::Firecrawl
    };
    let options = ConversationOptions::new()
        .quiet(mode.quiet || mode.json)
        .with_research_preference(preference)
        .with_stop({
            let stop = stop.clone();
            move || stop.load(Ordering::SeqCst)
        });

    match args.question {
        Some(question) => answer(&orchestrator, question.trim(), &options, mode).await,
        None => repl(&orchestrator, &options, mode, &stop).await,
    }
}

async fn repl(
    orchestrator: &Orchestrator,
    options: &ConversationOptions,
    mode: OutputMode,
    stop: &AtomicBool,
) -> Result<()> {
    println!("Kairox agent ready. Type a question (or 'quit').\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout
            .write_all(b"Enter your question (or 'quit' to exit): ")
            .await?;
        stdout.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };

        let Some(line) = line else {
            println!("\nGoodbye!");
            return Ok(());
        };

        let question = line.trim();
        if is_exit_command(question) {
            println!("Goodbye!");
            return Ok(());
        }
        if question.is_empty() {
            println!("Please enter a non-empty question.");
            continue;
        }

        stop.store(false, Ordering::SeqCst);
        answer(orchestrator, question, options, mode).await?;
    }
}

/// Run one turn and print its outcome. Conversation failures are reported,
/// not returned.
async fn answer(
    orchestrator: &Orchestrator,
    question: &str,
    options: &ConversationOptions,
    mode: OutputMode,
) -> Result<()> {
    match orchestrator.run_conversation(question, options).await {
        Ok(result) => {
            if mode.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if mode.quiet {
                println!("{}", result.final_answer);
            }
            if !mode.json {
                for warning in &result.warnings {
                    eprintln!("[WARN] {}", warning);
                }
            }
        }
        Err(e) if e.is_cancelled() => println!("\n[stopped by user]"),
        Err(e) => {
            tracing::error!(error = %e, "Error during conversation");
            println!("[ERROR] {}", e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_commands() {
        for command in ["quit", "EXIT", "q"] {
            assert!(is_exit_command(command));
        }
        assert!(!is_exit_command("what is quit?"));
        assert!(!is_exit_command(""));
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from([
            "kairox",
            "--deep-research",
            "--json",
            "--provider",
            "openrouter",
            "What is ARC-AGI?",
        ]);
        assert!(args.deep_research);
        assert!(args.json);
        assert_eq!(args.provider.as_deref(), Some("openrouter"));
        assert_eq!(args.question.as_deref(), Some("What is ARC-AGI?"));
    }
}
