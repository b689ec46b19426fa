pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "atende",
    about = "Q&A agent for the Rio de Janeiro 1746 service-call dataset",
    long_about = "Ask natural-language questions about 1746 service calls. Questions are \
routed through intent classification, context retrieval, SQL generation, and a safety \
validator before anything reaches the warehouse.",
    after_help = "Examples:\n  atende ask \"How many calls opened on 2024-11-28?\"\n  atende chat --thread demo\n  atende index"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Interactive chat with per-thread conversation memory")]
    Chat {
        #[arg(long, help = "Thread identifier to resume; a fresh one is generated when omitted")]
        thread: Option<String>,
    },
    #[command(about = "Ask a single question and print the answer")]
    Ask {
        question: String,
        #[arg(long, help = "Persist this exchange under a thread identifier")]
        thread: Option<String>,
    },
    #[command(about = "Rebuild the category vector index from the warehouse")]
    Index,
    #[command(about = "Apply pending checkpoint-store migrations")]
    Migrate,
    #[command(about = "Inspect effective configuration values with secrets redacted")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Chat { thread } => commands::chat::run(thread),
        Command::Ask { question, thread } => commands::ask::run(&question, thread),
        Command::Index => commands::index::run(),
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
