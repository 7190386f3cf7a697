pub mod commands;
pub mod speech;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "kisan",
    about = "Kisan Mitra farmer assistant CLI",
    long_about = "Ask the farmer assistant from the terminal, diagnose crop photos, and inspect configuration and credential readiness.",
    after_help = "Examples:\n  kisan ask \"price of potato in Agra\"\n  kisan diagnose leaf.jpg --language Hindi\n  kisan chat --speech\n  kisan doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Route one question to the right agent and print the reply")]
    Ask {
        #[arg(required = true, num_args = 1.., help = "The question, in any language")]
        query: Vec<String>,
        #[arg(long, help = "Reply language (defaults to assistant.default_language)")]
        language: Option<String>,
    },
    #[command(about = "Diagnose a crop disease from a photo of the affected plant")]
    Diagnose {
        image: PathBuf,
        #[arg(long, help = "Reply language (defaults to assistant.default_language)")]
        language: Option<String>,
    },
    #[command(about = "Interactive session over stdin; say exit, quit, or stop to leave")]
    Chat {
        #[arg(long, help = "Reply language (defaults to assistant.default_language)")]
        language: Option<String>,
        #[arg(long, help = "Print replies as they would be spoken")]
        speech: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and API credential readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    // A missing .env is normal outside development.
    let _ = dotenvy::dotenv();

    let result = match cli.command {
        Command::Ask { query, language } => {
            commands::ask::run(&query.join(" "), language.as_deref())
        }
        Command::Diagnose { image, language } => {
            commands::diagnose::run(&image, language.as_deref())
        }
        Command::Chat { language, speech } => commands::chat::run(language.as_deref(), speech),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
