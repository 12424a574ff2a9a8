mod align;
mod common;
mod completions;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::align::{AlignCommands, handle_align_command};
use crate::completions::CompletionCommands;
use crate::ui::prelude::{Level, OutputFormat, emit};

/// Retime reviewed subtitles onto rendered narration audio
#[derive(Parser, Debug)]
#[command(name = "realign", author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format for messages
    #[arg(long, value_enum, default_value = "text", global = true)]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Config file to use instead of the user config
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Align(AlignCommands),

    /// Shell completion scripts
    Completions {
        #[command(subcommand)]
        command: CompletionCommands,
    },
}

pub fn cli_command() -> clap::Command {
    Cli::command()
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Align(command) => handle_align_command(command, cli.config.as_deref()),
        Commands::Completions { command } => match command {
            CompletionCommands::Generate { shell } => {
                print!("{}", completions::generate(shell)?);
                Ok(())
            }
            CompletionCommands::Install {
                shell,
                target,
                force,
            } => {
                let path = completions::install(shell, target, force)?;
                emit(
                    Level::Success,
                    "completions.installed",
                    &format!("Installed {shell} completions to {}", path.display()),
                    None,
                );
                emit(
                    Level::Info,
                    "completions.instructions",
                    &completions::instructions(shell, &path),
                    None,
                );
                Ok(())
            }
        },
    }
}

fn main() {
    let cli = Cli::parse();

    let color = !cli.no_color && std::io::stdout().is_terminal();
    ui::init(cli.output, color);
    ui::set_debug_mode(cli.debug);

    if let Err(err) = run(cli) {
        emit(Level::Error, "realign.error", &format!("Error: {err:#}"), None);
        std::process::exit(1);
    }
}
