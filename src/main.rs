mod assist;
mod cli;
mod config;
mod llm;
mod runtime;
mod snippets;
mod transcript;
mod tui;

use anyhow::{bail, Context, Result};
use config::Config;
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // Optional: override the interpreter via CLI before loading config
    if let Some(python) = args.python.as_deref() {
        std::env::set_var("PYTHON_BIN", python);
    }

    let cfg = Config::load();

    // The surface is TUI-only; refuse to start without a terminal.
    if !std::io::stdout().is_terminal() {
        bail!("pyground requires a terminal (stdout is not a tty)");
    }

    // Resolve model: CLI overrides config; fall back to DEFAULT_MODEL
    let model = args
        .model
        .clone()
        .or_else(|| cfg.get("DEFAULT_MODEL"))
        .unwrap_or_else(|| "gpt-4o-mini".to_string());

    let initial_source = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path))?,
        None => snippets::WELCOME.to_string(),
    };

    let opts = tui::PlaygroundOptions {
        initial_source,
        model,
        temperature: args.temperature,
        top_p: args.top_p,
    };

    if let Err(e) = tui::run_playground(&cfg, opts).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}
