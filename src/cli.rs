use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "pyground", about = "Terminal Python playground with AI assistance", version)]
pub struct Cli {
    /// Python file to preload into the editor.
    #[arg(value_name = "FILE")]
    pub file: Option<String>,

    /// Large language model used for AI assistance.
    #[arg(long)]
    pub model: Option<String>,

    /// Randomness of AI-generated output.
    #[arg(long, default_value_t = 0.2, value_parser = clap::value_parser!(f32))]
    pub temperature: f32,

    /// Limits highest probable tokens (words).
    #[arg(long = "top-p", default_value_t = 1.0, value_parser = clap::value_parser!(f32))]
    pub top_p: f32,

    /// Python interpreter to run scripts with (overrides PYTHON_BIN).
    #[arg(long)]
    pub python: Option<String>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
