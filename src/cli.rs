//! CLI argument parsing for the caption workflow.
//!
//! The CLI is intentionally thin: it loads inputs and credentials and calls
//! library functions, so the pipeline stays reusable as a library.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint for caption generation and posting.
#[derive(Parser, Debug)]
#[command(
    name = "capgen",
    version,
    about = "LM-driven Instagram caption generator",
    after_help = "Commands:\n  generate --user-input <file> --templates <file>   Run the caption pipeline\n  post --user-input <file> --templates <file> --image-url <url>...\n                                                    Generate and publish a carousel\n  extract-template --caption <file> --templates <file>\n                                                    Turn an example caption into a template\n\nExamples:\n  capgen generate --user-input post.json --templates templates.json --out bundle.json\n  capgen post --user-input post.json --templates templates.json --image-url https://cdn.example/a.png\n  capgen extract-template --caption caption.txt --templates templates.json --append",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level workflow commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Generate(GenerateArgs),
    Post(PostArgs),
    ExtractTemplate(ExtractArgs),
}

/// Generate command inputs for a single caption job.
#[derive(Parser, Debug)]
#[command(about = "Run the caption pipeline and print or save the result bundle")]
pub struct GenerateArgs {
    /// JSON file with {business_type, title, direction}
    #[arg(long, value_name = "PATH")]
    pub user_input: PathBuf,

    /// Template catalog JSON file
    #[arg(long, value_name = "PATH")]
    pub templates: PathBuf,

    /// Optional output path for the full result bundle JSON
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Model identifier override for every stage
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,
}

/// Post command inputs: generate a caption, then publish a carousel.
#[derive(Parser, Debug)]
#[command(about = "Generate a caption and publish an image carousel with it")]
pub struct PostArgs {
    /// JSON file with {business_type, title, direction}
    #[arg(long, value_name = "PATH")]
    pub user_input: PathBuf,

    /// Template catalog JSON file
    #[arg(long, value_name = "PATH")]
    pub templates: PathBuf,

    /// Already-hosted image URL for one carousel slide (repeatable)
    #[arg(long = "image-url", value_name = "URL", required = true)]
    pub image_urls: Vec<String>,

    /// Model identifier override for every stage
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,
}

/// Extract-template command inputs.
#[derive(Parser, Debug)]
#[command(about = "Extract a reusable template from an example caption")]
pub struct ExtractArgs {
    /// Text file containing the example caption
    #[arg(long, value_name = "PATH")]
    pub caption: PathBuf,

    /// Template catalog JSON file (few-shot examples; target for --append)
    #[arg(long, value_name = "PATH")]
    pub templates: PathBuf,

    /// Append the extracted template to the catalog file
    #[arg(long)]
    pub append: bool,
}
