use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Locate and highlight important phrases in PDF documents.
#[derive(Debug, Parser)]
#[command(name = "pdfmarker", about, version)]
pub struct Cli {
    /// Log to stderr (-v for info, -vv for debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the flattened text of each page
    Text {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page range (e.g. '1,3-5'). Default: all pages
        #[arg(long)]
        pages: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = TextFormat::Text)]
        format: TextFormat,
    },

    /// List positioned text runs with their offsets
    Runs {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page range (e.g. '1,3-5'). Default: all pages
        #[arg(long)]
        pages: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Find phrases and print the rectangles that would be drawn
    Locate {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Phrase to look for (repeatable)
        #[arg(long = "phrase", value_name = "TEXT", required = true)]
        phrases: Vec<String>,

        /// Page range (e.g. '1,3-5'). Default: all pages
        #[arg(long)]
        pages: Option<String>,

        /// Minimum phrase length in characters
        #[arg(long, default_value_t = 11)]
        min_chars: usize,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Highlight phrases and write a new PDF
    Highlight {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Where to write the highlighted PDF
        #[arg(short, long, value_name = "OUT")]
        output: PathBuf,

        /// Highlight these phrases instead of asking a model (repeatable)
        #[arg(long = "phrase", value_name = "TEXT")]
        phrases: Vec<String>,

        /// Page range (e.g. '1,3-5'). Default: all pages
        #[arg(long)]
        pages: Option<String>,

        /// Ollama server URL
        #[arg(long, env = "OLLAMA_HOST", default_value = pdfmarker::DEFAULT_ENDPOINT)]
        ollama_host: String,

        /// Model used to pick phrases
        #[arg(long, env = "PDFMARKER_MODEL", default_value = pdfmarker::DEFAULT_MODEL)]
        model: String,

        /// How highlights are written
        #[arg(long, value_enum, default_value_t = ModeArg::Overlay)]
        mode: ModeArg,

        /// Highlight color as #rrggbb
        #[arg(long, default_value = "#ffff00")]
        color: String,

        /// Highlight opacity (0.0 - 1.0)
        #[arg(long, default_value_t = 0.4)]
        opacity: f64,

        /// Minimum phrase length in characters
        #[arg(long, default_value_t = 11)]
        min_chars: usize,

        /// Output format for the run report
        #[arg(long, value_enum, default_value_t = TextFormat::Text)]
        format: TextFormat,
    },
}

/// Output format for text-like subcommands.
#[derive(Debug, Clone, ValueEnum)]
pub enum TextFormat {
    /// Plain text output
    Text,
    /// JSON output
    Json,
}

/// Output format for tabular subcommands.
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Plain text (tab-separated)
    Text,
    /// JSON output
    Json,
    /// CSV output
    Csv,
}

/// How highlights are written into the PDF.
#[derive(Debug, Clone, ValueEnum)]
pub enum ModeArg {
    /// Translucent rectangles painted over the page
    Overlay,
    /// Highlight annotations
    Annotation,
}

impl From<&ModeArg> for pdfmarker::HighlightMode {
    fn from(mode: &ModeArg) -> Self {
        match mode {
            ModeArg::Overlay => pdfmarker::HighlightMode::Overlay,
            ModeArg::Annotation => pdfmarker::HighlightMode::Annotation,
        }
    }
}
