mod cli;
mod highlight_cmd;
mod locate_cmd;
mod page_range;
mod runs_cmd;
mod shared;
mod text_cmd;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        cli::Commands::Text {
            ref file,
            ref pages,
            ref format,
        } => text_cmd::run(file, pages.as_deref(), format),
        cli::Commands::Runs {
            ref file,
            ref pages,
            ref format,
        } => runs_cmd::run(file, pages.as_deref(), format),
        cli::Commands::Locate {
            ref file,
            ref phrases,
            ref pages,
            min_chars,
            ref format,
        } => locate_cmd::run(file, phrases, pages.as_deref(), min_chars, format),
        cli::Commands::Highlight {
            ref file,
            ref output,
            ref phrases,
            ref pages,
            ref ollama_host,
            ref model,
            ref mode,
            ref color,
            opacity,
            min_chars,
            ref format,
        } => highlight_cmd::run(highlight_cmd::HighlightArgs {
            file,
            output,
            phrases,
            pages: pages.as_deref(),
            ollama_host,
            model,
            mode,
            color,
            opacity,
            min_chars,
            format,
        }),
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}

/// Log to stderr. `RUST_LOG` wins over the `-v` count.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
