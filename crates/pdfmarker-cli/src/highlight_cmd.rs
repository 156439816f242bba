use std::path::Path;

use pdfmarker::{
    FixedPhrases, HighlightOptions, HighlightReport, HighlightStyle, Highlighter, LocateOptions,
    OllamaConfig, OllamaProposer, Rgb, RunOutcome,
};

use crate::cli::{ModeArg, TextFormat};
use crate::shared::{ProgressReporter, open_document, print_json, print_warnings, resolve_pages};

/// Arguments of the `highlight` subcommand.
pub struct HighlightArgs<'a> {
    pub file: &'a Path,
    pub output: &'a Path,
    pub phrases: &'a [String],
    pub pages: Option<&'a str>,
    pub ollama_host: &'a str,
    pub model: &'a str,
    pub mode: &'a ModeArg,
    pub color: &'a str,
    pub opacity: f64,
    pub min_chars: usize,
    pub format: &'a TextFormat,
}

pub fn run(args: HighlightArgs<'_>) -> Result<(), i32> {
    let color = Rgb::from_hex(args.color).ok_or_else(|| {
        eprintln!("Error: invalid color '{}': expected #rrggbb", args.color);
        1
    })?;
    if !(0.0..=1.0).contains(&args.opacity) {
        eprintln!("Error: opacity must be between 0.0 and 1.0");
        return Err(1);
    }

    let doc = open_document(args.file)?;
    let pages = match args.pages {
        Some(_) => Some(resolve_pages(args.pages, doc.page_count())?),
        None => None,
    };
    let options = HighlightOptions {
        locate: LocateOptions {
            min_phrase_chars: args.min_chars,
        },
        style: HighlightStyle {
            color,
            opacity: args.opacity,
            ..HighlightStyle::default()
        },
        pages,
    };

    let highlighter = if args.phrases.is_empty() {
        let config = OllamaConfig::default()
            .with_endpoint(args.ollama_host)
            .with_model(args.model);
        tracing::info!(endpoint = %config.endpoint, model = %config.model, "using model proposer");
        let proposer = OllamaProposer::new(config).map_err(|e| {
            eprintln!("Error: {e}");
            1
        })?;
        Highlighter::new(proposer)
    } else {
        Highlighter::new(FixedPhrases::new(args.phrases.iter().cloned()))
    }
    .with_options(options);

    let mut writer = doc.highlight_writer(args.mode.into());
    let mut progress = ProgressReporter::new();
    let result = highlighter.run(&doc, &mut writer, &mut progress);
    progress.finish();
    let report = result.map_err(|e| {
        eprintln!("Error: highlighting failed: {e}");
        1
    })?;

    let bytes = writer.finish().map_err(|e| {
        eprintln!("Error: failed to write PDF: {e}");
        1
    })?;
    std::fs::write(args.output, bytes).map_err(|e| {
        eprintln!("Error: failed to write {}: {e}", args.output.display());
        1
    })?;

    for page in &report.pages {
        print_warnings(&page.warnings);
    }
    match args.format {
        TextFormat::Text => print_summary(&report, args.output),
        TextFormat::Json => print_json(&report)?,
    }
    Ok(())
}

fn print_summary(report: &HighlightReport, output: &Path) {
    for page in &report.pages {
        if page.skipped {
            println!("page {}: skipped", page.page + 1);
            continue;
        }
        let found = page.phrases.iter().filter(|p| p.occurrences > 0).count();
        println!(
            "page {}: {} rectangles, {found}/{} phrases found",
            page.page + 1,
            page.rect_count(),
            page.phrases.len()
        );
    }
    if let RunOutcome::Cancelled { pages_done } = report.outcome {
        println!("cancelled after {pages_done} pages");
    }
    println!(
        "wrote {} highlights to {}",
        report.total_rects(),
        output.display()
    );
}
