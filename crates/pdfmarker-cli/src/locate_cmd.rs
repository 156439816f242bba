use std::path::Path;

use pdfmarker::{HighlightStyle, LocateOptions, locate, project};

use crate::cli::OutputFormat;
use crate::shared::{csv_escape, open_document, print_json, print_warnings, resolve_pages};

pub fn run(
    file: &Path,
    phrases: &[String],
    pages: Option<&str>,
    min_chars: usize,
    format: &OutputFormat,
) -> Result<(), i32> {
    let doc = open_document(file)?;
    let page_indices = resolve_pages(pages, doc.page_count())?;
    let options = LocateOptions {
        min_phrase_chars: min_chars,
    };
    let style = HighlightStyle::default();

    let phrases: Vec<&str> = phrases
        .iter()
        .map(String::as_str)
        .filter(|phrase| {
            let accepted = options.accepts(phrase);
            if !accepted {
                eprintln!("warning: skipping '{phrase}': shorter than {min_chars} characters");
            }
            accepted
        })
        .collect();

    match format {
        OutputFormat::Text => println!("page\tstart\tend\tx\ty\twidth\theight\tphrase"),
        OutputFormat::Csv => println!("page,start,end,x,y,width,height,phrase"),
        OutputFormat::Json => {}
    }

    for idx in page_indices {
        let result = doc.page_index(idx).map_err(|e| {
            eprintln!("Error reading page {}: {e}", idx + 1);
            1
        })?;
        print_warnings(&result.warnings);
        let index = result.value;

        for phrase in &phrases {
            for occ in locate(index.text(), phrase, &options) {
                let rects = project(&occ, &index, &style);
                match format {
                    OutputFormat::Text => {
                        for r in &rects {
                            println!(
                                "{}\t{}\t{}\t{:.2}\t{:.2}\t{:.2}\t{:.2}\t{phrase}",
                                idx + 1,
                                occ.start,
                                occ.end,
                                r.x,
                                r.y,
                                r.width,
                                r.height
                            );
                        }
                    }
                    OutputFormat::Csv => {
                        for r in &rects {
                            println!(
                                "{},{},{},{:.2},{:.2},{:.2},{:.2},{}",
                                idx + 1,
                                occ.start,
                                occ.end,
                                r.x,
                                r.y,
                                r.width,
                                r.height,
                                csv_escape(phrase)
                            );
                        }
                    }
                    OutputFormat::Json => print_json(&serde_json::json!({
                        "page": idx + 1,
                        "phrase": phrase,
                        "start": occ.start,
                        "end": occ.end,
                        "rects": rects.iter().map(|r| r.bounds()).collect::<Vec<_>>(),
                    }))?,
                }
            }
        }
    }

    Ok(())
}
