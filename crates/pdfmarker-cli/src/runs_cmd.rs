use std::path::Path;

use crate::cli::OutputFormat;
use crate::shared::{csv_escape, open_document, print_json, print_warnings, resolve_pages};

pub fn run(file: &Path, pages: Option<&str>, format: &OutputFormat) -> Result<(), i32> {
    let doc = open_document(file)?;
    let page_indices = resolve_pages(pages, doc.page_count())?;

    match format {
        OutputFormat::Text => println!("page\tstart\tend\tx\ty\twidth\theight\ttext"),
        OutputFormat::Csv => println!("page,start,end,x,y,width,height,text"),
        OutputFormat::Json => {}
    }

    for idx in page_indices {
        let result = doc.page_index(idx).map_err(|e| {
            eprintln!("Error reading page {}: {e}", idx + 1);
            1
        })?;
        print_warnings(&result.warnings);

        for run in result.value.runs().iter().filter(|r| !r.is_spacing()) {
            match format {
                OutputFormat::Text => println!(
                    "{}\t{}\t{}\t{:.2}\t{:.2}\t{:.2}\t{:.2}\t{}",
                    idx + 1,
                    run.start,
                    run.end,
                    run.x(),
                    run.y(),
                    run.width,
                    run.glyph_height(),
                    run.text
                ),
                OutputFormat::Csv => println!(
                    "{},{},{},{:.2},{:.2},{:.2},{:.2},{}",
                    idx + 1,
                    run.start,
                    run.end,
                    run.x(),
                    run.y(),
                    run.width,
                    run.glyph_height(),
                    csv_escape(&run.text)
                ),
                OutputFormat::Json => print_json(&serde_json::json!({
                    "page": idx + 1,
                    "start": run.start,
                    "end": run.end,
                    "text": run.text,
                    "transform": run.transform,
                    "width": run.width,
                }))?,
            }
        }
    }

    Ok(())
}
