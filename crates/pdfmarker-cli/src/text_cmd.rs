use std::path::Path;

use crate::cli::TextFormat;
use crate::shared::{open_document, print_json, print_warnings, resolve_pages};

pub fn run(file: &Path, pages: Option<&str>, format: &TextFormat) -> Result<(), i32> {
    let doc = open_document(file)?;
    let page_indices = resolve_pages(pages, doc.page_count())?;

    for idx in page_indices {
        let result = doc.page_index(idx).map_err(|e| {
            eprintln!("Error reading page {}: {e}", idx + 1);
            1
        })?;
        print_warnings(&result.warnings);
        let text = result.value.text();

        match format {
            TextFormat::Text => {
                println!("--- Page {} ---", idx + 1);
                println!("{}", text.trim_end());
            }
            TextFormat::Json => print_json(&serde_json::json!({
                "page": idx + 1,
                "text": text,
            }))?,
        }
    }

    Ok(())
}
