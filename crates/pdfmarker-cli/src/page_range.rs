/// Parse a page selection like "3,1-2" into 0-indexed page numbers.
///
/// Input is 1-indexed. Pages keep the order they are written in; a page
/// named twice is kept at its first position.
pub fn parse_page_range(input: &str, page_count: usize) -> Result<Vec<usize>, String> {
    let mut pages: Vec<usize> = Vec::new();
    let mut push = |page: usize| {
        if !pages.contains(&page) {
            pages.push(page);
        }
    };

    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((first, last)) => {
                let first = page_number(first, page_count)?;
                let last = page_number(last, page_count)?;
                if first > last {
                    return Err(format!("invalid range '{part}': start is after end"));
                }
                (first..=last).for_each(&mut push);
            }
            None => push(page_number(part, page_count)?),
        }
    }

    if pages.is_empty() {
        return Err(format!("no pages selected by '{input}'"));
    }
    Ok(pages)
}

/// One 1-indexed page number, returned 0-indexed.
fn page_number(s: &str, page_count: usize) -> Result<usize, String> {
    let s = s.trim();
    let page: usize = s
        .parse()
        .map_err(|_| format!("invalid page number: '{s}'"))?;
    if page == 0 {
        return Err("page 0 is invalid (pages start at 1)".to_string());
    }
    if page > page_count {
        return Err(format!(
            "page {page} exceeds document page count ({page_count})"
        ));
    }
    Ok(page - 1)
}
