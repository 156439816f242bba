//! Integration tests for the Highlighter over real PDF bytes.
//!
//! PDF bytes → Document → Highlighter → sink (collecting or writer).
//! Test PDFs are created programmatically using lopdf.

use pdfmarker::{
    CollectingSink, Document, FixedPhrases, HighlightMode, HighlightOptions, Highlighter,
    LocateOptions, NoProgress, Phrase, ProgressStep, ProposalError, RunOutcome,
};

/// Create a multi-page PDF. Each page shows its texts as separate runs on one line.
fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
    use lopdf::{Object, Stream, dictionary};

    let mut doc = lopdf::Document::with_version("1.5");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for runs in pages {
        let mut content = String::from("BT /F1 12 Tf 72 700 Td ");
        for run in *runs {
            content.push_str(&format!("({run}) Tj 0 -14 Td "));
        }
        content.push_str("ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(pages.len() as i64),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

fn five_pages() -> Vec<u8> {
    pdf_with_pages(&[
        &["page one", "key finding here"],
        &["page two", "key finding here"],
        &["page three", "key finding here"],
        &["page four", "key finding here"],
        &["page five", "key finding here"],
    ])
}

#[test]
fn scenario_a_on_a_real_page() {
    let bytes = pdf_with_pages(&[&["Cats", "are", "great"]]);
    let doc = Document::open(&bytes, None).unwrap();
    let highlighter =
        Highlighter::new(FixedPhrases::new(["are great"])).with_options(HighlightOptions {
            locate: LocateOptions {
                min_phrase_chars: 9,
            },
            ..HighlightOptions::default()
        });
    let mut sink = CollectingSink::new();
    let report = highlighter.run(&doc, &mut sink, &mut NoProgress).unwrap();

    assert_eq!(report.total_rects(), 2);
    let rects: Vec<_> = sink.on_page(0).collect();
    // one rectangle per run, each from its own run's origin
    assert_eq!(rects[0].x, 72.0);
    assert_eq!(rects[1].x, 72.0);
    assert!((rects[0].y - (686.0 - 12.0 * 0.2)).abs() < 1e-6);
    assert!((rects[1].y - (672.0 - 12.0 * 0.2)).abs() < 1e-6);
}

#[test]
fn scenario_c_paraphrase_finds_nothing() {
    let bytes = pdf_with_pages(&[&["Cats", "are", "great"]]);
    let doc = Document::open(&bytes, None).unwrap();
    let highlighter = Highlighter::new(FixedPhrases::new(["felines are wonderful"]));
    let mut sink = CollectingSink::new();
    let report = highlighter.run(&doc, &mut sink, &mut NoProgress).unwrap();

    assert!(report.is_complete());
    assert_eq!(report.total_rects(), 0);
    assert!(report.warnings().all(|w| w.code.as_str() != "PROPOSAL_FAILED"));
}

#[test]
fn scenario_d_failing_page_is_skipped() {
    let doc = Document::open(&five_pages(), None).unwrap();
    let highlighter = Highlighter::new(|text: &str| -> Result<Vec<Phrase>, ProposalError> {
        if text.contains("page three") {
            Err(ProposalError::Transport("connection reset".into()))
        } else {
            Ok(vec![Phrase::new("key finding")])
        }
    });
    let mut sink = CollectingSink::new();
    let report = highlighter.run(&doc, &mut sink, &mut NoProgress).unwrap();

    assert!(report.is_complete());
    assert_eq!(report.pages.len(), 5);
    assert_eq!(report.skipped_pages().collect::<Vec<_>>(), vec![2]);
    assert_eq!(report.total_rects(), 4);
    assert_eq!(sink.len(), 4);
    assert_eq!(sink.on_page(2).count(), 0);
    assert_eq!(report.pages[2].warnings.last().unwrap().code.as_str(), "PROPOSAL_FAILED");
}

#[test]
fn progress_is_monotonic_and_completes() {
    let doc = Document::open(&five_pages(), None).unwrap();
    let highlighter = Highlighter::new(FixedPhrases::new(["key finding"]));
    let mut steps: Vec<(ProgressStep, u8)> = Vec::new();
    highlighter
        .run(
            &doc,
            &mut CollectingSink::new(),
            &mut |step: ProgressStep, pct: u8| steps.push((step, pct)),
        )
        .unwrap();

    assert!(steps.windows(2).all(|w| w[0].1 <= w[1].1));
    assert_eq!(steps.first(), Some(&(ProgressStep::Extracting, 10)));
    assert_eq!(steps.last(), Some(&(ProgressStep::Complete, 100)));
    // extracting, then analyzing + highlighting per page, then complete
    assert_eq!(steps.len(), 1 + 2 * 5 + 1);
}

#[test]
fn cancellation_stops_between_pages() {
    let doc = Document::open(&five_pages(), None).unwrap();
    let token = pdfmarker::CancelToken::new();
    let trigger = token.clone();
    let highlighter = Highlighter::new(move |text: &str| -> Result<Vec<Phrase>, ProposalError> {
        if text.contains("page two") {
            trigger.cancel();
        }
        Ok(vec![Phrase::new("key finding")])
    })
    .with_cancel_token(token);

    let mut steps = Vec::new();
    let mut sink = CollectingSink::new();
    let report = highlighter
        .run(&doc, &mut sink, &mut |step: ProgressStep, pct: u8| {
            steps.push((step, pct))
        })
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Cancelled { pages_done: 2 });
    assert_eq!(report.total_rects(), 2);
    assert_eq!(sink.len(), 2);
    assert!(!steps.iter().any(|(s, _)| *s == ProgressStep::Complete));
}

#[test]
fn page_selection_limits_work() {
    let doc = Document::open(&five_pages(), None).unwrap();
    let highlighter =
        Highlighter::new(FixedPhrases::new(["key finding"])).with_options(HighlightOptions {
            pages: Some(vec![4, 0]),
            ..HighlightOptions::default()
        });
    let mut sink = CollectingSink::new();
    let report = highlighter.run(&doc, &mut sink, &mut NoProgress).unwrap();

    let order: Vec<_> = report.pages.iter().map(|p| p.page).collect();
    assert_eq!(order, vec![4, 0]);
    assert_eq!(sink.on_page(4).count(), 1);
    assert_eq!(sink.on_page(2).count(), 0);
}

#[test]
fn repeated_pages_are_drawn_once() {
    let doc = Document::open(&five_pages(), None).unwrap();
    let highlighter =
        Highlighter::new(FixedPhrases::new(["key finding"])).with_options(HighlightOptions {
            pages: Some(vec![2, 2, 0, 2]),
            ..HighlightOptions::default()
        });
    let mut sink = CollectingSink::new();
    let report = highlighter.run(&doc, &mut sink, &mut NoProgress).unwrap();

    let order: Vec<_> = report.pages.iter().map(|p| p.page).collect();
    assert_eq!(order, vec![2, 0]);
    assert_eq!(sink.on_page(2).count(), 1);
    assert_eq!(report.total_rects(), 2);
}

#[test]
fn cancel_early_in_long_document() {
    let texts: Vec<String> = (0..40).map(|i| format!("page {i}")).collect();
    let pages: Vec<Vec<&str>> = texts
        .iter()
        .map(|t| vec![t.as_str(), "key finding here"])
        .collect();
    let page_refs: Vec<&[&str]> = pages.iter().map(Vec::as_slice).collect();
    let doc = Document::open(&pdf_with_pages(&page_refs), None).unwrap();

    let token = pdfmarker::CancelToken::new();
    let trigger = token.clone();
    let highlighter = Highlighter::new(move |text: &str| -> Result<Vec<Phrase>, ProposalError> {
        if text.starts_with("page 3 ") {
            trigger.cancel();
        }
        Ok(vec![Phrase::new("key finding")])
    })
    .with_cancel_token(token);

    let mut sink = CollectingSink::new();
    let report = highlighter.run(&doc, &mut sink, &mut NoProgress).unwrap();
    assert_eq!(report.outcome, RunOutcome::Cancelled { pages_done: 4 });
    assert_eq!(report.pages.len(), 4);
    assert_eq!(sink.len(), 4);
}

#[test]
fn writer_output_reopens_with_same_page_count() {
    let bytes = five_pages();
    let doc = Document::open(&bytes, None).unwrap();
    let highlighter = Highlighter::new(FixedPhrases::new(["key finding"]));

    for mode in [HighlightMode::Overlay, HighlightMode::Annotation] {
        let mut writer = doc.highlight_writer(mode);
        let report = highlighter.run(&doc, &mut writer, &mut NoProgress).unwrap();
        assert_eq!(writer.pending(), report.total_rects());
        let out = writer.finish().unwrap();

        let reopened = Document::open(&out, None).unwrap();
        assert_eq!(reopened.page_count(), 5);
        assert_eq!(
            reopened.page_index(3).unwrap().value.text(),
            "page four key finding here "
        );
    }
}
