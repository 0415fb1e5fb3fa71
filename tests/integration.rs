//! Integration tests for the Folio pagination pipeline.
//!
//! These tests exercise the full path from an HTML fragment to pages and
//! export payloads. They verify:
//! - Blocks break onto new pages at the right places
//! - Lists and tables split with numbering and headers intact
//! - Broken and oversized images never stall pagination
//! - Headings stay with the content that follows them
//! - The measurement workspace is reusable and can be torn down

use std::io::{Cursor, Read};

use folio::config::FolioConfig;
use folio::error::FolioError;
use folio::export::{DocxBody, ExportFormat, Exporter, OpcWriter, PrintEngine};
use folio::layout::{mark_list_continuations, trim_empty_pages, CONTINUATION_CLASS};
use folio::model::*;
use folio::parser::ListPolicy;
use folio::present::{PreviewSession, PreviewState, Presenter};
use folio::style::{StyleResolver, Stylesheet};
use folio::{paginate_html, parse_blocks, Folio};
use zip::ZipArchive;

// ─── Helpers ────────────────────────────────────────────────────

const PNG_1X1: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

fn block(height: f64, text: &str) -> String {
    format!("<p style=\"height: {}px; margin: 0\">{}</p>", height, text)
}

fn item(height: f64, text: &str) -> String {
    format!("<li style=\"height: {}px; margin: 0\">{}</li>", height, text)
}

fn paginate(html: &str) -> PaginationResult {
    paginate_html(html, "", &FolioConfig::default()).unwrap()
}

fn page_html(result: &PaginationResult, page: usize) -> String {
    result.dom_pages[page].to_html()
}

fn entry_kinds(result: &PaginationResult, page: usize) -> Vec<BlockKind> {
    result.pages[page].entries.iter().map(|e| e.kind).collect()
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

// ─── Page Overflow Tests ────────────────────────────────────────

#[test]
fn test_empty_input_has_no_pages() {
    let result = paginate("");
    assert_eq!(result.page_count(), 0);
}

#[test]
fn test_three_tall_paragraphs_take_three_pages() {
    let html = format!("{}{}{}", block(500.0, "one"), block(500.0, "two"), block(500.0, "three"));
    let result = paginate(&html);
    assert_eq!(result.page_count(), 3);
    for (i, text) in ["one", "two", "three"].iter().enumerate() {
        assert_eq!(result.pages[i].entries.len(), 1);
        assert!(page_html(&result, i).contains(text));
        assert_eq!(result.pages[i].entries[0].fragment, Fragment::Whole);
    }
}

#[test]
fn test_blocks_that_fit_share_a_page() {
    let html = format!("{}{}{}", block(400.0, "a"), block(400.0, "b"), block(400.0, "c"));
    let result = paginate(&html);
    assert_eq!(result.page_count(), 2);
    assert_eq!(result.pages[0].entries.len(), 2);
    assert!(result.pages[0].used_height() <= 952.0);
}

#[test]
fn test_page_order_follows_block_order() {
    let html: String = (0..12).map(|i| block(300.0, &format!("b{}", i))).collect();
    let result = paginate(&html);
    let ids: Vec<usize> = result
        .pages
        .iter()
        .flat_map(|p| p.entries.iter().map(|e| e.block_id.0))
        .collect();
    assert_eq!(ids, (0..12).collect::<Vec<_>>());
    for page in &result.pages {
        assert!(page.used_height() <= 952.0 + 0.01);
    }
}

#[test]
fn test_long_paragraph_splits_at_word_boundary() {
    let words: String = (0..3000).map(|i| format!("word{} ", i)).collect();
    let html = format!("<p>{}</p>", words);
    let result = paginate(&html);
    assert!(result.page_count() >= 2);

    let fragments: Vec<Fragment> = result.pages.iter().map(|p| p.entries[0].fragment).collect();
    assert_eq!(fragments[0], Fragment::Head);
    assert_eq!(*fragments.last().unwrap(), Fragment::Tail);

    // every word survives exactly once
    let all = result
        .dom_pages
        .iter()
        .map(|d| d.content.text_content())
        .collect::<Vec<_>>()
        .join(" ");
    assert_eq!(count(&all, "word2999"), 1);
    assert_eq!(all.split_whitespace().count(), 3000);
}

#[test]
fn test_page_tall_paragraph_fills_partly_used_page() {
    let words: String = (0..3000).map(|i| format!("word{} ", i)).collect();
    let html = format!("{}<p style=\"margin: 0\">{}</p>", block(300.0, "intro"), words);
    let result = paginate(&html);

    let first = &result.pages[0];
    assert_eq!(first.entries.len(), 2);
    assert_eq!(first.entries[0].fragment, Fragment::Whole);
    assert_eq!(first.entries[1].fragment, Fragment::Head);
    assert!(first.entries[1].height > 600.0, "head was {}", first.entries[1].height);
    assert_eq!(result.pages[1].entries[0].fragment, Fragment::Middle);

    let all = result
        .dom_pages
        .iter()
        .map(|d| d.content.text_content())
        .collect::<Vec<_>>()
        .join(" ");
    assert_eq!(all.split_whitespace().filter(|w| w.starts_with("word")).count(), 3000);
}

// ─── List Tests ─────────────────────────────────────────────────

#[test]
fn test_list_splits_and_marks_continuation() {
    let mut items = String::new();
    for i in 1..=5 {
        items.push_str(&item(150.0, &format!("i{}", i)));
    }
    items.push_str(&item(200.0, "i6"));
    for i in 7..=10 {
        items.push_str(&item(62.5, &format!("i{}", i)));
    }
    let html = format!("<ul style=\"margin: 0\">{}</ul>", items);
    let result = paginate(&html);

    assert_eq!(result.page_count(), 2);
    let first = &result.pages[0].entries[0];
    let second = &result.pages[1].entries[0];
    assert_eq!(first.fragment, Fragment::Head);
    assert_eq!(second.fragment, Fragment::Tail);
    assert_eq!(first.block_id, second.block_id);
    assert_eq!(count(&first.html, "<li"), 6);
    assert_eq!(count(&second.html, "<li"), 4);
    assert!(first.html.starts_with("<ul"));
    assert!(second.html.starts_with("<ul"));
    assert!(second.html.contains("i7") && !second.html.contains("i6"));

    assert!(second.continuation);
    assert!(page_html(&result, 1).contains(CONTINUATION_CLASS));
    assert!(!page_html(&result, 0).contains(CONTINUATION_CLASS));
}

#[test]
fn test_ordered_list_keeps_numbering_across_pages() {
    let items: String = (1..=8).map(|i| item(200.0, &format!("n{}", i))).collect();
    let html = format!("<ol style=\"margin: 0\">{}</ol>", items);
    let result = paginate(&html);
    assert_eq!(result.page_count(), 2);
    assert!(result.pages[1].entries[0].html.contains("start=\"5\""));
}

#[test]
fn test_per_item_policy_numbers_each_item() {
    let blocks = parse_blocks(r#"<ol start="3"><li>a</li><li>b</li></ol>"#, "", ListPolicy::PerItem);
    assert_eq!(blocks.len(), 2);
    let numbers: Vec<usize> = blocks
        .iter()
        .map(|b| match &b.content {
            BlockContent::ListItem { number, .. } => *number,
            other => panic!("expected list item, got {:?}", other.kind()),
        })
        .collect();
    assert_eq!(numbers, vec![3, 4]);
    assert_eq!(blocks[1].element().attr("start"), Some("4"));
}

// ─── Table Tests ────────────────────────────────────────────────

#[test]
fn test_table_split_repeats_header() {
    let rows: String = (0..30)
        .map(|i| format!("<tr><td style=\"height: 40px; padding: 0\">r{}</td></tr>", i))
        .collect();
    let html = format!(
        "<table><thead><tr><th style=\"height: 40px; padding: 0\">Head</th></tr></thead><tbody>{}</tbody></table>",
        rows
    );
    let result = paginate(&html);
    assert_eq!(result.page_count(), 2);

    let first = &result.pages[0].entries[0].html;
    let second = &result.pages[1].entries[0].html;
    assert_eq!(count(first, "<tr"), 23);
    assert_eq!(count(second, "<tr"), 9);
    assert!(second.contains("<thead>") && second.contains("Head"));
    assert!(second.contains("r22") && !second.contains("r21<"));
}

// ─── Image Tests ────────────────────────────────────────────────

#[test]
fn test_broken_image_becomes_placeholder() {
    let html = format!(
        "{}<img src=\"missing.png\" width=\"300\" height=\"200\">{}",
        block(900.0, "before"),
        block(500.0, "after")
    );
    let result = paginate(&html);
    assert_eq!(result.page_count(), 2);

    let placeholder = &result.pages[0].entries[1];
    assert_eq!(placeholder.kind, BlockKind::Image);
    assert_eq!(placeholder.fragment, Fragment::Placeholder);
    assert_eq!(placeholder.height, 24.0);
    assert!(page_html(&result, 0).contains("Image unavailable"));
    assert!(page_html(&result, 1).contains("after"));
}

#[test]
fn test_oversized_image_is_scaled_onto_its_own_page() {
    let html = format!(
        "{}<img src=\"{}\" width=\"600\" height=\"1400\">",
        block(200.0, "intro"),
        PNG_1X1
    );
    let result = paginate(&html);
    assert_eq!(result.page_count(), 2);
    assert_eq!(entry_kinds(&result, 0), vec![BlockKind::Paragraph]);
    assert_eq!(entry_kinds(&result, 1), vec![BlockKind::Image]);

    let image = &result.pages[1].entries[0];
    assert!(image.height <= 952.0 * 0.9 + 0.01, "height was {}", image.height);
    assert!(image.height > 800.0);
}

#[test]
fn test_image_that_fits_is_untouched() {
    let html = format!("<img src=\"{}\" width=\"100\" height=\"50\">", PNG_1X1);
    let result = paginate(&html);
    assert_eq!(result.pages[0].entries[0].height, 50.0);
    assert!(result.pages[0].entries[0].html.contains("height=\"50\""));
}

// ─── Heading Tests ──────────────────────────────────────────────

#[test]
fn test_heading_moves_with_following_block() {
    let html = format!(
        "{}<h2 style=\"height: 30px; margin: 0\">Title</h2>{}",
        block(880.0, "body"),
        block(200.0, "next")
    );
    let result = paginate(&html);
    assert_eq!(result.page_count(), 2);
    assert_eq!(entry_kinds(&result, 0), vec![BlockKind::Paragraph]);
    assert_eq!(entry_kinds(&result, 1), vec![BlockKind::Heading, BlockKind::Paragraph]);
}

#[test]
fn test_last_heading_stays_put() {
    let html = format!(
        "{}<h2 style=\"height: 30px; margin: 0\">Closing</h2>",
        block(880.0, "body")
    );
    let result = paginate(&html);
    assert_eq!(result.page_count(), 1);
}

#[test]
fn test_heading_before_image_stays_put() {
    let html = format!(
        "{}<h2 style=\"height: 30px; margin: 0\">Figure</h2><img src=\"{}\" width=\"100\" height=\"100\">",
        block(880.0, "body"),
        PNG_1X1
    );
    let result = paginate(&html);
    assert_eq!(result.page_count(), 2);
    assert_eq!(entry_kinds(&result, 0), vec![BlockKind::Paragraph, BlockKind::Heading]);
    assert_eq!(entry_kinds(&result, 1), vec![BlockKind::Image]);
}

// ─── Trim & Continuation Tests ──────────────────────────────────

#[test]
fn test_post_processing_is_idempotent() {
    let html = format!("{}{}", block(700.0, "a"), block(700.0, "b"));
    let mut result = paginate(&html);
    let before = result.clone();
    trim_empty_pages(&mut result);
    mark_list_continuations(&mut result);
    assert_eq!(result, before);
}

// ─── Parser Tests ───────────────────────────────────────────────

#[test]
fn test_block_html_reparses_to_same_kind() {
    let html = format!(
        "<h1>T</h1><p>text</p><ul><li>a</li></ul><table><tr><td>x</td></tr></table><img src=\"{}\">",
        PNG_1X1
    );
    let blocks = parse_blocks(&html, "", ListPolicy::WholeList);
    assert_eq!(blocks.len(), 5);
    for b in &blocks {
        let again = parse_blocks(&b.element().to_html(), "", ListPolicy::WholeList);
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].kind(), b.kind());
    }
}

// ─── Workspace Tests ────────────────────────────────────────────

#[test]
fn test_workspace_is_reused_and_reset() {
    let mut folio = Folio::new(FolioConfig::default());
    let html = format!("{}{}", block(600.0, "a"), block(600.0, "b"));
    let first = folio.paginate(&html).unwrap();
    assert!(folio.workspace().is_clear());
    let second = folio.paginate(&html).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_released_workspace_refuses_work() {
    let mut folio = Folio::new(FolioConfig::default());
    folio.release();
    let err = folio.paginate("<p>x</p>").unwrap_err();
    assert!(matches!(err, FolioError::WorkspaceUnavailable(_)));
}

#[test]
fn test_zero_height_page_is_a_caller_error() {
    let config = FolioConfig::from_json(r#"{ "page": { "contentHeight": 0 } }"#).unwrap();
    let err = paginate_html("<p>x</p>", "", &config).unwrap_err();
    assert!(matches!(err, FolioError::MissingContainer(_)));
}

#[test]
fn test_stylesheet_affects_measurement() {
    let html = "<p class=\"tall\">a</p><p class=\"tall\">b</p>";
    let short = paginate_html(html, "", &FolioConfig::default()).unwrap();
    let tall = paginate_html(html, ".tall { height: 600px; margin: 0 }", &FolioConfig::default()).unwrap();
    assert_eq!(short.page_count(), 1);
    assert_eq!(tall.page_count(), 2);
}

// ─── Preview Tests ──────────────────────────────────────────────

#[test]
fn test_preview_commits_only_latest_run() {
    let config = FolioConfig::default();
    let mut session = PreviewSession::new(Presenter::new(Stylesheet::empty(), config.page));
    let stale = session.begin();
    let latest = session.begin();

    let old = paginate(&block(100.0, "old"));
    let new = paginate(&format!("{}{}", block(600.0, "new"), block(600.0, "new")));
    assert!(matches!(session.finish(stale, Ok(old)), Err(FolioError::Superseded { .. })));
    session.finish(latest, Ok(new)).unwrap();

    assert_eq!(session.state(), &PreviewState::Ready { pages: 2 });
    assert!(session.pages().iter().all(|p| !p.contains("old")));
}

// ─── Export Tests ───────────────────────────────────────────────

struct FakePdf;

impl PrintEngine for FakePdf {
    fn print_to_pdf(&self, document_html: &str, _page: &PageConfig) -> folio::error::Result<Vec<u8>> {
        assert!(document_html.contains("@page"));
        Ok(b"%PDF-1.7\n".to_vec())
    }
}

fn export(format: ExportFormat, html: &str) -> Vec<u8> {
    let resolver = StyleResolver::default();
    let writer = OpcWriter::default();
    Exporter::new(&resolver, PageConfig::a4(), &FakePdf, &writer)
        .export_as(format, "Notes", html)
        .unwrap()
}

fn zip_entry(bytes: &[u8], name: &str) -> Option<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).ok()?;
    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();
    Some(text)
}

#[test]
fn test_docx_export_is_a_word_package() {
    let bytes = export(
        ExportFormat::Docx,
        "<h1>Notes</h1><ol><li>one</li><li>two</li></ol>",
    );
    assert!(bytes.starts_with(b"PK"));
    let document = zip_entry(&bytes, "word/document.xml").unwrap();
    assert!(document.contains("w:val=\"Heading1\""));
    assert!(document.contains(">2.\t<"));
    assert!(zip_entry(&bytes, "[Content_Types].xml").is_some());
}

#[test]
fn test_pptx_export_is_a_presentation_package() {
    let bytes = export(
        ExportFormat::Pptx,
        "<h1>Notes</h1><ul><li>one</li></ul><h2>More</h2><p>two</p>",
    );
    assert!(bytes.starts_with(b"PK"));
    assert!(zip_entry(&bytes, "ppt/slides/slide1.xml").unwrap().contains(">one<"));
    assert!(zip_entry(&bytes, "ppt/slides/slide2.xml").unwrap().contains(">More<"));
    assert!(zip_entry(&bytes, "ppt/slides/slide3.xml").is_none());
    assert!(zip_entry(&bytes, "ppt/presentation.xml").is_some());
}

#[test]
fn test_pdf_export_bypasses_pagination() {
    let html: String = (0..5).map(|_| block(500.0, "x")).collect();
    let bytes = export(ExportFormat::Pdf, &html);
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn test_docx_body_uses_whole_lists() {
    let blocks = parse_blocks("<ul><li>a</li><li>b</li></ul>", "", ListPolicy::WholeList);
    let body = DocxBody::from_blocks(&blocks, &PageConfig::a4());
    assert_eq!(body.elements.len(), 2);
}
