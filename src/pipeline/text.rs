//! Per-page text extraction.

use crate::error::PageIssue;
use crate::output::PageRecord;
use pdfium_render::prelude::*;
use tracing::{debug, warn};

/// Extract the raw text of every page, dropping blank ones.
///
/// A page whose text layer cannot be read is logged, recorded in `issues`,
/// and treated as blank.
pub fn extract_page_texts(document: &PdfDocument, issues: &mut Vec<PageIssue>) -> Vec<PageRecord> {
    let raw = document.pages().iter().enumerate().map(|(idx, page)| {
        let page_num = idx as u32 + 1;
        let text = match page.text() {
            Ok(text) => text.all(),
            Err(e) => {
                warn!("Page {}: cannot read text layer: {}", page_num, e);
                issues.push(PageIssue::TextUnreadable {
                    page: page_num,
                    detail: e.to_string(),
                });
                String::new()
            }
        };
        (page_num, text)
    });

    collect_page_records(raw)
}

/// Keep pages whose trimmed text is non-empty, in page order.
///
/// The stored text is left untrimmed; dataset builders trim when emitting.
pub fn collect_page_records(pages: impl IntoIterator<Item = (u32, String)>) -> Vec<PageRecord> {
    let mut records: Vec<PageRecord> = pages
        .into_iter()
        .filter_map(|(page, text)| {
            if text.trim().is_empty() {
                debug!("Page {}: blank, skipped", page);
                None
            } else {
                Some(PageRecord { page, text })
            }
        })
        .collect();
    records.sort_by_key(|r| r.page);
    records.dedup_by_key(|r| r.page);
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_pages_are_dropped() {
        let records = collect_page_records(vec![
            (1, "Intro".to_string()),
            (2, "  \n\t ".to_string()),
            (3, "".to_string()),
            (4, " Outro ".to_string()),
        ]);
        assert_eq!(
            records,
            vec![
                PageRecord {
                    page: 1,
                    text: "Intro".into()
                },
                PageRecord {
                    page: 4,
                    text: " Outro ".into()
                },
            ]
        );
    }

    #[test]
    fn page_numbers_strictly_increase() {
        let records = collect_page_records(vec![
            (3, "c".to_string()),
            (1, "a".to_string()),
            (2, "b".to_string()),
        ]);
        let pages: Vec<u32> = records.iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![1, 2, 3]);
        assert!(records.windows(2).all(|w| w[0].page < w[1].page));
    }
}
