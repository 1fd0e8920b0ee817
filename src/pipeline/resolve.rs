//! Page-image resolution: choose the one authoritative image for a page.
//!
//! Candidates are named `page_<N>.<ext>` (primary render) or
//! `page_<N>_img_<K>.<ext>` (embedded image). Matching is exact on `<N>`, so
//! page 1 never picks up `page_10.png`. Ties are broken by lexical file-name
//! order, which does not depend on the platform's directory listing order.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

static CANDIDATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^page_(\d+)(_img_(\d+))?\.[A-Za-z0-9]+$").expect("valid candidate regex")
});

/// A file name parsed against the candidate naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateName {
    pub page: u32,
    /// `Some(K)` for an embedded image, `None` for the primary render.
    pub embedded_index: Option<u32>,
}

impl CandidateName {
    /// Parse a bare file name; `None` when it does not follow the convention.
    pub fn parse(file_name: &str) -> Option<Self> {
        let caps = CANDIDATE_RE.captures(file_name)?;
        let page = caps.get(1)?.as_str().parse().ok()?;
        let embedded_index = match caps.get(3) {
            Some(k) => Some(k.as_str().parse().ok()?),
            None => None,
        };
        Some(Self {
            page,
            embedded_index,
        })
    }

    pub fn is_primary(&self) -> bool {
        self.embedded_index.is_none()
    }
}

/// Find the image for `page` inside `image_dir`.
///
/// Preference: the first primary candidate in lexical order, else the first
/// embedded candidate. Returns `None` when nothing matches or the directory
/// cannot be read; the caller skips the page.
pub fn resolve_page_image(image_dir: &Path, page: u32) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(image_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot list image directory {}: {}", image_dir.display(), e);
            return None;
        }
    };

    let names = entries.filter_map(|entry| {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", image_dir.display(), e);
                return None;
            }
        };
        match entry.file_type() {
            Ok(t) if t.is_file() => {}
            Ok(_) => return None,
            Err(e) => {
                warn!("Skipping {}: {}", entry.path().display(), e);
                return None;
            }
        }
        entry
            .file_name()
            .into_string()
            .map_err(|name| debug!("Skipping non-UTF-8 file name {:?}", name))
            .ok()
    });

    let chosen = select_candidate(names, page)?;
    debug!("Page {}: resolved image {}", page, chosen);
    Some(image_dir.join(chosen))
}

/// Pure selection over file names; see [`resolve_page_image`].
pub fn select_candidate(names: impl IntoIterator<Item = String>, page: u32) -> Option<String> {
    let mut matches: Vec<(CandidateName, String)> = names
        .into_iter()
        .filter_map(|name| {
            let parsed = CandidateName::parse(&name)?;
            (parsed.page == page).then_some((parsed, name))
        })
        .collect();

    if matches.is_empty() {
        return None;
    }
    matches.sort_by(|a, b| a.1.cmp(&b.1));

    let primary = matches.iter().position(|(c, _)| c.is_primary());
    let (_, name) = matches.swap_remove(primary.unwrap_or(0));
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_convention() {
        let c = CandidateName::parse("page_3.png").unwrap();
        assert_eq!(c.page, 3);
        assert!(c.is_primary());

        let c = CandidateName::parse("page_12_img_2.jpeg").unwrap();
        assert_eq!(c.page, 12);
        assert_eq!(c.embedded_index, Some(2));
        assert!(!c.is_primary());
        assert!(CandidateName::parse("page_12_img_2.JPG").is_some());

        assert!(CandidateName::parse("page_.png").is_none());
        assert!(CandidateName::parse("cover.png").is_none());
        assert!(CandidateName::parse("page_3.png.bak~").is_none());
        assert!(CandidateName::parse("xpage_3.png").is_none());
    }

    #[test]
    fn primary_beats_embedded() {
        let chosen = select_candidate(names(&["page_3_img_1.png", "page_3.png"]), 3);
        assert_eq!(chosen.as_deref(), Some("page_3.png"));
    }

    #[test]
    fn page_number_matches_exactly() {
        let list = names(&["page_10.png", "page_1_img_1.png", "page_11.png"]);
        assert_eq!(
            select_candidate(list.clone(), 1).as_deref(),
            Some("page_1_img_1.png")
        );
        assert_eq!(select_candidate(list, 10).as_deref(), Some("page_10.png"));
    }

    #[test]
    fn embedded_only_picks_lexical_first() {
        let chosen = select_candidate(
            names(&["page_4_img_2.png", "page_4_img_10.jpeg", "page_4_img_1.png"]),
            4,
        );
        assert_eq!(chosen.as_deref(), Some("page_4_img_1.png"));
    }

    #[test]
    fn several_primaries_pick_lexical_first() {
        let chosen = select_candidate(names(&["page_2.png", "page_2.jpeg"]), 2);
        assert_eq!(chosen.as_deref(), Some("page_2.jpeg"));
    }

    #[test]
    fn no_candidates_is_none() {
        assert_eq!(select_candidate(names(&["page_5.png"]), 6), None);
        assert_eq!(select_candidate(Vec::<String>::new(), 1), None);
    }

    #[test]
    fn resolves_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page_3.png", "page_3_img_1.png", "page_30.png"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("page_7.png")).unwrap();

        assert_eq!(
            resolve_page_image(dir.path(), 3),
            Some(dir.path().join("page_3.png"))
        );
        assert_eq!(resolve_page_image(dir.path(), 7), None);
        assert_eq!(resolve_page_image(&dir.path().join("missing"), 3), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_names_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(OsStr::from_bytes(b"page_4\xff.png")), b"x").unwrap();
        std::fs::write(dir.path().join("page_4_img_1.png"), b"x").unwrap();

        assert_eq!(
            resolve_page_image(dir.path(), 4),
            Some(dir.path().join("page_4_img_1.png"))
        );
    }
}
