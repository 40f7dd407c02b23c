//! PDF loading and text cleanup

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Text of one PDF page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    /// PDF file name
    pub source: String,
    /// 0-based page index
    pub page: u32,
    pub text: String,
}

/// Load every `*.pdf` directly inside `folder`, one entry per page, files in name order.
pub fn load_pdfs(folder: impl AsRef<Path>) -> Result<Vec<PageText>> {
    let folder = folder.as_ref();
    let files = list_pdfs(folder)?;

    let mut pages = Vec::new();
    for path in &files {
        let loaded = load_pdf(path)?;
        tracing::info!("Loaded {} pages from {}", loaded.len(), path.display());
        pages.extend(loaded);
    }
    Ok(pages)
}

/// Sorted PDF paths in `folder` (non-recursive)
pub fn list_pdfs(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(Error::Config(format!(
            "PDF folder not found: {}",
            folder.display()
        )));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(Error::Config(format!(
            "No PDFs found in: {}",
            folder.display()
        )));
    }
    Ok(files)
}

fn load_pdf(path: &Path) -> Result<Vec<PageText>> {
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let doc = lopdf::Document::load(path)
        .map_err(|e| Error::file_parse(&source, format!("Failed to load PDF: {}", e)))?;

    // get_pages is keyed by 1-based page number
    let pages = doc
        .get_pages()
        .keys()
        .map(|&number| {
            let raw = doc.extract_text(&[number]).unwrap_or_else(|e| {
                tracing::debug!("No text for {} page {}: {}", source, number, e);
                String::new()
            });
            PageText {
                source: source.clone(),
                page: number.saturating_sub(1),
                text: clean_text(&normalize_glyphs(&raw)),
            }
        })
        .collect();

    Ok(pages)
}

/// Replace typographic ligatures and spaces that PDF fonts commonly emit
fn normalize_glyphs(text: &str) -> String {
    text.replace('\u{00A0}', " ")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
}

fn excess_newlines() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"))
}

fn excess_spaces() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]{2,}").expect("valid regex"))
}

fn page_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)page\s+\d+\s+of\s+\d+").expect("valid regex"))
}

/// Minimal cleanup: collapse blank-line runs and space runs, drop "Page N of M" markers.
pub fn clean_text(text: &str) -> String {
    let text = excess_newlines().replace_all(text, "\n\n");
    let text = excess_spaces().replace_all(&text, " ");
    let text = page_marker().replace_all(&text, "");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(clean_text("a  \t b"), "a b");
        assert_eq!(clean_text("a\tb"), "a\tb");
        assert_eq!(clean_text("  padded \n"), "padded");
    }

    #[test]
    fn test_clean_text_strips_page_markers() {
        assert_eq!(clean_text("Intro\nPAGE 3 of 12\nBody"), "Intro\n\nBody");
        assert_eq!(clean_text("page 1  of 2"), "");
    }

    #[test]
    fn test_normalize_glyphs() {
        assert_eq!(normalize_glyphs("e\u{FB03}cient\u{00A0}o\u{FB00}"), "efficient off");
    }

    #[test]
    fn test_missing_folder_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_pdfs(dir.path().join("missing"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_folder_without_pdfs_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let result = load_pdfs(dir.path());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_lists_pdfs_sorted_and_non_recursive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"").unwrap();
        std::fs::write(dir.path().join("a.PDF"), b"").unwrap();
        std::fs::write(dir.path().join("c.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("d.pdf"), b"").unwrap();

        let names: Vec<String> = list_pdfs(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn test_corrupt_pdf_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.pdf"), b"not a pdf").unwrap();
        let result = load_pdfs(dir.path());
        assert!(matches!(result, Err(Error::FileParse { ref filename, .. }) if filename == "broken.pdf"));
    }
}
