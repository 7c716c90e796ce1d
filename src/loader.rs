//! Corpus loading: file discovery, text extraction, page-granular chunking.
//!
//! The loader walks the corpus directory, extracts plain text per format
//! (PDF via `pdf-extract`, everything else as UTF-8), and splits each
//! document into [`Chunk`]s stamped with their originating file and page.
//!
//! A degraded corpus is never fatal: a missing directory, an empty
//! directory, or individual unreadable documents all log a warning and the
//! load continues with whatever remains.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::chunk::split_text;
use crate::config::CorpusConfig;
use crate::models::Chunk;

/// Page separator emitted between PDF pages by the text extractor.
const PAGE_BREAK: char = '\u{0C}';

/// Per-document extraction failure. The pipeline skips the document and
/// keeps loading; nothing here panics or aborts the corpus.
#[derive(Debug)]
pub enum ExtractError {
    Read(String),
    Pdf(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Read(e) => write!(f, "failed to read file: {}", e),
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Load every matching document under the corpus directory into chunks.
///
/// Returns an empty sequence (with a logged warning) when the directory is
/// missing or holds no matching documents — callers treat an empty corpus
/// as degraded, not fatal.
pub fn load_corpus(config: &CorpusConfig, max_tokens: usize) -> Vec<Chunk> {
    let root = &config.dir;
    if !root.exists() {
        warn!("corpus directory '{}' does not exist", root.display());
        return Vec::new();
    }

    let files = match discover_files(config) {
        Ok(files) => files,
        Err(e) => {
            warn!("corpus scan failed: {:#}", e);
            return Vec::new();
        }
    };

    if files.is_empty() {
        warn!("no documents matched in '{}'", root.display());
        return Vec::new();
    }

    let mut chunks = Vec::new();
    for (path, relative) in &files {
        match load_document(path, relative, max_tokens) {
            Ok(doc_chunks) => {
                info!("loaded {} chunks from {}", doc_chunks.len(), relative);
                chunks.extend(doc_chunks);
            }
            Err(e) => {
                warn!("skipping '{}': {}", relative, e);
            }
        }
    }

    chunks
}

/// Enumerate matching files, sorted by relative path for deterministic
/// chunk ordering.
fn discover_files(config: &CorpusConfig) -> anyhow::Result<Vec<(PathBuf, String)>> {
    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();

    let walker = WalkDir::new(&config.dir).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable corpus entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(&config.dir).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }
        if !include_set.is_match(&rel_str) {
            continue;
        }

        files.push((path.to_path_buf(), rel_str));
    }

    files.sort_by(|a, b| a.1.cmp(&b.1));

    Ok(files)
}

/// Extract one document into chunks.
///
/// PDF pages are split on the extractor's form-feed separator, so a chunk's
/// `page_number` is the actual page it came from (multiple chunks can share
/// a page). For plain text and Markdown the page index is the chunk's
/// ordinal within the file.
fn load_document(path: &Path, relative: &str, max_tokens: usize) -> Result<Vec<Chunk>, ExtractError> {
    let mut chunks = Vec::new();

    if is_pdf(path) {
        let bytes = std::fs::read(path).map_err(|e| ExtractError::Read(e.to_string()))?;
        let text = pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;
        for (page_number, page) in text.split(PAGE_BREAK).enumerate() {
            for piece in split_text(page, max_tokens) {
                chunks.push(Chunk {
                    text: piece,
                    source_id: relative.to_string(),
                    page_number,
                });
            }
        }
    } else {
        let body =
            std::fs::read_to_string(path).map_err(|e| ExtractError::Read(e.to_string()))?;
        for (page_number, piece) in split_text(&body, max_tokens).into_iter().enumerate() {
            chunks.push(Chunk {
                text: piece,
                source_id: relative.to_string(),
                page_number,
            });
        }
    }

    Ok(chunks)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn corpus_config(dir: &Path) -> CorpusConfig {
        CorpusConfig {
            dir: dir.to_path_buf(),
            include_globs: vec!["**/*.md".to_string(), "**/*.txt".to_string()],
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }

    #[test]
    fn test_missing_directory_returns_empty() {
        let config = corpus_config(Path::new("/nonexistent/docbot-corpus"));
        assert!(load_corpus(&config, 700).is_empty());
    }

    #[test]
    fn test_empty_directory_returns_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = corpus_config(tmp.path());
        assert!(load_corpus(&config, 700).is_empty());
    }

    #[test]
    fn test_chunks_carry_provenance() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(
            tmp.path().join("guide.md"),
            "First section about installation.\n\nSecond section about upgrades.",
        )
        .unwrap();

        let chunks = load_corpus(&corpus_config(tmp.path()), 700);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source_id, "guide.md");
        assert_eq!(chunks[0].page_number, 0);
        assert!(chunks[0].text.contains("installation"));
    }

    #[test]
    fn test_text_page_numbers_are_chunk_ordinals() {
        let tmp = tempfile::TempDir::new().unwrap();
        let body = (0..10)
            .map(|i| format!("Paragraph number {} with some filler words.", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        fs::write(tmp.path().join("long.txt"), body).unwrap();

        let chunks = load_corpus(&corpus_config(tmp.path()), 10);
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.page_number, i);
        }
    }

    #[test]
    fn test_unreadable_document_is_skipped() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(tmp.path().join("good.md"), "Readable content here.").unwrap();
        // Invalid UTF-8: read_to_string fails, the document is skipped.
        fs::write(tmp.path().join("bad.md"), [0xff, 0xfe, 0xfd]).unwrap();

        let chunks = load_corpus(&corpus_config(tmp.path()), 700);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source_id, "good.md");
    }

    #[test]
    fn test_files_load_in_sorted_order() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(tmp.path().join("zeta.md"), "Zeta content.").unwrap();
        fs::write(tmp.path().join("alpha.md"), "Alpha content.").unwrap();

        let chunks = load_corpus(&corpus_config(tmp.path()), 700);
        let sources: Vec<&str> = chunks.iter().map(|c| c.source_id.as_str()).collect();
        assert_eq!(sources, vec!["alpha.md", "zeta.md"]);
    }

    #[test]
    fn test_exclude_globs_respected() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(tmp.path().join("keep.md"), "Kept.").unwrap();
        fs::write(tmp.path().join("drop.md"), "Dropped.").unwrap();

        let mut config = corpus_config(tmp.path());
        config.exclude_globs = vec!["drop.md".to_string()];

        let chunks = load_corpus(&config, 700);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source_id, "keep.md");
    }
}
