//! Loads policy documents from a directory for the in-memory index.
//!
//! Every `.txt` and `.md` file under the directory is read. Form feeds
//! (as written by `pdftotext`) separate pages; a file with more than one
//! page gets 1-based page numbers, a single-page file gets none.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::Document;
use crate::core::chunking::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP, split_text};

/// File extensions picked up by [`load_directory`].
const EXTENSIONS: [&str; 2] = ["txt", "md"];

/// Page separator.
const FORM_FEED: char = '\u{000C}';

/// Reads and chunks every supported file under `dir`, recursively.
///
/// Files are visited in path order so the resulting index is stable.
/// Files that are not valid UTF-8 are skipped with a warning.
///
/// # Errors
///
/// Returns an I/O error if `dir` (or a subdirectory) cannot be read.
pub fn load_directory(dir: &Path) -> std::io::Result<Vec<Document>> {
    let mut files = Vec::new();
    collect_files(dir, &mut files)?;
    files.sort();

    let mut documents = Vec::new();
    for path in &files {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let before = documents.len();
                documents.extend(chunk_file(&path.display().to_string(), &text));
                debug!(
                    path = %path.display(),
                    chunks = documents.len() - before,
                    "ingested file"
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                warn!(path = %path.display(), "skipping non-UTF-8 file");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(documents)
}

/// Splits one file's text into page-tagged chunks.
#[must_use]
pub fn chunk_file(source: &str, text: &str) -> Vec<Document> {
    let pages: Vec<&str> = text.split(FORM_FEED).collect();
    let paginated = pages.len() > 1;

    pages
        .iter()
        .enumerate()
        .flat_map(|(i, page)| {
            let number = if paginated {
                u32::try_from(i + 1).ok()
            } else {
                None
            };
            split_text(page, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP)
                .into_iter()
                .map(move |chunk| Document::new(chunk, source, number))
        })
        .collect()
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        // Symlinked directories are not followed, so link cycles terminate.
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(&path, files)?;
        } else if (file_type.is_file() || path.is_file())
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        {
            files.push(path);
        }
    }
    Ok(())
}
