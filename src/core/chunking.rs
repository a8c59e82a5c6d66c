//! Text splitting for document ingestion.
//!
//! Splits text into overlapping chunks measured in grapheme clusters,
//! preferring to break at paragraph, then line, then word boundaries.

use unicode_segmentation::UnicodeSegmentation;

/// Default chunk size in grapheme clusters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between consecutive chunks.
pub const DEFAULT_OVERLAP: usize = 200;

/// Break candidates, most preferred first.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Splits `text` into chunks of at most `chunk_size` grapheme clusters,
/// with roughly `overlap` clusters repeated between neighbours.
///
/// Returns an empty vector for blank input. Chunks are trimmed.
#[must_use]
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size - 1);

    // bounds[g] is the byte offset of grapheme g; the last entry is text.len().
    let bounds: Vec<usize> = text
        .grapheme_indices(true)
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = bounds.len() - 1;

    if total <= chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let hard_end = (start + chunk_size).min(total);
        let end = if hard_end == total {
            total
        } else {
            find_break(text, &bounds, start, hard_end)
        };

        let chunk = text[bounds[start]..bounds[end]].trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        if end == total {
            break;
        }

        start = overlap_start(text, &bounds, start, end, overlap);
    }

    chunks
}

/// Finds the grapheme index to end a chunk at, searching back from `hard_end`.
///
/// Only accepts a separator in the second half of the window so chunks do
/// not shrink to slivers.
fn find_break(text: &str, bounds: &[usize], start: usize, hard_end: usize) -> usize {
    let window = &text[bounds[start]..bounds[hard_end]];
    let min_end = start + (hard_end - start) / 2;

    for sep in SEPARATORS {
        if let Some(pos) = window.rfind(sep) {
            let byte = bounds[start] + pos + sep.len();
            if let Ok(g) = bounds.binary_search(&byte)
                && g > min_end
            {
                return g;
            }
        }
    }
    hard_end
}

/// Picks where the next chunk starts: `overlap` clusters before `end`,
/// nudged forward to a word start. Always makes progress.
fn overlap_start(text: &str, bounds: &[usize], start: usize, end: usize, overlap: usize) -> usize {
    let candidate = end.saturating_sub(overlap).max(start + 1);
    if candidate >= end {
        return end;
    }

    let region = &text[bounds[candidate]..bounds[end]];
    region
        .find(char::is_whitespace)
        .and_then(|pos| {
            let byte = bounds[candidate] + pos + 1;
            bounds.binary_search(&byte).ok()
        })
        .filter(|&g| g < end)
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn words(n: usize) -> String {
        (0..n)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test_case("" ; "empty")]
    #[test_case("   \n\n  " ; "whitespace only")]
    fn test_blank_input(text: &str) {
        assert!(split_text(text, 100, 10).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = split_text("  A short policy paragraph.  ", 100, 20);
        assert_eq!(chunks, vec!["A short policy paragraph.".to_string()]);
    }

    #[test]
    fn test_chunks_respect_size() {
        let text = words(500);
        let chunks = split_text(&text, 120, 20);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.graphemes(true).count() <= 120, "chunk too long: {chunk}");
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text = words(300);
        let chunks = split_text(&text, 100, 30);
        for pair in chunks.windows(2) {
            let last_word = pair[0].split_whitespace().last().unwrap_or_default();
            assert!(
                pair[1].contains(last_word),
                "expected '{last_word}' to be repeated in next chunk"
            );
        }
    }

    #[test]
    fn test_prefers_paragraph_break() {
        let first = "a".repeat(70);
        let second = "b".repeat(70);
        let text = format!("{first}\n\n{second}");
        let chunks = split_text(&text, 100, 0);
        assert_eq!(chunks[0], first);
        assert_eq!(chunks[1], second);
    }

    #[test]
    fn test_covers_whole_text() {
        let text = words(250);
        let chunks = split_text(&text, 80, 10);
        assert!(text.starts_with(chunks[0].as_str()));
        assert!(text.ends_with(chunks[chunks.len() - 1].as_str()));
    }

    #[test]
    fn test_unbroken_text_hard_splits() {
        let text = "x".repeat(250);
        let chunks = split_text(&text, 100, 0);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 50);
    }

    #[test]
    fn test_overlap_larger_than_size_still_progresses() {
        let text = words(100);
        let chunks = split_text(&text, 20, 500);
        assert!(!chunks.is_empty());
        assert!(chunks.len() < text.len());
    }

    #[test]
    fn test_multibyte_graphemes() {
        let text = "é".repeat(30);
        let chunks = split_text(&text, 10, 2);
        for chunk in &chunks {
            assert!(chunk.graphemes(true).count() <= 10);
        }
    }
}
