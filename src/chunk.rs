//! Paragraph-boundary text splitter.
//!
//! Splits page or document text into pieces that respect a configurable
//! `max_tokens` limit. Splitting occurs on paragraph boundaries (`\n\n`)
//! to preserve semantic coherence within each piece.
//!
//! # Algorithm
//!
//! 1. Convert `max_tokens` to `max_chars` using a 4 chars/token ratio.
//! 2. Split text on `\n\n` paragraph boundaries.
//! 3. Accumulate paragraphs into a buffer until adding the next paragraph
//!    would exceed `max_chars`.
//! 4. When exceeded, flush the buffer as a piece and start a new one.
//! 5. If a single paragraph exceeds `max_chars`, perform a hard split at
//!    the nearest newline or space boundary.
//!
//! Whitespace-only input produces no pieces; the loader drops empty pages
//! rather than indexing blanks.

/// Approximate characters-per-token ratio.
///
/// A rough heuristic (4 chars ≈ 1 token). Good enough to keep grounding
/// context inside model limits without pulling in a tokenizer.
const CHARS_PER_TOKEN: usize = 4;

/// Split text into pieces on paragraph boundaries, respecting `max_tokens`.
///
/// Pieces are returned in document order. Oversized paragraphs are
/// hard-split at space/newline boundaries, snapped to UTF-8 char
/// boundaries so multibyte text never panics.
pub fn split_text(text: &str, max_tokens: usize) -> Vec<String> {
    let max_chars = max_tokens * CHARS_PER_TOKEN;

    if text.trim().is_empty() {
        return Vec::new();
    }

    let paragraphs: Vec<&str> = text.split("\n\n").collect();
    let mut pieces = Vec::new();
    let mut current_buf = String::new();

    for para in paragraphs {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        let would_be = if current_buf.is_empty() {
            trimmed.len()
        } else {
            current_buf.len() + 2 + trimmed.len()
        };

        if would_be > max_chars && !current_buf.is_empty() {
            pieces.push(std::mem::take(&mut current_buf));
        }

        if trimmed.len() > max_chars {
            if !current_buf.is_empty() {
                pieces.push(std::mem::take(&mut current_buf));
            }
            hard_split(trimmed, max_chars, &mut pieces);
        } else {
            if !current_buf.is_empty() {
                current_buf.push_str("\n\n");
            }
            current_buf.push_str(trimmed);
        }
    }

    if !current_buf.is_empty() {
        pieces.push(current_buf);
    }

    if pieces.is_empty() {
        pieces.push(text.trim().to_string());
    }

    pieces
}

/// Split an oversized paragraph at space/newline boundaries.
fn hard_split(paragraph: &str, max_chars: usize, pieces: &mut Vec<String>) {
    let mut remaining = paragraph;
    while !remaining.is_empty() {
        let split_at = snap_to_char_boundary(remaining, remaining.len().min(max_chars));
        let split_at = ensure_progress(remaining, split_at);
        let actual_split = if split_at < remaining.len() {
            remaining[..split_at]
                .rfind('\n')
                .or_else(|| remaining[..split_at].rfind(' '))
                .map(|pos| pos + 1)
                .unwrap_or(split_at)
        } else {
            split_at
        };
        let actual_split = snap_to_char_boundary(remaining, actual_split);
        let actual_split = ensure_progress(remaining, actual_split);

        let piece = &remaining[..actual_split];
        if !piece.trim().is_empty() {
            pieces.push(piece.trim().to_string());
        }
        remaining = &remaining[actual_split..];
    }
}

/// Snap a byte index back to the nearest valid UTF-8 char boundary.
fn snap_to_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// A split index of zero would loop forever; advance past one char.
fn ensure_progress(s: &str, index: usize) -> usize {
    if index == 0 && !s.is_empty() {
        s.char_indices().nth(1).map(|(i, _)| i).unwrap_or(s.len())
    } else {
        index
    }
}
