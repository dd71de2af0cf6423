// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text-shaping primitives shared by the engine and the analyser: clipping
//! long agent output for storage/prompts, and a stable signature used to
//! detect repeated proposals.

use sha2::{Digest, Sha256};

const DEFAULT_CLIP_CHARS: usize = 3000;
const SIGNATURE_INPUT_CHARS: usize = 1000;

/// Truncate `text` to at most `max_chars` characters, appending a marker
/// noting how much was removed. A no-op when `text` already fits.
pub fn clip_text(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    let removed = char_count - max_chars;
    format!("{head}\n...[truncated {removed} chars]")
}

/// [`clip_text`] with the default 3000-character budget.
pub fn clip_text_default(text: &str) -> String {
    clip_text(text, DEFAULT_CLIP_CHARS)
}

/// A short, stable signature for `text`: whitespace-normalized, lowercased,
/// truncated to 1000 chars, then SHA-256-hashed to 16 hex chars. Used to
/// spot participants repeating the same proposal verbatim across rounds.
pub fn text_signature(text: &str) -> String {
    let normalized: String = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let truncated: String = normalized.chars().take(SIGNATURE_INPUT_CHARS).collect();

    let mut hasher = Sha256::new();
    hasher.update(truncated.as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_text_is_noop_under_budget() {
        assert_eq!(clip_text("short", 100), "short");
    }

    #[test]
    fn clip_text_truncates_and_marks() {
        let long = "a".repeat(10);
        let clipped = clip_text(&long, 4);
        assert!(clipped.starts_with("aaaa"));
        assert!(clipped.contains("truncated 6 chars"));
    }

    #[test]
    fn text_signature_is_stable_across_whitespace_and_case() {
        let a = text_signature("Hello   World");
        let b = text_signature("hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn text_signature_differs_for_different_text() {
        assert_ne!(text_signature("one"), text_signature("two"));
    }

    #[test]
    fn text_signature_is_16_hex_chars() {
        let sig = text_signature("anything");
        assert_eq!(sig.len(), 16);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
