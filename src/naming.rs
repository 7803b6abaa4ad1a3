//! Centralized filename parsing for posts.
//!
//! Every post is identified by its Markdown filename, and three different
//! strings are derived from it:
//!
//! - **Title**: the `<title>` of the rendered page. Only letters and dashes
//!   survive, so numeric ordering prefixes disappear:
//!   `03-my-first-post.md` → "My first post".
//! - **Slug**: the directory name of the published page. Lowercased stem with
//!   whitespace turned into dashes: `03-My-First-Post.md` → `03-my-first-post`.
//! - **Index label**: the link text in the blog index, computed from the slug
//!   recovered from the output path: `03-my-first-post` → "My first post".
//!
//! Capitalization follows sentence case: first character upper, the rest lower.

use regex::Regex;
use std::sync::LazyLock;

const MARKDOWN_EXT: &str = ".md";

/// Leading digits, punctuation and underscores ahead of the first word.
static LEADING_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\W_]+").expect("leading-noise pattern is valid"));

/// Strip a trailing `.md` from a filename, if present.
fn stem(file_name: &str) -> &str {
    file_name.strip_suffix(MARKDOWN_EXT).unwrap_or(file_name)
}

/// Upper-case the first character and lower-case the rest.
///
/// - `"my first post"` → `"My first post"`
/// - `"HELLO World"` → `"Hello world"`
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Derive the page title from a Markdown filename.
///
/// - `"03-my-first-post.md"` → `"My first post"`
/// - `"aws_lambda-notes.md"` → `"Awslambda notes"`
/// - `"2024.md"` → `""`
pub fn page_title(file_name: &str) -> String {
    let letters: String = stem(file_name)
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || *c == '-')
        .collect();
    let trimmed = letters.trim().trim_start_matches('-');
    capitalize(&trimmed.replace('-', " "))
}

/// Derive the published directory name from a Markdown filename.
pub fn slug(file_name: &str) -> String {
    stem(file_name)
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Derive the index link text from a published slug.
///
/// - `"03-my-first-post"` → `"My first post"`
/// - `"2023_-_year-in-review"` → `"Year in review"`
pub fn index_label(slug: &str) -> String {
    let spaced = slug.replace('-', " ");
    capitalize(&LEADING_NOISE.replace(&spaced, ""))
}
