//! Fields derived from a post's markdown content and title.

use std::sync::LazyLock;

use regex::Regex;

const WORDS_PER_MINUTE: f64 = 200.0;
const MINUTES_PER_IMAGE: f64 = 0.5;

/// Maximum excerpt length in characters, before the ellipsis.
pub const EXCERPT_MAX_CHARS: usize = 2000;

/// Slug used when a title has no ASCII letters or digits at all.
pub const FALLBACK_SLUG: &str = "post";

static MARKDOWN_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[.*?\]\(.*?\)").expect("valid image regex"));

static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]\(.*?\)").expect("valid link regex"));

static FORMATTING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#*_`]").expect("valid formatting regex"));

/// Base slug for a title: lower-case `[a-z0-9]` runs joined by single hyphens.
///
/// The result always matches `^[a-z0-9]+(-[a-z0-9]+)*$`.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;

    for ch in lowered.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// The `attempt`-th candidate for a base slug: `base`, `base-1`, `base-2`, ...
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

/// Plain-text excerpt of markdown content.
pub fn excerpt(content: &str) -> String {
    let without_images = MARKDOWN_IMAGE.replace_all(content, "");
    let without_links = MARKDOWN_LINK.replace_all(&without_images, "");
    let plain = FORMATTING.replace_all(&without_links, "");
    let plain = plain.trim();

    if plain.chars().count() <= EXCERPT_MAX_CHARS {
        return plain.to_string();
    }

    let truncated: String = plain.chars().take(EXCERPT_MAX_CHARS).collect();
    format!("{}...", truncated.trim_end())
}

/// Estimated reading time in whole minutes, never below 1.
pub fn reading_time(content: &str) -> i32 {
    let words = content.split_whitespace().count() as f64;
    let images = MARKDOWN_IMAGE.find_iter(content).count() as f64;

    let minutes = (words / WORDS_PER_MINUTE + images * MINUTES_PER_IMAGE).ceil();
    (minutes as i32).max(1)
}
