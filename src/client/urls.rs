//! Video URL discovery in free-form pasted text

use crate::extractor::canonical_url;
use once_cell::sync::Lazy;
use regex::Regex;

/// Share URL in pasted text; the trailing `\S+` swallows the rest of the token
static SHARE_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:https?://)?(?:www\.)?(?:youtube\.com/(?:watch\?v=|embed/)|youtu\.be/)([a-zA-Z0-9_-]+)(?:\S+)?",
    )
    .expect("share URL pattern is valid")
});

static VIDEO_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#,
    )
    .expect("video id pattern is valid")
});

/// Every share URL in `input`, rewritten to its canonical watch URL.
///
/// Order follows the input; repeated videos are kept.
pub fn extract_video_urls(input: &str) -> Vec<String> {
    SHARE_URL_REGEX
        .captures_iter(input)
        .filter_map(|caps| caps.get(1))
        .map(|id| canonical_url(id.as_str()))
        .collect()
}

/// The 11-character video id inside any accepted URL shape
pub fn video_id_from_url(url: &str) -> Option<String> {
    VIDEO_ID_REGEX
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
}
