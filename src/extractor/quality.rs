//! Quality selection over the descriptors a stream source enumerates
//!
//! Given a requested label such as `720p`, the resolver picks:
//! 1. the video stream with exactly that height,
//! 2. otherwise the tallest stream strictly below it,
//! 3. otherwise the tallest stream available.
//!
//! A missing or unparseable label skips straight to (3), so "no preference"
//! always means "highest available".

use crate::extractor::models::StreamDescriptor;
use std::cmp::Reverse;

/// Parse a label like `720p`, `1080P` or `480` into a height.
pub fn parse_quality_label(label: &str) -> Option<u32> {
    let trimmed = label.trim();
    let digits = trimmed
        .strip_suffix('p')
        .or_else(|| trimmed.strip_suffix('P'))
        .unwrap_or(trimmed);
    digits.parse().ok()
}

/// Video-capable descriptors, tallest first; streams without a height last.
///
/// The sort is stable so equal heights keep the source's ordering.
pub fn sorted_video_descriptors(descriptors: &[StreamDescriptor]) -> Vec<&StreamDescriptor> {
    let mut video: Vec<&StreamDescriptor> = descriptors.iter().filter(|d| d.has_video).collect();
    // `None < Some(_)`, so reversing puts unknown heights at the end
    video.sort_by_key(|d| Reverse(d.height));
    video
}

/// Select the descriptor to relay for a requested quality.
///
/// Returns `None` only when the list holds no video stream at all.
pub fn resolve_quality<'a>(
    descriptors: &'a [StreamDescriptor],
    requested: Option<&str>,
) -> Option<&'a StreamDescriptor> {
    let sorted = sorted_video_descriptors(descriptors);
    let highest = sorted.first().copied();

    let Some(target) = requested.and_then(parse_quality_label) else {
        return highest;
    };

    sorted
        .iter()
        .find(|d| d.height == Some(target))
        .or_else(|| {
            sorted
                .iter()
                .find(|d| matches!(d.height, Some(h) if h < target))
        })
        .copied()
        .or(highest)
}

/// Distinct quality labels for the video streams, tallest first.
pub fn distinct_quality_labels(descriptors: &[StreamDescriptor]) -> Vec<String> {
    let mut labels: Vec<String> = sorted_video_descriptors(descriptors)
        .into_iter()
        .filter_map(|d| d.quality_label())
        .collect();
    // Sorted by height, so duplicates are adjacent
    labels.dedup();
    labels
}
