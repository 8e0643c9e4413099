//! Display and filename formatting helpers shared by the server and client

/// Extension every relayed file is saved with
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Format seconds as M:SS, or H:MM:SS once the duration reaches an hour.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Strip a title down to ASCII word characters and whitespace.
///
/// Whitespace of any kind becomes a plain space so the result is always a
/// valid header value.
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                Some(c)
            } else if c.is_whitespace() {
                Some(' ')
            } else {
                None
            }
        })
        .collect()
}

/// Output file name for a video title, e.g. `Test Video.mp4`
pub fn output_filename(title: &str) -> String {
    format!("{}.{}", sanitize_filename(title), OUTPUT_EXTENSION)
}

/// `Content-Disposition` value announcing `filename` as an attachment
pub fn attachment_disposition(filename: &str) -> String {
    format!("attachment; filename=\"{}\"", filename)
}

/// Pull the quoted `filename` parameter out of a `Content-Disposition` value.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    let start = value.find("filename=\"")? + "filename=\"".len();
    let rest = &value[start..];
    let end = rest.rfind('"')?;
    let name = &rest[..end];
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
