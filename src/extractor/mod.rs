pub mod models;
pub mod quality;
pub mod traits;
pub mod ytdlp;

pub use models::{canonical_url, SourceMetadata, StreamDescriptor, VideoInfo};
pub use quality::{distinct_quality_labels, parse_quality_label, resolve_quality};
pub use traits::{ByteStream, Extractor};
pub use ytdlp::YtDlpExtractor;
