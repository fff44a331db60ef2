//! FFmpeg CLI wrapper for video segmentation.
//!
//! This crate provides:
//! - A builder/runner for FFmpeg invocations ([`command`])
//! - FFprobe duration probing ([`probe`])
//! - The segmenter adapter that splits a source into fixed-duration,
//!   chronologically ordered chunks ([`split`])

pub mod command;
pub mod error;
pub mod probe;
pub mod split;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand};
pub use error::{MediaError, MediaResult};
pub use probe::probe_duration;
pub use split::{Segmenter, SegmenterConfig};
