//! Fixed-duration video segmentation.
//!
//! Boundaries are purely time-based; the last chunk may be shorter than the
//! configured duration. Chunks are numbered chronologically and labeled with
//! their nominal minute window, which is what the final report keys on.

use std::path::{Path, PathBuf};
use tracing::info;

use vana_models::{JobId, Segment};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_duration;

/// Segmenter configuration, constructed once at startup.
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Directory that receives one subdirectory of chunks per job
    pub chunks_dir: PathBuf,
    /// Fixed segment duration in seconds
    pub segment_seconds: u32,
    /// Optional wall-clock limit for the FFmpeg invocation
    pub ffmpeg_timeout_secs: Option<u64>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            chunks_dir: PathBuf::from("chunks"),
            segment_seconds: 300,
            ffmpeg_timeout_secs: None,
        }
    }
}

/// Adapter around the external FFmpeg splitting tool.
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Split `source` into fixed-duration chunks under `chunks_dir/{job_id}/`.
    ///
    /// Fails if the source is unreadable, FFmpeg exits non-zero, or zero
    /// chunks are produced. On success the returned segments are in strict
    /// chronological order with 1-based indices.
    pub async fn split(&self, source: &Path, job_id: &JobId) -> MediaResult<Vec<Segment>> {
        if !source.exists() {
            return Err(MediaError::FileNotFound(source.to_path_buf()));
        }

        // Probe up front: an unreadable source should fail segmentation,
        // and the duration clamps the last segment's window.
        let duration_secs = probe_duration(source).await?;

        let chunk_dir = self.config.chunks_dir.join(job_id.as_str());
        tokio::fs::create_dir_all(&chunk_dir).await?;

        let template = chunk_dir.join("chunk_%03d.mp4");
        let mut cmd = FfmpegCommand::new(source, &template)
            .copy_codecs()
            .segment(self.config.segment_seconds);
        if let Some(secs) = self.config.ffmpeg_timeout_secs {
            cmd = cmd.timeout(secs);
        }
        cmd.run().await?;

        let chunk_paths = collect_chunks(&chunk_dir)?;
        if chunk_paths.is_empty() {
            return Err(MediaError::NoSegments);
        }

        info!(
            job_id = %job_id,
            chunks = chunk_paths.len(),
            duration_secs,
            "video segmented"
        );

        let windows = segment_windows(
            chunk_paths.len(),
            self.config.segment_seconds,
            duration_secs,
        );

        Ok(chunk_paths
            .into_iter()
            .zip(windows)
            .enumerate()
            .map(|(i, (path, (start_min, end_min)))| Segment {
                index: (i + 1) as u32,
                path,
                start_min,
                end_min,
            })
            .collect())
    }
}

/// List `chunk_*.mp4` files in name order (FFmpeg numbers them sequentially,
/// so name order is chronological order).
fn collect_chunks(dir: &Path) -> MediaResult<Vec<PathBuf>> {
    let mut chunks: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("chunk_") && n.ends_with(".mp4"))
                .unwrap_or(false)
        })
        .collect();
    chunks.sort();
    Ok(chunks)
}

/// Compute nominal minute windows for `count` chunks.
///
/// Every window spans `segment_seconds`, except the last, which is clamped
/// to the probed source duration when that is known.
fn segment_windows(count: usize, segment_seconds: u32, duration_secs: f64) -> Vec<(f64, f64)> {
    let seg_min = f64::from(segment_seconds) / 60.0;
    let total_min = duration_secs / 60.0;

    (0..count)
        .map(|i| {
            let start = i as f64 * seg_min;
            let mut end = (i + 1) as f64 * seg_min;
            if i == count - 1 && total_min > start {
                end = end.min(total_min);
            }
            (start, end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_segment_windows_clamp_last() {
        // 17-minute source split into 5-minute chunks
        let windows = segment_windows(4, 300, 1020.0);
        assert_eq!(
            windows,
            vec![(0.0, 5.0), (5.0, 10.0), (10.0, 15.0), (15.0, 17.0)]
        );
    }

    #[test]
    fn test_segment_windows_exact_multiple() {
        let windows = segment_windows(2, 300, 600.0);
        assert_eq!(windows, vec![(0.0, 5.0), (5.0, 10.0)]);
    }

    #[test]
    fn test_segment_windows_unknown_duration() {
        // Duration of zero means the probe gave nothing usable; fall back
        // to nominal windows
        let windows = segment_windows(2, 300, 0.0);
        assert_eq!(windows, vec![(0.0, 5.0), (5.0, 10.0)]);
    }

    #[test]
    fn test_collect_chunks_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["chunk_002.mp4", "chunk_000.mp4", "chunk_001.mp4", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let chunks = collect_chunks(dir.path()).unwrap();
        let names: Vec<_> = chunks
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["chunk_000.mp4", "chunk_001.mp4", "chunk_002.mp4"]);
    }

    #[tokio::test]
    async fn test_split_missing_source() {
        let dir = TempDir::new().unwrap();
        let segmenter = Segmenter::new(SegmenterConfig {
            chunks_dir: dir.path().to_path_buf(),
            ..Default::default()
        });

        let err = segmenter
            .split(Path::new("/nonexistent/video.mp4"), &JobId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
