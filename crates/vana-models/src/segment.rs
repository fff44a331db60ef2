//! Segment types produced by the splitter and consumed by the report builder.

use std::path::PathBuf;

/// One fixed-duration time slice of the source video.
///
/// Segments are ephemeral: they exist for the duration of one pipeline run
/// and are not persisted as rows. Indices are 1-based and the window is
/// expressed in minutes, since the final report labels segments by their
/// time window rather than by filename.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Chronological position, 1..N
    pub index: u32,
    /// Location of the split media file
    pub path: PathBuf,
    /// Nominal window start in minutes
    pub start_min: f64,
    /// Nominal window end in minutes; the last segment may end early
    pub end_min: f64,
}

/// Outcome of one segment's analysis attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentOutcome {
    /// Analysis text returned by the vision service
    Summary(String),
    /// Final error after the retry budget was exhausted; recorded inline
    /// in the report instead of failing the job
    Error(String),
}

impl SegmentOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, SegmentOutcome::Error(_))
    }
}

/// A segment paired with its analysis outcome, ready for aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentAnalysis {
    pub index: u32,
    pub start_min: f64,
    pub end_min: f64,
    pub outcome: SegmentOutcome,
}

impl SegmentAnalysis {
    pub fn from_segment(segment: &Segment, outcome: SegmentOutcome) -> Self {
        Self {
            index: segment.index,
            start_min: segment.start_min,
            end_min: segment.end_min,
            outcome,
        }
    }
}
