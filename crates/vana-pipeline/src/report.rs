//! Aggregation of per-segment outcomes into the final plain-text report.
//!
//! The report layout is a stable output contract: consumers diff and archive
//! these files, so the exact byte layout matters. Segments appear in
//! chronological order; failed segments keep their slot with an inline error
//! line instead of being dropped.

use chrono::{DateTime, Local};
use vana_models::{SegmentAnalysis, SegmentOutcome};

/// Build the full report text from per-segment analyses.
///
/// `segments` must already be in chronological order. `generated_at` is the
/// report timestamp, taken at aggregation time.
pub fn build_report(
    segments: &[SegmentAnalysis],
    segment_seconds: u32,
    generated_at: DateTime<Local>,
) -> String {
    let seg_min = fmt_minutes(f64::from(segment_seconds) / 60.0);
    let total = segments.len();

    let header = format!(
        "\nVIDEO ANALYSIS REPORT\n\
         =====================\n\
         Generated: {}\n\
         Total Segments Analyzed: {}\n\
         \n\
         EXECUTIVE SUMMARY\n\
         =================\n\
         This report contains a chronological analysis of the submitted video evidence, \n\
         broken down into {}-minute segments for detailed review.\n\
         \n\
         DETAILED ANALYSIS\n\
         =================\n",
        generated_at.format("%Y-%m-%d %H:%M:%S"),
        total,
        seg_min,
    );

    let sections: Vec<String> = segments.iter().map(segment_section).collect();

    let footer = format!(
        "\n\nCONCLUSION\n\
         ==========\n\
         Analysis complete. {} video segments have been processed and summarized above.\n\
         Each segment represents approximately {} minutes of video content.\n\
         \n\
         Report generated by Video Analysis Service v1.0\n",
        total, seg_min,
    );

    format!("{}{}{}", header, sections.join("\n"), footer)
}

fn segment_section(analysis: &SegmentAnalysis) -> String {
    let body = match &analysis.outcome {
        SegmentOutcome::Summary(text) => text.clone(),
        SegmentOutcome::Error(message) => {
            format!("Error processing chunk {}: {}", analysis.index, message)
        }
    };

    format!(
        "\nSEGMENT {} (Minutes {}-{})\n{}\n{}\n",
        analysis.index,
        fmt_minutes(analysis.start_min),
        fmt_minutes(analysis.end_min),
        "=".repeat(40),
        body,
    )
}

/// Format a minute value: whole minutes print without a decimal point,
/// partial minutes print with one decimal place.
fn fmt_minutes(minutes: f64) -> String {
    if minutes.fract() == 0.0 {
        format!("{}", minutes as i64)
    } else {
        format!("{minutes:.1}")
    }
}
