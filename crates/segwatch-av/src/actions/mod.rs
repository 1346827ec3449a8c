//! Media processing actions.
//!
//! - Fixed-duration segmentation through the ffmpeg segment muxer
//! - Still frame extraction from produced segments

mod frames;
mod segment;

pub use frames::{build_frames_command, extract_frames, frame_prefix, list_frames};
pub use segment::{
    build_segment_command, muxer_for, output_stem, parse_segment_index, segment_file_name,
    segment_plan,
    split_into_segments, verify_segments, ProducedSegment, SegmentOptions, SegmentSpan,
    COVERAGE_TOLERANCE, SEGMENT_TOLERANCE,
};
