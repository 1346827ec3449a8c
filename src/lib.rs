//! Segwatch - split newly arrived videos into fixed-duration segments
//!
//! This library crate exposes the pipeline for the binary and for
//! integration testing.

pub mod config;
pub mod scanner;
pub mod segmenter;
pub mod state;
pub mod watch;
