use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::ConfigError;

pub const DEFAULT_INPUT_DIR: &str = "BeforeSplit";
pub const DEFAULT_OUTPUT_DIR: &str = "AfterSplit";
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub segment: SegmentConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Directory defaults; command-line flags take precedence.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PathsConfig {
    #[serde(default)]
    pub input_dir: Option<PathBuf>,

    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Where to put one still frame per second of every segment.
    #[serde(default)]
    pub frame_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchConfig {
    /// Seconds between polls in watch mode.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// A file untouched for this long counts as fully written.
    #[serde(default = "default_settle_time")]
    pub settle_time_secs: u64,

    /// Allowed extensions; empty means the built-in video list.
    #[serde(default)]
    pub extensions: Vec<String>,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_settle_time() -> u64 {
    10
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            settle_time_secs: default_settle_time(),
            extensions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SegmentConfig {
    #[serde(default)]
    pub duration_secs: SegmentDuration,

    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Container extension of the produced segments.
    #[serde(default = "default_container")]
    pub container: String,
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_container() -> String {
    "mp4".to_string()
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            duration_secs: SegmentDuration::default(),
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            container: default_container(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    /// Upper bound on a single ffmpeg run, in seconds.
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

fn default_tool_timeout() -> u64 {
    3600
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            timeout_secs: default_tool_timeout(),
        }
    }
}

/// Length of each produced segment, in whole seconds within
/// [`SegmentDuration::MIN`, `SegmentDuration::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct SegmentDuration(u32);

impl SegmentDuration {
    pub const MIN: u32 = 5;
    pub const MAX: u32 = 10;

    pub fn new(secs: i64) -> Result<Self, ConfigError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&secs) {
            Ok(Self(secs as u32))
        } else {
            Err(ConfigError::InvalidDuration(secs.to_string()))
        }
    }

    pub fn as_secs(&self) -> u32 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }
}

impl Default for SegmentDuration {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<i64> for SegmentDuration {
    type Error = ConfigError;

    fn try_from(secs: i64) -> Result<Self, Self::Error> {
        Self::new(secs)
    }
}

impl From<SegmentDuration> for u32 {
    fn from(d: SegmentDuration) -> u32 {
        d.0
    }
}

impl FromStr for SegmentDuration {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let secs: i64 = s
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidDuration(s.to_string()))?;
        Self::new(secs)
    }
}

impl fmt::Display for SegmentDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
