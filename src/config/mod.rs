mod types;

pub use types::*;

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Problems that stop the pipeline before the first poll.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(
        "segment duration must be an integer between {min} and {max} seconds, got {0:?}",
        min = SegmentDuration::MIN,
        max = SegmentDuration::MAX
    )]
    InvalidDuration(String),

    #[error("poll interval must be a positive number of seconds")]
    InvalidInterval,

    #[error("{role} directory {} is not usable: {reason}", path.display())]
    Directory {
        role: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("input and output directories must differ: {}", .0.display())]
    SameDirectory(PathBuf),

    #[error("invalid segment settings: {0}")]
    Segment(String),

    #[error("required tool unavailable: {0}")]
    Tool(#[from] segwatch_av::Error),
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./segwatch.toml",
        "~/.config/segwatch/config.toml",
        "/etc/segwatch/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.watch.interval_secs == 0 {
        return Err(ConfigError::InvalidInterval);
    }

    segwatch_av::actions::muxer_for(&config.segment.container)
        .map_err(|e| ConfigError::Segment(e.to_string()))?;

    if config.segment.video_codec.trim().is_empty() || config.segment.audio_codec.trim().is_empty()
    {
        return Err(ConfigError::Segment("codec names cannot be empty".to_string()));
    }

    if config.tools.timeout_secs == 0 {
        return Err(ConfigError::Segment(
            "tool timeout must be positive".to_string(),
        ));
    }

    Ok(())
}

/// Values given on the command line; each one replaces its config-file
/// counterpart.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub frame_dir: Option<PathBuf>,
    pub duration: Option<SegmentDuration>,
    pub watch: bool,
    pub interval_secs: Option<u64>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub frame_dir: Option<PathBuf>,
    pub duration: SegmentDuration,
    pub watch: bool,
    pub interval: Duration,
    pub settle_time: Duration,
    pub extensions: Vec<String>,
    pub segment: SegmentConfig,
    pub tools: ToolsConfig,
}

impl Settings {
    /// Merge the config file with command-line overrides and validate.
    pub fn resolve(config: Config, overrides: Overrides) -> Result<Self, ConfigError> {
        validate_config(&config)?;

        let interval_secs = overrides
            .interval_secs
            .unwrap_or(config.watch.interval_secs);
        if interval_secs == 0 {
            return Err(ConfigError::InvalidInterval);
        }

        let input_dir = overrides
            .input_dir
            .or(config.paths.input_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR));
        let output_dir = overrides
            .output_dir
            .or(config.paths.output_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        if input_dir == output_dir {
            return Err(ConfigError::SameDirectory(input_dir));
        }

        Ok(Self {
            input_dir,
            output_dir,
            frame_dir: overrides.frame_dir.or(config.paths.frame_dir),
            duration: overrides.duration.unwrap_or(config.segment.duration_secs),
            watch: overrides.watch,
            interval: Duration::from_secs(interval_secs),
            settle_time: Duration::from_secs(config.watch.settle_time_secs),
            extensions: config.watch.extensions,
            segment: config.segment,
            tools: config.tools,
        })
    }

    /// Create missing directories and check that they can be used.
    pub fn prepare_directories(&self) -> Result<(), ConfigError> {
        ensure_dir("input", &self.input_dir)?;
        ensure_dir("output", &self.output_dir)?;
        if let Some(frame_dir) = &self.frame_dir {
            ensure_dir("frame", frame_dir)?;
        }

        let input = canonical("input", &self.input_dir)?;
        let output = canonical("output", &self.output_dir)?;
        if input == output {
            return Err(ConfigError::SameDirectory(input));
        }

        std::fs::read_dir(&self.input_dir).map_err(|e| ConfigError::Directory {
            role: "input",
            path: self.input_dir.clone(),
            reason: e.to_string(),
        })?;

        // Staging a workspace proves the output directory is writable.
        segwatch_av::Workspace::new(&self.output_dir)
            .map(segwatch_av::Workspace::cleanup)
            .map_err(|e| ConfigError::Directory {
                role: "output",
                path: self.output_dir.clone(),
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

fn ensure_dir(role: &'static str, path: &Path) -> Result<(), ConfigError> {
    if path.exists() && !path.is_dir() {
        return Err(ConfigError::Directory {
            role,
            path: path.to_path_buf(),
            reason: "exists and is not a directory".to_string(),
        });
    }

    std::fs::create_dir_all(path).map_err(|e| ConfigError::Directory {
        role,
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn canonical(role: &'static str, path: &Path) -> Result<PathBuf, ConfigError> {
    path.canonicalize().map_err(|e| ConfigError::Directory {
        role,
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
