use clap::Parser;
use segwatch::config::{Overrides, SegmentDuration};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "segwatch")]
#[command(
    author,
    version,
    about = "Split videos into fixed-duration segments, once or continuously"
)]
pub struct Cli {
    /// Directory containing videos to split [default: BeforeSplit]
    #[arg(short, long, value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Directory to save output segments [default: AfterSplit]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Duration of each segment in seconds (5-10) [default: 5]
    #[arg(short, long, value_name = "SECS")]
    pub duration: Option<SegmentDuration>,

    /// Watch the input directory for new videos
    #[arg(short, long)]
    pub watch: bool,

    /// Interval in seconds to check for new videos (only with --watch) [default: 60]
    #[arg(
        short = 't',
        long,
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: Option<u64>,

    /// Also save one frame per second of every segment to this directory
    #[arg(short, long, value_name = "DIR")]
    pub frame_dir: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            frame_dir: self.frame_dir.clone(),
            duration: self.duration,
            watch: self.watch,
            interval_secs: self.interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_flags_parse() {
        let cli = Cli::try_parse_from([
            "segwatch", "-i", "in", "-o", "out", "-d", "8", "-w", "-t", "5", "-f", "frames",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.input_dir, Some(PathBuf::from("in")));
        assert_eq!(overrides.output_dir, Some(PathBuf::from("out")));
        assert_eq!(overrides.duration.map(|d| d.as_secs()), Some(8));
        assert!(overrides.watch);
        assert_eq!(overrides.interval_secs, Some(5));
        assert_eq!(overrides.frame_dir, Some(PathBuf::from("frames")));
    }

    #[test]
    fn out_of_range_duration_is_rejected() {
        assert!(Cli::try_parse_from(["segwatch", "-d", "3"]).is_err());
        assert!(Cli::try_parse_from(["segwatch", "--duration", "11"]).is_err());
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(Cli::try_parse_from(["segwatch", "-w", "-t", "0"]).is_err());
    }

    #[test]
    fn no_flags_means_no_overrides() {
        let cli = Cli::try_parse_from(["segwatch"]).unwrap();
        let overrides = cli.overrides();
        assert!(overrides.input_dir.is_none());
        assert!(overrides.duration.is_none());
        assert!(!overrides.watch);
    }
}
