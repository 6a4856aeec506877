use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf};

/// Sentinel BPM value that means "no BPM target".
pub const DEFAULT_BPM: f64 = 120.0;

/// Immutable input to one pipeline run.
///
/// Built once by a driver and handed to [`crate::Pipeline::run`] by reference;
/// the pipeline never mutates it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformRequest {
    pub source_url: String,
    /// Chromatic pitch shift in semitones, may be fractional.
    pub semitones: f64,
    /// Speed change in percent that preserves pitch.
    pub tempo_percent: Option<f64>,
    /// Speed change in percent that also shifts pitch.
    pub rate_percent: Option<f64>,
    /// Absolute tempo target. `Some(120.0)` is treated like `None`.
    pub target_bpm: Option<f64>,
    /// Destination directory. `None` means [`crate::paths::default_output_dir`].
    pub output_dir: Option<PathBuf>,
}

impl TransformRequest {
    pub fn new(source_url: impl Into<String>, semitones: f64) -> Self {
        Self {
            source_url: source_url.into(),
            semitones,
            tempo_percent: None,
            rate_percent: None,
            target_bpm: None,
            output_dir: None,
        }
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn tempo(mut self, percent: f64) -> Self {
        self.tempo_percent = Some(percent);
        self
    }

    pub fn rate(mut self, percent: f64) -> Self {
        self.rate_percent = Some(percent);
        self
    }

    pub fn bpm(mut self, bpm: f64) -> Self {
        self.target_bpm = Some(bpm);
        self
    }
}

/// Stages of a single pipeline run, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    FetchTitle,
    Download,
    ConvertToWav,
    Stretch,
    ConvertToMp3,
    Deliver,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::FetchTitle => "fetch_title",
            Stage::Download => "download",
            Stage::ConvertToWav => "convert_to_wav",
            Stage::Stretch => "stretch",
            Stage::ConvertToMp3 => "convert_to_mp3",
            Stage::Deliver => "deliver",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Container formats the pipeline asks tools to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }
}
