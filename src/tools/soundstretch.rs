//! Pitch and tempo changes through SoundTouch's `soundstretch` tool.

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::info;

use crate::{
    core::params::{NormalizedParams, TransformMode},
    error::{Result, TransposeError},
    io::process::{probe_responds, run_captured, stderr_text, tool_command},
};

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// The closed set of processing flags passed to the stretcher.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StretchFlag {
    /// Semitones.
    Pitch(f64),
    /// Percent, pitch preserved.
    Tempo(f64),
    /// Percent, pitch follows.
    Rate(f64),
    /// Absolute target tempo.
    Bpm(u32),
}

impl fmt::Display for StretchFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StretchFlag::Pitch(v) => write!(f, "-pitch={v:.2}"),
            StretchFlag::Tempo(v) => write!(f, "-tempo={v:.2}"),
            StretchFlag::Rate(v) => write!(f, "-rate={v:.2}"),
            StretchFlag::Bpm(v) => write!(f, "-bpm={v}"),
        }
    }
}

/// Flags for the active mode: exactly one of bpm, rate, or the pitch/tempo pair,
/// with pitch added on top of bpm and rate when set.
pub fn stretch_flags(params: &NormalizedParams) -> Vec<StretchFlag> {
    let mut flags = Vec::new();
    match params.mode {
        TransformMode::Bpm(bpm) => flags.push(StretchFlag::Bpm(bpm.round() as u32)),
        TransformMode::Rate(rate) => flags.push(StretchFlag::Rate(rate)),
        TransformMode::Default => {}
    }
    if params.has_pitch() {
        flags.push(StretchFlag::Pitch(params.semitones));
    }
    if params.has_tempo() {
        flags.push(StretchFlag::Tempo(params.tempo_percent));
    }
    flags
}

pub trait TimeStretcher: Send + Sync {
    /// Whether the tool actually responds. Defaults to yes.
    fn is_available(&self) -> bool {
        true
    }

    fn process(&self, input_wav: &Path, output_wav: &Path, flags: &[StretchFlag]) -> Result<()>;
}

pub struct SoundStretch {
    program: PathBuf,
    probe_timeout: Duration,
}

impl SoundStretch {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            probe_timeout: PROBE_TIMEOUT,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}

impl TimeStretcher for SoundStretch {
    /// soundstretch exits non-zero on `--help`, so any output at all counts.
    fn is_available(&self) -> bool {
        probe_responds(&self.program, &["--help"], self.probe_timeout)
            || probe_responds(&self.program, &[], self.probe_timeout)
    }

    fn process(&self, input_wav: &Path, output_wav: &Path, flags: &[StretchFlag]) -> Result<()> {
        info!(flags = ?flags, "stretching");
        let mut cmd = tool_command(&self.program);
        cmd.arg(input_wav)
            .arg(output_wav)
            .args(flags.iter().map(ToString::to_string));
        let out = run_captured(&mut cmd)?;
        if !out.status.success() {
            let mut msg = stderr_text(&out);
            if msg.is_empty() {
                msg = String::from_utf8_lossy(&out.stdout).trim().to_string();
            }
            return Err(TransposeError::Stretch(msg));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::normalize;

    fn rendered(s: f64, t: Option<f64>, r: Option<f64>, b: Option<f64>) -> Vec<String> {
        stretch_flags(&normalize(s, t, r, b).unwrap())
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn bpm_wins_over_rate_and_tempo() {
        assert_eq!(rendered(0.0, Some(10.0), Some(50.0), Some(140.0)), ["-bpm=140"]);
        assert_eq!(
            rendered(-3.0, Some(10.0), Some(50.0), Some(140.0)),
            ["-bpm=140", "-pitch=-3.00"]
        );
    }

    #[test]
    fn rate_wins_over_tempo() {
        assert_eq!(rendered(0.0, Some(10.0), Some(-12.5), None), ["-rate=-12.50"]);
        assert_eq!(rendered(1.5, None, Some(8.0), None), ["-rate=8.00", "-pitch=1.50"]);
    }

    #[test]
    fn default_mode_pitch_and_tempo() {
        assert_eq!(rendered(-2.0, None, None, None), ["-pitch=-2.00"]);
        assert_eq!(rendered(0.0, Some(15.0), None, None), ["-tempo=15.00"]);
        assert_eq!(rendered(4.0, Some(-5.0), None, None), ["-pitch=4.00", "-tempo=-5.00"]);
        assert!(rendered(0.0, None, None, Some(120.0)).is_empty());
    }

    #[test]
    fn smallest_accepted_bpm_renders_as_one() {
        assert_eq!(rendered(0.0, None, None, Some(0.5)), ["-bpm=1"]);
    }
}
