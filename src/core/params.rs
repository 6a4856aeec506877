//! Reconciles the transform inputs into one canonical parameter set.
//!
//! Precedence, first match wins: BPM target, then rate, then the default
//! transpose/tempo pair. A non-zero semitone value rides along in every mode.

use crate::{
    error::{Result, TransposeError},
    types::{TransformRequest, DEFAULT_BPM},
};

/// Semitone values closer to zero than this are no transpose at all.
pub const SEMITONE_EPSILON: f64 = 0.01;
/// Tempo and rate percentages closer to zero than this are no-ops.
pub const PERCENT_EPSILON: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformMode {
    /// Detect the tempo and stretch to an absolute BPM.
    Bpm(f64),
    /// Tape-style speed change, pitch follows.
    Rate(f64),
    /// Independent transpose and tempo.
    Default,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedParams {
    pub mode: TransformMode,
    /// Rounded to 2 decimals; exactly `0.0` when inactive.
    pub semitones: f64,
    /// Only meaningful in [`TransformMode::Default`]; `0.0` otherwise.
    pub tempo_percent: f64,
    pub needs_processing: bool,
}

impl NormalizedParams {
    pub fn has_pitch(&self) -> bool {
        self.semitones != 0.0
    }

    pub fn has_tempo(&self) -> bool {
        self.tempo_percent != 0.0
    }

    /// Human-readable summary used in progress messages.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        match self.mode {
            TransformMode::Bpm(bpm) => parts.push(format!("Adjusting to {} BPM", bpm.round())),
            TransformMode::Rate(rate) => parts.push(format!("Rate {rate:+.1}%")),
            TransformMode::Default => {}
        }
        if self.has_pitch() {
            parts.push(format!("Transpose {} semitones", signed_semitones(self.semitones)));
        }
        if self.has_tempo() {
            parts.push(format!("Tempo {:+.1}%", self.tempo_percent));
        }
        if parts.is_empty() {
            "Processing".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// `+3` for whole values, `+0.50` otherwise.
pub fn signed_semitones(semitones: f64) -> String {
    if semitones.fract() == 0.0 {
        format!("{:+}", semitones as i64)
    } else {
        format!("{semitones:+.2}")
    }
}

fn snap_semitones(value: f64) -> f64 {
    if value.abs() < SEMITONE_EPSILON {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}

fn snap_percent(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.abs() >= PERCENT_EPSILON => v,
        _ => 0.0,
    }
}

fn check_finite(name: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() => Err(TransposeError::InvalidInput(format!(
            "{name} must be a finite number, got {v}"
        ))),
        _ => Ok(()),
    }
}

fn check_speed(name: &str, value: f64) -> Result<()> {
    if value <= -100.0 {
        return Err(TransposeError::InvalidInput(format!(
            "{name} must be greater than -100%, got {value:.1}%"
        )));
    }
    Ok(())
}

pub fn normalize(
    semitones: f64,
    tempo_percent: Option<f64>,
    rate_percent: Option<f64>,
    target_bpm: Option<f64>,
) -> Result<NormalizedParams> {
    check_finite("semitones", Some(semitones))?;
    check_finite("tempo", tempo_percent)?;
    check_finite("rate", rate_percent)?;
    check_finite("bpm", target_bpm)?;

    let semitones = snap_semitones(semitones);
    let tempo = snap_percent(tempo_percent);
    let rate = snap_percent(rate_percent);
    check_speed("tempo", tempo)?;
    check_speed("rate", rate)?;

    let bpm = match target_bpm {
        Some(b) if b.round() < 1.0 => {
            return Err(TransposeError::InvalidInput(format!(
                "bpm must be at least 1, got {b}"
            )))
        }
        Some(b) if b != DEFAULT_BPM => Some(b),
        _ => None,
    };

    let (mode, tempo) = if let Some(bpm) = bpm {
        (TransformMode::Bpm(bpm), 0.0)
    } else if rate != 0.0 {
        (TransformMode::Rate(rate), 0.0)
    } else {
        (TransformMode::Default, tempo)
    };

    let needs_processing = !matches!(mode, TransformMode::Default) || semitones != 0.0 || tempo != 0.0;

    Ok(NormalizedParams {
        mode,
        semitones,
        tempo_percent: tempo,
        needs_processing,
    })
}

impl TransformRequest {
    pub fn normalized(&self) -> Result<NormalizedParams> {
        normalize(
            self.semitones,
            self.tempo_percent,
            self.rate_percent,
            self.target_bpm,
        )
    }
}
