use crate::{
    core::params::{signed_semitones, NormalizedParams, TransformMode},
    error::Result,
    types::AudioFormat,
};
use anyhow::Context;
use std::{fs, path::Path};

const ILLEGAL: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Replaces every character that is illegal in a filename with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if ILLEGAL.contains(&c) { '_' } else { c })
        .collect()
}

/// Workspace and delivery filenames for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputNames {
    /// Fetched audio inside the workspace, e.g. `Song.mp3`.
    pub intermediate: String,
    /// Delivered file, e.g. `Song_transpose-2.mp3`.
    pub final_name: String,
}

fn suffixes(params: &NormalizedParams) -> Vec<String> {
    if !params.needs_processing {
        return Vec::new();
    }
    match params.mode {
        TransformMode::Bpm(bpm) => vec![format!("bpm{}", bpm.round() as i64)],
        TransformMode::Rate(rate) => vec![format!("rate{rate:+.1}")],
        TransformMode::Default => {
            let mut parts = Vec::new();
            if params.has_pitch() {
                parts.push(format!("transpose{}", signed_semitones(params.semitones)));
            }
            if params.has_tempo() {
                parts.push(format!("tempo{:+.1}", params.tempo_percent));
            }
            parts
        }
    }
}

/// Computes both filenames from a source title and the active transform.
///
/// The title is sanitized here, so callers may pass it raw.
pub fn compute_names(title: &str, params: &NormalizedParams) -> OutputNames {
    let title = sanitize_filename(title);
    let ext = AudioFormat::Mp3.extension();
    let parts = suffixes(params);
    let final_name = if parts.is_empty() {
        format!("{title}.{ext}")
    } else {
        format!("{title}_{}.{ext}", parts.join("_"))
    };
    OutputNames {
        intermediate: format!("{title}.{ext}"),
        final_name,
    }
}

/// Creates `dir` and its parents; an existing directory is fine.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    Ok(())
}
