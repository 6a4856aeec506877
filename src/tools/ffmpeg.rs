//! Audio transcoding through ffmpeg.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use tracing::info;

use crate::{
    error::{Result, TransposeError},
    io::process::{run_captured, stderr_text, tool_command},
};

/// VBR quality used for every MP3 encode (`-q:a 2`, roughly 190 kbps).
pub const MP3_QUALITY: u8 = 2;

/// Target encodings the pipeline asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodecOptions {
    /// 16-bit little-endian PCM WAV.
    Pcm16,
    /// MP3 at a fixed VBR quality, letting ffmpeg pick the encoder.
    Mp3 { quality: u8 },
    /// MP3 with the LAME encoder named explicitly.
    LameMp3 { quality: u8 },
}

impl CodecOptions {
    pub fn mp3() -> Self {
        CodecOptions::Mp3 { quality: MP3_QUALITY }
    }

    pub fn lame_mp3() -> Self {
        CodecOptions::LameMp3 { quality: MP3_QUALITY }
    }
}

pub trait MediaConverter: Send + Sync {
    /// Transcodes `input` into `output`, overwriting it.
    fn transcode(&self, input: &Path, output: &Path, codec: CodecOptions) -> Result<()>;
}

/// Flags ffmpeg is ever invoked with.
#[derive(Clone, Debug, PartialEq)]
pub enum FfmpegArg {
    HideBanner,
    Input(PathBuf),
    NoVideo,
    AudioCodec(&'static str),
    AudioQuality(u8),
    Overwrite,
    Output(PathBuf),
}

impl FfmpegArg {
    fn push_to(&self, out: &mut Vec<OsString>) {
        match self {
            FfmpegArg::HideBanner => out.push("-hide_banner".into()),
            FfmpegArg::Input(p) => out.extend(["-i".into(), p.clone().into_os_string()]),
            FfmpegArg::NoVideo => out.push("-vn".into()),
            FfmpegArg::AudioCodec(c) => out.extend(["-acodec".into(), (*c).into()]),
            FfmpegArg::AudioQuality(q) => out.extend(["-q:a".into(), q.to_string().into()]),
            FfmpegArg::Overwrite => out.push("-y".into()),
            FfmpegArg::Output(p) => out.push(p.clone().into_os_string()),
        }
    }
}

/// Argument list for one transcode; the output path always comes last.
pub fn transcode_args(input: &Path, output: &Path, codec: CodecOptions) -> Vec<FfmpegArg> {
    let mut args = vec![
        FfmpegArg::HideBanner,
        FfmpegArg::Input(input.to_path_buf()),
        FfmpegArg::NoVideo,
    ];
    match codec {
        CodecOptions::Pcm16 => args.push(FfmpegArg::AudioCodec("pcm_s16le")),
        CodecOptions::Mp3 { quality } => args.push(FfmpegArg::AudioQuality(quality)),
        CodecOptions::LameMp3 { quality } => {
            args.push(FfmpegArg::AudioCodec("libmp3lame"));
            args.push(FfmpegArg::AudioQuality(quality));
        }
    }
    args.push(FfmpegArg::Overwrite);
    args.push(FfmpegArg::Output(output.to_path_buf()));
    args
}

pub fn render_args(args: &[FfmpegArg]) -> Vec<OsString> {
    let mut out = Vec::new();
    for a in args {
        a.push_to(&mut out);
    }
    out
}

pub struct Ffmpeg {
    program: PathBuf,
}

impl Ffmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl MediaConverter for Ffmpeg {
    fn transcode(&self, input: &Path, output: &Path, codec: CodecOptions) -> Result<()> {
        info!(input = %input.display(), output = %output.display(), ?codec, "transcoding");
        let mut cmd = tool_command(&self.program);
        cmd.args(render_args(&transcode_args(input, output, codec)));
        let out = run_captured(&mut cmd)?;
        if !out.status.success() {
            return Err(TransposeError::Conversion(format!(
                "{} -> {}: {}",
                input.display(),
                output.display(),
                stderr_text(&out)
            )));
        }
        Ok(())
    }
}
