//! Media fetcher backed by yt-dlp.

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use tracing::{debug, info};

use crate::{
    error::{Result, TransposeError},
    io::process::{run_captured, stderr_text, tool_command},
    types::AudioFormat,
};

/// Extensions yt-dlp may leave behind for an audio download.
pub const NATIVE_AUDIO_EXTENSIONS: &[&str] = &["m4a", "webm", "opus", "ogg", "mp4", "flac"];

pub trait Fetcher: Send + Sync {
    /// Display title of the source, without downloading it.
    fn get_title(&self, url: &str) -> Result<String>;

    /// Downloads the best available audio into `dest_dir` as `<stem>.<ext>`.
    ///
    /// `format` is a hint; the returned file may still be in a native
    /// container and the caller converts it when needed.
    fn download_audio(
        &self,
        url: &str,
        dest_dir: &Path,
        stem: &str,
        format: AudioFormat,
    ) -> Result<PathBuf>;
}

/// Flags the fetcher is ever invoked with.
#[derive(Clone, Debug, PartialEq)]
pub enum YtDlpArg {
    GetTitle,
    NoPlaylist,
    Quiet,
    NoWarnings,
    Format(&'static str),
    Output(PathBuf),
    ExtractAudio,
    AudioFormat(AudioFormat),
    AudioQuality(&'static str),
    FfmpegLocation(PathBuf),
}

impl YtDlpArg {
    fn push_to(&self, out: &mut Vec<OsString>) {
        match self {
            YtDlpArg::GetTitle => out.push("--get-title".into()),
            YtDlpArg::NoPlaylist => out.push("--no-playlist".into()),
            YtDlpArg::Quiet => out.push("--quiet".into()),
            YtDlpArg::NoWarnings => out.push("--no-warnings".into()),
            YtDlpArg::Format(f) => out.extend(["-f".into(), (*f).into()]),
            YtDlpArg::Output(p) => out.extend(["-o".into(), p.clone().into_os_string()]),
            YtDlpArg::ExtractAudio => out.push("-x".into()),
            YtDlpArg::AudioFormat(f) => {
                out.extend(["--audio-format".into(), f.extension().into()])
            }
            YtDlpArg::AudioQuality(q) => out.extend(["--audio-quality".into(), (*q).into()]),
            YtDlpArg::FfmpegLocation(p) => {
                out.extend(["--ffmpeg-location".into(), p.clone().into_os_string()])
            }
        }
    }
}

pub fn render_args(args: &[YtDlpArg]) -> Vec<OsString> {
    let mut out = Vec::new();
    for a in args {
        a.push_to(&mut out);
    }
    out
}

pub struct YtDlp {
    program: PathBuf,
    /// Leading arguments, `["-m", "yt_dlp"]` when run through Python.
    prefix: Vec<OsString>,
    ffmpeg: Option<PathBuf>,
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            prefix: Vec::new(),
            ffmpeg: None,
        }
    }

    /// Runs the fetcher as a Python module through `python`.
    pub fn python_module(python: impl Into<PathBuf>) -> Self {
        Self {
            program: python.into(),
            prefix: vec!["-m".into(), "yt_dlp".into()],
            ffmpeg: None,
        }
    }

    /// Lets the fetcher extract audio itself with this ffmpeg.
    pub fn with_ffmpeg(mut self, ffmpeg: Option<PathBuf>) -> Self {
        self.ffmpeg = ffmpeg;
        self
    }

    fn run(&self, args: &[YtDlpArg], url: &str) -> Result<std::process::Output> {
        let mut cmd = tool_command(&self.program);
        cmd.args(&self.prefix).args(render_args(args)).arg(url);
        run_captured(&mut cmd)
    }

    pub fn download_args(&self, dest_dir: &Path, stem: &str, format: AudioFormat) -> Vec<YtDlpArg> {
        let mut args = vec![
            YtDlpArg::Format("bestaudio/best"),
            YtDlpArg::NoPlaylist,
            YtDlpArg::Quiet,
            YtDlpArg::NoWarnings,
            YtDlpArg::Output(dest_dir.join(format!("{stem}.%(ext)s"))),
        ];
        if let Some(ff) = &self.ffmpeg {
            args.extend([
                YtDlpArg::ExtractAudio,
                YtDlpArg::AudioFormat(format),
                YtDlpArg::AudioQuality("192K"),
                YtDlpArg::FfmpegLocation(ff.clone()),
            ]);
        }
        args
    }
}

impl Fetcher for YtDlp {
    fn get_title(&self, url: &str) -> Result<String> {
        let args = [YtDlpArg::GetTitle, YtDlpArg::NoPlaylist, YtDlpArg::NoWarnings];
        let output = self.run(&args, url)?;
        if !output.status.success() {
            return Err(TransposeError::Fetch(format!(
                "could not read title: {}",
                stderr_text(&output)
            )));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let title = stdout.lines().map(str::trim).find(|l| !l.is_empty());
        match title {
            Some(t) => Ok(t.to_string()),
            None => Err(TransposeError::Fetch(format!("no title returned for {url}"))),
        }
    }

    fn download_audio(
        &self,
        url: &str,
        dest_dir: &Path,
        stem: &str,
        format: AudioFormat,
    ) -> Result<PathBuf> {
        info!(url, "downloading audio");
        let output = self.run(&self.download_args(dest_dir, stem, format), url)?;
        if !output.status.success() {
            return Err(TransposeError::Fetch(stderr_text(&output)));
        }
        find_downloaded_audio(dest_dir, stem, format)
    }
}

/// Locates what the fetcher produced in `dir`.
///
/// Tries `<stem>.<preferred>`, then `<stem>` with each native extension, then
/// the newest file with the preferred extension, then the newest native audio
/// file of any name.
pub fn find_downloaded_audio(dir: &Path, stem: &str, preferred: AudioFormat) -> Result<PathBuf> {
    let preferred_ext = preferred.extension();
    let expected = dir.join(format!("{stem}.{preferred_ext}"));
    if expected.is_file() {
        return Ok(expected);
    }
    for ext in NATIVE_AUDIO_EXTENSIONS {
        let candidate = dir.join(format!("{stem}.{ext}"));
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    let mut preferred_hits: Vec<(PathBuf, SystemTime)> = Vec::new();
    let mut native_hits: Vec<(PathBuf, SystemTime)> = Vec::new();
    for entry in fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        let Ok(meta) = entry.metadata() else { continue };
        if !meta.is_file() {
            continue;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        if ext == preferred_ext {
            preferred_hits.push((path, mtime));
        } else if NATIVE_AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            native_hits.push((path, mtime));
        }
    }

    let newest = |hits: Vec<(PathBuf, SystemTime)>| hits.into_iter().max_by_key(|(_, t)| *t).map(|(p, _)| p);
    if let Some(p) = newest(preferred_hits).or_else(|| newest(native_hits)) {
        debug!(path = %p.display(), "found download by directory scan");
        return Ok(p);
    }

    Err(TransposeError::Fetch(format!(
        "no downloaded file found (searched {}/{stem}.*)",
        dir.display()
    )))
}
