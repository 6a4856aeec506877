pub mod ffmpeg;
pub mod locate;
pub mod soundstretch;
pub mod ytdlp;

use tracing::warn;

use crate::error::{Result, TransposeError};
use ffmpeg::{Ffmpeg, MediaConverter};
use locate::{resolve_python, ResolvedToolSet, ToolKind};
use soundstretch::{SoundStretch, TimeStretcher};
use ytdlp::{Fetcher, YtDlp};

/// The set of tool implementations one pipeline drives.
///
/// A missing tool is `None`; the pipeline only fails on it when a stage
/// actually needs that tool.
#[derive(Default)]
pub struct Toolchain {
    pub fetcher: Option<Box<dyn Fetcher>>,
    pub converter: Option<Box<dyn MediaConverter>>,
    pub stretcher: Option<Box<dyn TimeStretcher>>,
}

impl Toolchain {
    /// Real tools from a resolved path set.
    ///
    /// Without a fetcher executable, falls back to `python -m yt_dlp`.
    pub fn from_resolved(tools: &ResolvedToolSet) -> Self {
        let ffmpeg_path = tools.media_converter_path.clone();
        let fetcher = match &tools.fetcher_path {
            Some(p) => Some(YtDlp::new(p)),
            None => resolve_python().map(|py| {
                warn!(python = %py.display(), "yt-dlp not found, trying python -m yt_dlp");
                YtDlp::python_module(py)
            }),
        }
        .map(|f| Box::new(f.with_ffmpeg(ffmpeg_path.clone())) as Box<dyn Fetcher>);

        Self {
            fetcher,
            converter: ffmpeg_path.map(|p| Box::new(Ffmpeg::new(p)) as Box<dyn MediaConverter>),
            stretcher: tools
                .stretcher_path
                .as_ref()
                .map(|p| Box::new(SoundStretch::new(p)) as Box<dyn TimeStretcher>),
        }
    }

    /// Tools found on this machine, using the process-wide path cache.
    pub fn system() -> Self {
        Self::from_resolved(ResolvedToolSet::global())
    }

    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    pub fn with_converter(mut self, converter: impl MediaConverter + 'static) -> Self {
        self.converter = Some(Box::new(converter));
        self
    }

    pub fn with_stretcher(mut self, stretcher: impl TimeStretcher + 'static) -> Self {
        self.stretcher = Some(Box::new(stretcher));
        self
    }

    pub fn require_fetcher(&self) -> Result<&dyn Fetcher> {
        self.fetcher
            .as_deref()
            .ok_or_else(|| TransposeError::unavailable(ToolKind::Fetcher))
    }

    pub fn require_converter(&self) -> Result<&dyn MediaConverter> {
        self.converter
            .as_deref()
            .ok_or_else(|| TransposeError::unavailable(ToolKind::MediaConverter))
    }

    /// The stretcher, but only if it is present and answers a probe.
    pub fn require_stretcher(&self) -> Result<&dyn TimeStretcher> {
        match self.stretcher.as_deref() {
            Some(s) if s.is_available() => Ok(s),
            _ => Err(TransposeError::unavailable(ToolKind::Stretcher)),
        }
    }
}
