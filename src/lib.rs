//! # transposer-core
//!
//! Downloads a remote audio source, optionally shifts its pitch, tempo, rate
//! or BPM, and delivers a descriptively named MP3 into a target directory.
//! All media work is delegated to external tools (yt-dlp, ffmpeg,
//! soundstretch); this crate orchestrates them inside a private workspace.

pub mod batch;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod paths;
pub mod tools;
pub mod types;
pub mod worker;

pub use crate::{
    config::AppConfig,
    core::{
        naming::{compute_names, sanitize_filename, OutputNames},
        params::{normalize, NormalizedParams, TransformMode},
        pipeline::{run_pipeline, Pipeline},
    },
    error::{ErrorKind, Result, TransposeError},
    io::progress::{EventSink, NullSink, Progress},
    tools::{
        ffmpeg::{CodecOptions, MediaConverter},
        locate::{ResolvedToolSet, ToolKind},
        soundstretch::{StretchFlag, TimeStretcher},
        ytdlp::Fetcher,
        Toolchain,
    },
    types::{AudioFormat, Stage, TransformRequest},
    worker::{spawn_job, JobEvent},
};
