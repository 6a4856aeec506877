use crate::{
    core::{
        naming::{compute_names, ensure_output_dir, sanitize_filename, OutputNames},
        params::NormalizedParams,
    },
    error::{Result, TransposeError},
    io::progress::{EventSink, Progress},
    paths::{default_output_dir, workspace_root},
    tools::{
        ffmpeg::CodecOptions,
        soundstretch::stretch_flags,
        Toolchain,
    },
    types::{AudioFormat, Stage, TransformRequest},
};

use anyhow::Context;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Stem the fetcher writes to inside the workspace, before renaming.
const DOWNLOAD_STEM: &str = "download";
const WAV_IN: &str = "temp_input.wav";
const WAV_OUT: &str = "temp_output.wav";

/// Runs download-transform-deliver jobs against one toolchain.
///
/// A `Pipeline` holds no per-run state and can be shared between threads;
/// every call to [`Pipeline::run`] gets its own private workspace.
pub struct Pipeline {
    tools: Toolchain,
    workspace_root: PathBuf,
}

impl Pipeline {
    pub fn new(tools: Toolchain) -> Self {
        Self {
            tools,
            workspace_root: workspace_root(),
        }
    }

    /// Pipeline over the tools installed on this machine.
    pub fn system() -> Self {
        Self::new(Toolchain::system())
    }

    /// Creates run workspaces under `root` instead of the OS temp dir.
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    pub fn tools(&self) -> &Toolchain {
        &self.tools
    }

    /// Runs one job and returns the absolute path of the delivered file.
    ///
    /// The private workspace is removed before this returns, whatever the
    /// outcome. No progress is emitted after an error.
    pub fn run(&self, request: &TransformRequest, sink: &dyn EventSink) -> Result<PathBuf> {
        let url = request.source_url.trim();
        if url.is_empty() {
            return Err(TransposeError::InvalidInput("source URL is empty".into()));
        }
        let params = request.normalized()?;
        let output_dir = request
            .output_dir
            .clone()
            .unwrap_or_else(default_output_dir);

        fs::create_dir_all(&self.workspace_root).with_context(|| {
            format!("Failed to create workspace root: {}", self.workspace_root.display())
        })?;
        let workspace = tempfile::Builder::new()
            .prefix("yt_transpose_")
            .tempdir_in(&self.workspace_root)
            .context("Failed to create private workspace")?;

        let mut run = PipelineRun::new(workspace);
        let result = run.execute(&self.tools, url, &params, &output_dir, sink);
        if let Err(e) = &result {
            warn!(stage = %run.stage, error = %e, "pipeline failed");
            run.stage = Stage::Failed;
        }
        run.cleanup();

        let path = result?;
        sink.emit(Progress::new(100, "Completed!"));
        info!(path = %path.display(), "completed");
        Ok(path)
    }
}

/// State of one invocation. Owns the workspace; dropped before `run` returns.
struct PipelineRun {
    workspace: Option<TempDir>,
    workspace_dir: PathBuf,
    stage: Stage,
    title: Option<String>,
    result_path: Option<PathBuf>,
}

impl PipelineRun {
    fn new(workspace: TempDir) -> Self {
        let workspace_dir = workspace.path().to_path_buf();
        debug!(workspace = %workspace_dir.display(), "workspace created");
        Self {
            workspace: Some(workspace),
            workspace_dir,
            stage: Stage::FetchTitle,
            title: None,
            result_path: None,
        }
    }

    fn enter(&mut self, stage: Stage, sink: &dyn EventSink, percent: u8, message: String) {
        self.stage = stage;
        debug!(%stage, "entering stage");
        sink.emit(Progress::new(percent, message));
    }

    fn execute(
        &mut self,
        tools: &Toolchain,
        url: &str,
        params: &NormalizedParams,
        output_dir: &Path,
        sink: &dyn EventSink,
    ) -> Result<PathBuf> {
        self.enter(Stage::FetchTitle, sink, 0, "Getting video title...".into());
        let fetcher = tools.require_fetcher()?;
        let title = sanitize_filename(&fetcher.get_title(url)?);
        let names = compute_names(&title, params);
        self.title = Some(title.clone());

        ensure_output_dir(output_dir)?;

        self.enter(Stage::Download, sink, 30, format!("Downloading: {title}"));
        let fetched = fetcher.download_audio(url, &self.workspace_dir, DOWNLOAD_STEM, AudioFormat::Mp3)?;
        let intermediate = self.workspace_dir.join(&names.intermediate);
        self.ensure_mp3(tools, &fetched, &intermediate, sink)?;

        let deliverable = if params.needs_processing {
            self.process(tools, params, &intermediate, &names, sink)?
        } else {
            intermediate
        };

        self.enter(Stage::Deliver, sink, 95, "Moving files to output directory...".into());
        let dest = deliver(&deliverable, output_dir, &names.final_name)?;
        self.result_path = Some(dest.clone());
        self.stage = Stage::Done;
        Ok(dest)
    }

    /// Brings the fetched file to `<workspace>/<title>.mp3`.
    fn ensure_mp3(
        &self,
        tools: &Toolchain,
        fetched: &Path,
        intermediate: &Path,
        sink: &dyn EventSink,
    ) -> Result<()> {
        let is_mp3 = fetched
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(AudioFormat::Mp3.extension()));

        if !is_mp3 {
            let converter = tools.require_converter()?;
            sink.emit(Progress::new(40, "Converting to MP3..."));
            converter.transcode(fetched, intermediate, CodecOptions::lame_mp3())?;
            if let Err(e) = fs::remove_file(fetched) {
                debug!(error = %e, "could not remove native download");
            }
        } else if fetched != intermediate {
            if fs::rename(fetched, intermediate).is_err() {
                fs::copy(fetched, intermediate).with_context(|| {
                    format!("Failed to stage download as {}", intermediate.display())
                })?;
                if let Err(e) = fs::remove_file(fetched) {
                    debug!(error = %e, "could not remove staged download");
                }
            }
        }

        if !intermediate.is_file() {
            return Err(TransposeError::Fetch(format!(
                "downloaded audio missing at {}",
                intermediate.display()
            )));
        }
        Ok(())
    }

    /// convert-to-wav, stretch, convert-to-mp3. Returns the processed file.
    fn process(
        &mut self,
        tools: &Toolchain,
        params: &NormalizedParams,
        intermediate: &Path,
        names: &OutputNames,
        sink: &dyn EventSink,
    ) -> Result<PathBuf> {
        // Both tools are checked up front so nothing is spawned for a run that cannot finish.
        let stretcher = tools.require_stretcher()?;
        let converter = tools.require_converter()?;
        sink.emit(Progress::new(70, params.describe()));

        let wav_in = self.workspace_dir.join(WAV_IN);
        let wav_out = self.workspace_dir.join(WAV_OUT);
        let processed = self.workspace_dir.join(&names.final_name);

        self.enter(Stage::ConvertToWav, sink, 75, "Converting to WAV format...".into());
        converter.transcode(intermediate, &wav_in, CodecOptions::Pcm16)?;
        verify_pcm16(&wav_in)?;

        self.enter(Stage::Stretch, sink, 80, "Processing with SoundTouch...".into());
        stretcher.process(&wav_in, &wav_out, &stretch_flags(params))?;
        if !wav_out.is_file() {
            return Err(TransposeError::Stretch(format!(
                "no output written to {}",
                wav_out.display()
            )));
        }

        self.enter(Stage::ConvertToMp3, sink, 90, "Converting back to MP3...".into());
        converter.transcode(&wav_out, &processed, CodecOptions::mp3())?;
        if !processed.is_file() {
            return Err(TransposeError::Conversion(format!(
                "no output written to {}",
                processed.display()
            )));
        }
        Ok(processed)
    }

    /// Best-effort removal of the workspace; failures are logged, never raised.
    fn cleanup(&mut self) {
        if let Some(ws) = self.workspace.take() {
            if let Err(e) = ws.close() {
                warn!(workspace = %self.workspace_dir.display(), error = %e, "workspace cleanup failed");
            }
        }
        debug!(
            stage = %self.stage,
            title = ?self.title,
            result = ?self.result_path,
            "run finished"
        );
    }
}

impl Drop for PipelineRun {
    fn drop(&mut self) {
        if self.workspace.is_some() {
            self.cleanup();
        }
    }
}

fn verify_pcm16(path: &Path) -> Result<()> {
    let spec = hound::WavReader::open(path)?.spec();
    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        return Err(TransposeError::Conversion(format!(
            "expected 16-bit PCM, got {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }
    Ok(())
}

/// Copies `src` into `dir` as `name`, replacing an existing file.
fn deliver(src: &Path, dir: &Path, name: &str) -> Result<PathBuf> {
    let dest = dir.join(name);
    if dest.exists() {
        if let Err(e) = fs::remove_file(&dest) {
            debug!(error = %e, "could not remove previous output, overwriting");
        }
    }
    fs::copy(src, &dest).with_context(|| format!("Failed to copy result to {}", dest.display()))?;
    Ok(std::path::absolute(&dest).unwrap_or(dest))
}

/// One-call form of [`Pipeline::run`] over the system toolchain.
pub fn run_pipeline(
    source_url: &str,
    semitones: f64,
    on_progress: impl Fn(u8, &str),
    output_dir: Option<&Path>,
    tempo_percent: Option<f64>,
    rate_percent: Option<f64>,
    target_bpm: Option<f64>,
) -> Result<PathBuf> {
    let request = TransformRequest {
        source_url: source_url.to_string(),
        semitones,
        tempo_percent,
        rate_percent,
        target_bpm,
        output_dir: output_dir.map(Path::to_path_buf),
    };
    let sink = |p: Progress| on_progress(p.percent, &p.message);
    Pipeline::system().run(&request, &sink)
}
