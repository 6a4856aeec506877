#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use transposer_core::{
    AudioFormat, CodecOptions, Fetcher, MediaConverter, Progress, Result, StretchFlag,
    TimeStretcher, TransposeError,
};

/// Everything the fake tools were asked to do, in order.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, s: impl Into<String>) {
        self.0.lock().unwrap().push(s.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn any(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }
}

pub struct FakeFetcher {
    pub log: CallLog,
    pub title: String,
    pub payload: Vec<u8>,
    pub ext: &'static str,
    pub fail_title: bool,
    pub fail_download: bool,
}

impl FakeFetcher {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            title: "My Song: Live?".into(),
            payload: b"ID3 fake mp3 payload".to_vec(),
            ext: "mp3",
            fail_title: false,
            fail_download: false,
        }
    }
}

impl Fetcher for FakeFetcher {
    fn get_title(&self, url: &str) -> Result<String> {
        self.log.push(format!("title {url}"));
        if self.fail_title {
            return Err(TransposeError::Fetch("ERROR: Unsupported URL".into()));
        }
        Ok(self.title.clone())
    }

    fn download_audio(
        &self,
        url: &str,
        dest_dir: &Path,
        stem: &str,
        _format: AudioFormat,
    ) -> Result<PathBuf> {
        self.log.push(format!("download {url}"));
        if self.fail_download {
            return Err(TransposeError::Fetch("HTTP Error 403".into()));
        }
        let path = dest_dir.join(format!("{stem}.{}", self.ext));
        fs::write(&path, &self.payload)?;
        Ok(path)
    }
}

pub struct FakeConverter {
    pub log: CallLog,
    pub fail_on: Option<&'static str>,
    pub wav_bits: u16,
}

impl FakeConverter {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            fail_on: None,
            wav_bits: 16,
        }
    }
}

fn codec_name(codec: CodecOptions) -> &'static str {
    match codec {
        CodecOptions::Pcm16 => "pcm16",
        CodecOptions::Mp3 { .. } => "mp3",
        CodecOptions::LameMp3 { .. } => "lame",
    }
}

impl MediaConverter for FakeConverter {
    fn transcode(&self, input: &Path, output: &Path, codec: CodecOptions) -> Result<()> {
        let name = codec_name(codec);
        self.log.push(format!("transcode {name}"));
        assert!(input.is_file(), "transcode input missing: {}", input.display());
        if self.fail_on == Some(name) {
            return Err(TransposeError::Conversion("Invalid data found when processing input".into()));
        }
        match codec {
            CodecOptions::Pcm16 => {
                let spec = hound::WavSpec {
                    channels: 2,
                    sample_rate: 44_100,
                    bits_per_sample: self.wav_bits,
                    sample_format: if self.wav_bits == 32 {
                        hound::SampleFormat::Float
                    } else {
                        hound::SampleFormat::Int
                    },
                };
                let mut w = hound::WavWriter::create(output, spec).unwrap();
                for i in 0..64 {
                    if self.wav_bits == 32 {
                        w.write_sample(i as f32 / 64.0).unwrap();
                    } else {
                        w.write_sample(i as i16).unwrap();
                    }
                }
                w.finalize().unwrap();
            }
            _ => {
                let mut body = b"ENCODED:".to_vec();
                body.extend(fs::read(input)?);
                fs::write(output, body)?;
            }
        }
        Ok(())
    }
}

pub struct FakeStretcher {
    pub log: CallLog,
    pub available: bool,
    pub fail: bool,
    pub flags: Arc<Mutex<Vec<StretchFlag>>>,
}

impl FakeStretcher {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            available: true,
            fail: false,
            flags: Arc::default(),
        }
    }
}

impl TimeStretcher for FakeStretcher {
    fn is_available(&self) -> bool {
        self.available
    }

    fn process(&self, input_wav: &Path, output_wav: &Path, flags: &[StretchFlag]) -> Result<()> {
        self.log.push("stretch");
        *self.flags.lock().unwrap() = flags.to_vec();
        if self.fail {
            return Err(TransposeError::Stretch("Error : unable to detect BPM".into()));
        }
        fs::copy(input_wav, output_wav)?;
        Ok(())
    }
}

/// Collects progress events.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Progress>>>);

impl Recorder {
    pub fn sink(&self) -> impl Fn(Progress) + '_ {
        move |p| self.0.lock().unwrap().push(p)
    }

    pub fn events(&self) -> Vec<Progress> {
        self.0.lock().unwrap().clone()
    }

    pub fn percents(&self) -> Vec<u8> {
        self.events().iter().map(|p| p.percent).collect()
    }
}

pub fn dir_is_empty(dir: &Path) -> bool {
    fs::read_dir(dir).map(|mut d| d.next().is_none()).unwrap_or(true)
}
