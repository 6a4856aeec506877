#![cfg(unix)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    time::Duration,
};

use tempfile::tempdir;
use transposer_core::{
    tools::{ffmpeg::Ffmpeg, soundstretch::SoundStretch, ytdlp::YtDlp},
    AudioFormat, CodecOptions, ErrorKind, Fetcher, MediaConverter, StretchFlag, TimeStretcher,
};

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let p = dir.join(name);
    fs::write(&p, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&p, fs::Permissions::from_mode(0o755)).unwrap();
    p
}

#[test]
fn soundstretch_gets_files_then_flags() {
    let tmp = tempdir().unwrap();
    let args_file = tmp.path().join("args.txt");
    let st = script(
        tmp.path(),
        "soundstretch",
        &format!("echo \"$@\" > {}\ncp \"$1\" \"$2\"", args_file.display()),
    );
    let input = tmp.path().join("in.wav");
    let output = tmp.path().join("out.wav");
    fs::write(&input, b"RIFF").unwrap();

    SoundStretch::new(&st)
        .process(&input, &output, &[StretchFlag::Pitch(-2.0), StretchFlag::Tempo(12.5)])
        .unwrap();

    let args = fs::read_to_string(&args_file).unwrap();
    assert_eq!(
        args.trim(),
        format!("{} {} -pitch=-2.00 -tempo=12.50", input.display(), output.display())
    );
    assert_eq!(fs::read(&output).unwrap(), b"RIFF");
}

#[test]
fn soundstretch_failure_keeps_diagnostics() {
    let tmp = tempdir().unwrap();
    let st = script(tmp.path(), "soundstretch", "echo 'Error: bad WAV header' >&2\nexit 1");
    let err = SoundStretch::new(&st)
        .process(Path::new("a.wav"), Path::new("b.wav"), &[StretchFlag::Bpm(128)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Stretch);
    assert!(err.to_string().contains("Error: bad WAV header"));
}

#[test]
fn soundstretch_probe_accepts_noisy_nonzero_exit() {
    let tmp = tempdir().unwrap();
    let noisy = script(tmp.path(), "noisy", "echo 'SoundStretch v2.3.3 usage' \nexit 255");
    let silent = script(tmp.path(), "silent", "exit 0");
    assert!(SoundStretch::new(&noisy).is_available());
    assert!(!SoundStretch::new(&silent)
        .with_probe_timeout(Duration::from_secs(2))
        .is_available());
}

#[test]
fn ytdlp_title_is_first_nonempty_line() {
    let tmp = tempdir().unwrap();
    let yt = script(tmp.path(), "yt-dlp", "echo\necho '  A Title  '\necho 'Second'");
    let title = YtDlp::new(&yt).get_title("https://example/v").unwrap();
    assert_eq!(title, "A Title");
}

#[test]
fn ytdlp_title_failure_is_fetch_error() {
    let tmp = tempdir().unwrap();
    let yt = script(tmp.path(), "yt-dlp", "echo 'ERROR: Unsupported URL' >&2\nexit 1");
    let err = YtDlp::new(&yt).get_title("nope").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Fetch);
    assert!(err.to_string().contains("Unsupported URL"));
}

#[test]
fn ytdlp_download_is_found_by_template() {
    let tmp = tempdir().unwrap();
    let yt = script(
        tmp.path(),
        "yt-dlp",
        r#"while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
f=$(echo "$out" | sed 's/%(ext)s/m4a/')
printf 'audio' > "$f""#,
    );
    let work = tmp.path().join("work");
    fs::create_dir_all(&work).unwrap();

    let got = YtDlp::new(&yt)
        .download_audio("https://example/v", &work, "download", AudioFormat::Mp3)
        .unwrap();
    assert_eq!(got, work.join("download.m4a"));
}

#[test]
fn ffmpeg_failure_is_conversion_error() {
    let tmp = tempdir().unwrap();
    let ff = script(tmp.path(), "ffmpeg", "echo 'in.mp3: Invalid data' >&2\nexit 1");
    let err = Ffmpeg::new(&ff)
        .transcode(Path::new("in.mp3"), Path::new("out.wav"), CodecOptions::Pcm16)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conversion);
    assert!(err.to_string().contains("Invalid data"));
}
