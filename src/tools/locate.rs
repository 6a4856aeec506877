use std::{
    env, fmt,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use tracing::debug;

use crate::paths::{env_tool_override, exe_dir, managed_tools_dir};

/// The external tools the pipeline drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Fetcher,
    MediaConverter,
    Stretcher,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [ToolKind::Fetcher, ToolKind::MediaConverter, ToolKind::Stretcher];

    /// Executable base names, most preferred first.
    pub fn program_names(self) -> &'static [&'static str] {
        match self {
            ToolKind::Fetcher => &["yt-dlp", "yt_dlp"],
            ToolKind::MediaConverter => &["ffmpeg"],
            ToolKind::Stretcher => &["soundstretch"],
        }
    }

    pub fn env_var(self) -> &'static str {
        match self {
            ToolKind::Fetcher => "TRANSPOSER_YTDLP",
            ToolKind::MediaConverter => "TRANSPOSER_FFMPEG",
            ToolKind::Stretcher => "TRANSPOSER_SOUNDSTRETCH",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program_names()[0])
    }
}

pub fn install_guidance(tool: ToolKind) -> String {
    let how = match tool {
        ToolKind::Fetcher => "Install yt-dlp (https://github.com/yt-dlp/yt-dlp#installation), \
             e.g. `pip install yt-dlp`.",
        ToolKind::MediaConverter => "Install ffmpeg (https://ffmpeg.org/download.html) \
             or your platform's ffmpeg package.",
        ToolKind::Stretcher => "Install the SoundTouch command line tool \
             (https://www.surina.net/soundtouch/download.html or \
             https://github.com/SoundTouch/SoundTouch/releases).",
    };
    let managed = managed_tools_dir()
        .map(|d| format!("\n  - into {}", d.display()))
        .unwrap_or_default();
    format!(
        "{how}\nPlace `{exe}` next to this program{managed}\n  - or anywhere on your PATH\n  \
         - or point {var} at it.",
        exe = executable_name(tool.program_names()[0]),
        var = tool.env_var(),
    )
}

fn executable_name(base: &str) -> String {
    if cfg!(windows) {
        format!("{base}.exe")
    } else {
        base.to_string()
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Directories searched, in order: bundled, managed, `PATH`, known alternates.
pub fn search_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    dirs.extend(exe_dir());
    dirs.extend(managed_tools_dir());
    dirs.extend(
        env::var_os("PATH").map_or_else(Vec::new, |paths| env::split_paths(&paths).collect()),
    );
    dirs.extend(alternate_dirs());
    dirs
}

fn alternate_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(home) = directories::BaseDirs::new().map(|b| b.home_dir().to_path_buf()) {
        dirs.push(home.join(".local").join("bin"));
        if cfg!(windows) {
            dirs.push(home.join("AppData").join("Local").join("Microsoft").join("WinGet").join("Links"));
            dirs.push(home.join("scoop").join("shims"));
        }
    }
    if cfg!(windows) {
        dirs.push(PathBuf::from(r"C:\ProgramData\chocolatey\bin"));
    } else {
        dirs.extend([
            PathBuf::from("/usr/local/bin"),
            PathBuf::from("/opt/homebrew/bin"),
            PathBuf::from("/opt/local/bin"),
        ]);
    }
    dirs
}

/// Finds the first executable for `tool` in `dirs`.
pub fn resolve_in(tool: ToolKind, dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter().find_map(|dir| {
        tool.program_names()
            .iter()
            .map(|name| dir.join(executable_name(name)))
            .find(|candidate| is_executable(candidate))
    })
}

/// Resolves a tool path. Never downloads anything; `None` means not installed.
pub fn resolve(tool: ToolKind) -> Option<PathBuf> {
    let found = env_tool_override(tool.env_var()).or_else(|| resolve_in(tool, &search_dirs()));
    debug!(%tool, path = ?found, "resolved tool");
    found
}

/// A Python interpreter, for running the fetcher as `python -m yt_dlp`.
pub fn resolve_python() -> Option<PathBuf> {
    let dirs: Vec<PathBuf> =
        env::var_os("PATH").map_or_else(Vec::new, |paths| env::split_paths(&paths).collect());
    ["python3", "python", "py"].iter().find_map(|name| {
        dirs.iter()
            .map(|d| d.join(executable_name(name)))
            .find(|c| is_executable(c))
    })
}

/// Paths of every tool, as resolved at one point in time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedToolSet {
    pub fetcher_path: Option<PathBuf>,
    pub media_converter_path: Option<PathBuf>,
    pub stretcher_path: Option<PathBuf>,
}

static RESOLVED: OnceLock<ResolvedToolSet> = OnceLock::new();

impl ResolvedToolSet {
    pub fn resolve() -> Self {
        Self {
            fetcher_path: resolve(ToolKind::Fetcher),
            media_converter_path: resolve(ToolKind::MediaConverter),
            stretcher_path: resolve(ToolKind::Stretcher),
        }
    }

    /// Process-wide set, resolved on first use and cached for the process lifetime.
    pub fn global() -> &'static ResolvedToolSet {
        RESOLVED.get_or_init(Self::resolve)
    }

    pub fn get(&self, tool: ToolKind) -> Option<&Path> {
        match tool {
            ToolKind::Fetcher => self.fetcher_path.as_deref(),
            ToolKind::MediaConverter => self.media_converter_path.as_deref(),
            ToolKind::Stretcher => self.stretcher_path.as_deref(),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::{fs, os::unix::fs::PermissionsExt};
    use tempfile::tempdir;

    fn touch_exec(path: &Path) {
        fs::write(path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn earlier_dirs_win() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        touch_exec(&a.path().join("ffmpeg"));
        touch_exec(&b.path().join("ffmpeg"));
        let dirs = vec![a.path().to_path_buf(), b.path().to_path_buf()];
        assert_eq!(
            resolve_in(ToolKind::MediaConverter, &dirs),
            Some(a.path().join("ffmpeg"))
        );
    }

    #[test]
    fn alternate_program_names_are_tried() {
        let a = tempdir().unwrap();
        touch_exec(&a.path().join("yt_dlp"));
        let dirs = vec![a.path().to_path_buf()];
        assert_eq!(resolve_in(ToolKind::Fetcher, &dirs), Some(a.path().join("yt_dlp")));
    }

    #[test]
    fn non_executables_and_missing_tools_are_none() {
        let a = tempdir().unwrap();
        fs::write(a.path().join("soundstretch"), "not executable").unwrap();
        let dirs = vec![a.path().to_path_buf()];
        assert_eq!(resolve_in(ToolKind::Stretcher, &dirs), None);
        assert_eq!(resolve_in(ToolKind::MediaConverter, &dirs), None);
    }

    #[test]
    fn display_uses_program_name() {
        assert_eq!(ToolKind::Stretcher.to_string(), "soundstretch");
        assert_eq!(ToolKind::Fetcher.to_string(), "yt-dlp");
    }
}
