use directories::{ProjectDirs, UserDirs};
use std::{
    env,
    path::{Path, PathBuf},
};

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "Transposer", "transposer-core")
}

/// Directory where an installer drops managed copies of the external tools.
pub fn managed_tools_dir() -> Option<PathBuf> {
    project_dirs().map(|p| p.data_dir().join("bin"))
}

pub fn config_file_path() -> Option<PathBuf> {
    project_dirs().map(|p| p.config_dir().join("config.json"))
}

/// Explicit tool path from the environment, if it names an existing file.
pub fn env_tool_override(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .map(PathBuf::from)
        .filter(|p| p.is_file())
}

/// Parent directory for per-run private workspaces.
pub fn workspace_root() -> PathBuf {
    env::var("TRANSPOSER_TMP_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir())
}

/// The user's Downloads folder, or `./downloads` when there is none.
pub fn default_output_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|u| u.download_dir().map(Path::to_path_buf))
        .filter(|p| p.is_dir())
        .unwrap_or_else(|| {
            env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("downloads")
        })
}

/// Directory holding the running executable.
pub fn exe_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
}
