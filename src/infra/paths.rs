// src/infra/paths.rs — Config and output locations
//
// SEQFORGE_HOME, when set, holds everything. Otherwise the config lives in the
// platform config dir (XDG_CONFIG_HOME/seqforge on Linux) and generated tests
// go to ./seqforge-tests.

use directories::ProjectDirs;
use std::path::PathBuf;

fn seqforge_home() -> Option<PathBuf> {
    std::env::var_os("SEQFORGE_HOME").map(PathBuf::from)
}

/// Configuration directory.
pub fn config_dir() -> PathBuf {
    if let Some(home) = seqforge_home() {
        return home;
    }
    ProjectDirs::from("", "", "seqforge")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".seqforge"))
}

pub fn config_file_path() -> PathBuf {
    config_dir().join("seqforge.toml")
}

/// Where generated tests are written when neither config nor CLI says otherwise.
pub fn default_output_dir() -> PathBuf {
    match seqforge_home() {
        Some(home) => home.join("tests"),
        None => PathBuf::from("seqforge-tests"),
    }
}
