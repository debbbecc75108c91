use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, trace};

/// Looks for `file_name` in `dir`, then two levels up (the workspace root
/// when running from a crate directory).
fn find_env_file(dir: &Path, file_name: &str) -> Option<PathBuf> {
    let candidates = [dir.join(file_name), dir.join("../..").join(file_name)];
    let found = candidates.into_iter().find(|path| path.exists());
    match &found {
        Some(path) => trace!("Loading environment variables from: {}", path.display()),
        None => trace!("No environment variables file found with name: {file_name}"),
    }
    found
}

fn load_env_file(path: &Path) -> Result<(), anyhow::Error> {
    dotenv::from_path(path)
        .with_context(|| format!("Failed to load environment variables ({})", path.display()))?;
    debug!("Loaded environment variables from: {}", path.display());
    Ok(())
}

/// Loads `.env` and then `.env.secrets` when present. Variables already set
/// in the process environment win.
pub fn load_optional_env_files(dir: &Path) -> Result<(), anyhow::Error> {
    for name in [".env", ".env.secrets"] {
        if let Some(path) = find_env_file(dir, name) {
            load_env_file(&path)?;
        }
    }
    Ok(())
}

pub fn configure_env() -> Result<(), anyhow::Error> {
    load_optional_env_files(Path::new("."))
}
