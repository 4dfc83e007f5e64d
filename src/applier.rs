use std::path::{Path, PathBuf};
use tokio::process::Command as TokioCommand;

use crate::error::{SyncError, SyncResult};

/// Sets the wallpaper by running an external program with the image path
/// as its last argument.
#[derive(Debug, Clone)]
pub struct WallpaperApplier {
    program: String,
    args: Vec<String>,
}

impl WallpaperApplier {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Apply `local_path` as the wallpaper, then delete it.
    ///
    /// If the helper fails the file stays where it is.
    pub async fn apply_and_cleanup(&self, local_path: &Path) -> SyncResult<()> {
        let abs_path = absolute_path(local_path)?;

        let program = which::which(&self.program)
            .map_err(|e| SyncError::subprocess(&self.program, format!("not found: {}", e)))?;

        let output = TokioCommand::new(&program)
            .args(&self.args)
            .arg(&abs_path)
            .output()
            .await
            .map_err(|e| SyncError::subprocess(&self.program, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match output.status.code() {
                Some(code) => format!("exit code {}: {}", code, stderr.trim()),
                None => format!("terminated by signal: {}", stderr.trim()),
            };
            return Err(SyncError::subprocess(&self.program, reason));
        }

        tokio::fs::remove_file(&abs_path)
            .await
            .map_err(|e| SyncError::file_system("removing", &abs_path, e))?;
        Ok(())
    }
}

/// Resolve `path` against the process working directory.
pub fn absolute_path(path: &Path) -> SyncResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| SyncError::file_system("resolving working directory for", path, e))?;
    Ok(cwd.join(path))
}
