use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::process::Command;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Scratch directory holding a config file, a database and a download dir
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        std::fs::create_dir_all(temp_dir.path().join("downloads"))?;
        Ok(Self { temp_dir })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.toml")
    }

    pub fn database_path(&self) -> PathBuf {
        self.path().join("history.db")
    }

    pub fn downloads(&self) -> PathBuf {
        self.path().join("downloads")
    }

    /// File the test helper writes the applied image path into
    pub fn applied_marker(&self) -> PathBuf {
        self.path().join("applied.txt")
    }

    /// Write a config pointing at `endpoint` whose helper runs `sh -c <script>`
    pub fn write_config(&self, endpoint: &str, script: &str) -> Result<()> {
        let config = format!(
            "endpoint = {endpoint:?}\n\
             helper = \"sh\"\n\
             helper_args = [\"-c\", {script:?}]\n\
             download_dir = {downloads:?}\n\
             database = {database:?}\n",
            downloads = self.downloads().display().to_string(),
            database = self.database_path().display().to_string(),
        );
        std::fs::write(self.config_path(), config)?;
        Ok(())
    }

    /// Config whose helper records the image path it receives
    pub fn write_recording_config(&self, endpoint: &str) -> Result<()> {
        let script = format!("printf '%s' \"$0\" > '{}'", self.applied_marker().display());
        self.write_config(endpoint, &script)
    }

    pub async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::new(env!("CARGO_BIN_EXE_gistwall"))
            .arg("--config")
            .arg(self.config_path())
            .args(args)
            .current_dir(self.path())
            .output()
            .await?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

/// Parse one JSON event per non-empty line
pub fn json_events(out: &str) -> Vec<serde_json::Value> {
    out.lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| serde_json::from_str(l).ok())
        .collect()
}
