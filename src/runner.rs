use std::{path::PathBuf, process::Stdio};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

#[async_trait]
pub trait Runner {
    /// Runs one helm invocation to completion.
    async fn run(&self, args: &[String]) -> Result<()>;
}

/// Runs the helm binary with the plugin's stdout and stderr.
pub struct HelmBinary {
    path: PathBuf,
}

impl HelmBinary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        HelmBinary { path: path.into() }
    }
}

#[async_trait]
impl Runner for HelmBinary {
    async fn run(&self, args: &[String]) -> Result<()> {
        let status = Command::new(&self.path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .with_context(|| format!("spawning {}", self.path.display()))?;

        if !status.success() {
            bail!("{} exited with {}", self.path.display(), status);
        }

        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_exit_status() {
        assert!(HelmBinary::new("true").run(&[]).await.is_ok());

        let err = HelmBinary::new("false").run(&[]).await.unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }

    #[tokio::test]
    async fn missing_binary() {
        let err = HelmBinary::new("/nonexistent/helm")
            .run(&["version".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("spawning /nonexistent/helm"));
    }
}
