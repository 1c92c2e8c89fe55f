//! Runs the soar binary for a single query

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use super::error::{AdvisorError, AdvisorResult};

/// Executes the advisor binary and returns its raw stdout
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn run(
        &self,
        soar_bin: &str,
        config_file: &str,
        dsn: &str,
        sql_text: &str,
    ) -> AdvisorResult<String>;
}

/// Build the soar argument list
///
/// Arguments are passed as an array, no shell is involved, so the query
/// text needs no quoting.
pub fn soar_args(config_file: &str, dsn: &str, sql_text: &str) -> Vec<String> {
    vec![
        format!("-config={}", config_file),
        format!("-online-dsn={}", dsn),
        format!("-query={}", sql_text),
    ]
}

/// Spawns soar as a child process
///
/// The child is killed if the future driving it is dropped, so a caller
/// deadline also ends the process.
#[derive(Debug, Clone, Default)]
pub struct ProcessInvoker;

#[async_trait]
impl Invoker for ProcessInvoker {
    async fn run(
        &self,
        soar_bin: &str,
        config_file: &str,
        dsn: &str,
        sql_text: &str,
    ) -> AdvisorResult<String> {
        let output = Command::new(soar_bin)
            .args(soar_args(config_file, dsn, sql_text))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AdvisorError::Spawn { binary: soar_bin.to_string(), source: e })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            tracing::debug!("{} stderr:\n{}", soar_bin, stderr);
        }

        if !output.status.success() {
            tracing::warn!("{} exited with {}", soar_bin, output.status);
            return Err(AdvisorError::ExitStatus {
                status: output.status,
                output: stderr.into_owned(),
            });
        }

        // stdout alone carries the log lines and the report
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
