//! Runs soar against the live target of one database

use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;

use super::classifier::{ClassifiedResult, classify};
use super::error::{AdvisorError, AdvisorResult, Stage};
use super::invoker::Invoker;
use super::resolver::TargetResolver;
use crate::config::AdvisorConfig;

/// Bound `fut` by `deadline`, reporting which stage ran out of time
pub(crate) async fn with_deadline<T, F>(
    stage: Stage,
    deadline: Instant,
    secs: u64,
    fut: F,
) -> AdvisorResult<T>
where
    F: Future<Output = AdvisorResult<T>>,
{
    tokio::time::timeout_at(deadline, fut)
        .await
        .map_err(|_| AdvisorError::Timeout { stage, secs })?
}

#[derive(Clone)]
pub struct Advisor {
    resolver: TargetResolver,
    invoker: Arc<dyn Invoker>,
    config: AdvisorConfig,
}

impl Advisor {
    pub fn new(resolver: TargetResolver, invoker: Arc<dyn Invoker>, config: AdvisorConfig) -> Self {
        Self { resolver, invoker, config }
    }

    /// Resolve the target, run soar and classify its output
    ///
    /// Resolution and execution failures are returned as errors. Errors soar
    /// logged about itself are left in `tool_error` for the caller.
    pub async fn advise(
        &self,
        db_id: i64,
        sql_text: &str,
        deadline: Instant,
    ) -> AdvisorResult<ClassifiedResult> {
        let secs = self.config.timeout_secs;

        let dsn = with_deadline(
            Stage::Resolve,
            deadline,
            secs,
            self.resolver
                .get_online_dsn(db_id, &self.config.db_user, &self.config.db_pass),
        )
        .await?;

        tracing::debug!("Running {} for database {}", self.config.soar_bin, db_id);

        let raw = with_deadline(
            Stage::Execute,
            deadline,
            secs,
            self.invoker
                .run(&self.config.soar_bin, &self.config.soar_config, &dsn, sql_text),
        )
        .await?;

        Ok(classify(&raw))
    }
}
