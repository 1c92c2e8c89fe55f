use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::advisor::{Advisor, with_deadline};
use super::error::{AdvisorError, AdvisorResult, MultiError, Stage};
use super::fingerprint;
use super::invoker::{Invoker, ProcessInvoker};
use super::repository::AdviceRepository;
use super::resolver::{MetadataSource, SqliteMetadataSource, TargetResolver};
use crate::config::AdvisorConfig;
use crate::models::AdviceRecord;

/// What one advise call produced
#[derive(Debug)]
pub struct AdviseOutcome {
    /// Advice text, empty when soar could not run
    pub advice: String,
    /// soar's own log output
    pub message: String,
    /// Everything that went wrong, in the order it happened
    pub errors: Option<MultiError>,
}

impl AdviseOutcome {
    pub fn into_result(self) -> Result<String, (String, MultiError)> {
        match self.errors {
            None => Ok(self.advice),
            Some(errors) => Err((self.advice, errors)),
        }
    }
}

#[derive(Clone)]
pub struct SqlAdvisorService {
    advisor: Advisor,
    repository: AdviceRepository,
    timeout: Duration,
}

impl SqlAdvisorService {
    /// Wire the service against the metadata store and the real soar binary
    pub fn new(pool: SqlitePool, config: AdvisorConfig) -> Self {
        let metadata = Arc::new(SqliteMetadataSource::new(pool.clone()));
        Self::with_parts(metadata, Arc::new(ProcessInvoker), AdviceRepository::new(pool), config)
    }

    pub fn with_parts(
        metadata: Arc<dyn MetadataSource>,
        invoker: Arc<dyn Invoker>,
        repository: AdviceRepository,
        config: AdvisorConfig,
    ) -> Self {
        let timeout = config.timeout();
        let advisor = Advisor::new(TargetResolver::new(metadata), invoker, config);
        Self { advisor, repository, timeout }
    }

    pub fn get_fingerprint(&self, sql_text: &str) -> AdvisorResult<String> {
        fingerprint::fingerprint(sql_text)
    }

    pub fn get_sql_id(&self, sql_text: &str) -> AdvisorResult<String> {
        fingerprint::sql_id(sql_text)
    }

    /// Analyze the first statement of `sql_text` on database `db_id`
    ///
    /// Only splitting failures are returned as `Err`. Every later failure is
    /// collected into the outcome, and an audit row is written either way.
    pub async fn advise(&self, db_id: i64, sql_text: &str) -> AdvisorResult<AdviseOutcome> {
        let statements = fingerprint::split_statements(sql_text)?;
        if statements.len() > 1 {
            tracing::warn!(
                "SQL text for database {} has {} statements, only the first is analyzed",
                db_id,
                statements.len()
            );
        }
        let first = statements.into_iter().next().ok_or(AdvisorError::EmptySql)?;

        let mut errors = MultiError::new();
        let deadline = Instant::now() + self.timeout;

        let (advice, message) = match self.advisor.advise(db_id, &first, deadline).await {
            Ok(result) => {
                if let Some(message) = result.tool_error {
                    errors.push(AdvisorError::ToolDiagnostic { message });
                }
                (result.advice, result.diagnostic_log)
            },
            Err(e) => {
                tracing::warn!("Advisor failed for database {}: {}", db_id, e);
                errors.push(e);
                (String::new(), String::new())
            },
        };

        if !message.is_empty() {
            tracing::info!("soar message for database {}:\n{}", db_id, message);
        }

        // A fresh bound so that runs which exhausted the deadline are still audited
        let save_deadline = Instant::now() + self.timeout;
        let saved = with_deadline(
            Stage::Persist,
            save_deadline,
            self.timeout.as_secs(),
            self.repository.save(db_id, sql_text, &advice, &message),
        )
        .await;
        if let Err(e) = saved {
            tracing::error!("Failed to save advice for database {}: {}", db_id, e);
            errors.push(e);
        }

        Ok(AdviseOutcome { advice, message, errors: errors.error_or_none() })
    }

    pub async fn list_records(&self, db_id: i64, limit: i64) -> AdvisorResult<Vec<AdviceRecord>> {
        self.repository.list_by_db_id(db_id, limit).await
    }
}
