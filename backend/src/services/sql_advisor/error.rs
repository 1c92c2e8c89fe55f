//! Error taxonomy of the SQL advisor
//!
//! Resolution and execution failures abort an analysis before any advice is
//! produced. Tool diagnostics and persistence failures are collected into a
//! [`MultiError`] and returned next to whatever advice exists.

use std::fmt;
use std::process::ExitStatus;
use thiserror::Error;

/// Coarse class of an [`AdvisorError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Resolution,
    Execution,
    ToolDiagnostic,
    Persistence,
}

/// Stage of an advise call bounded by the request deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Execute,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Resolve => "resolve",
            Self::Execute => "execute",
            Self::Persist => "persist",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("SQL text is empty")]
    EmptySql,

    #[error("Invalid SQL text: {0}")]
    InvalidSql(String),

    #[error("Database {db_id} not found")]
    DatabaseNotFound { db_id: i64 },

    #[error("Metadata lookup failed for {what}: {source}")]
    MetadataLookup {
        what: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("No server available for database {db_id} (cluster {cluster_id})")]
    NoServerAvailable { db_id: i64, cluster_id: i64 },

    #[error("Failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Advisor exited with {status}: {output}")]
    ExitStatus { status: ExitStatus, output: String },

    #[error("Advisor timed out during {stage} after {secs}s")]
    Timeout { stage: Stage, secs: u64 },

    #[error("Advisor reported errors: {message}")]
    ToolDiagnostic { message: String },

    #[error("Failed to save advice: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl AdvisorError {
    pub fn metadata_lookup(what: impl Into<String>, source: sqlx::Error) -> Self {
        Self::MetadataLookup { what: what.into(), source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptySql | Self::InvalidSql(_) => ErrorKind::Input,
            Self::DatabaseNotFound { .. }
            | Self::MetadataLookup { .. }
            | Self::NoServerAvailable { .. } => ErrorKind::Resolution,
            Self::Spawn { .. } | Self::ExitStatus { .. } => ErrorKind::Execution,
            Self::Timeout { stage, .. } => match stage {
                Stage::Resolve => ErrorKind::Resolution,
                Stage::Execute => ErrorKind::Execution,
                Stage::Persist => ErrorKind::Persistence,
            },
            Self::ToolDiagnostic { .. } => ErrorKind::ToolDiagnostic,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

pub type AdvisorResult<T> = Result<T, AdvisorError>;

/// Ordered collection of errors gathered while an advise call kept going
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<AdvisorError>,
}

impl MultiError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: AdvisorError) {
        self.errors.push(err);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AdvisorError> {
        self.errors.iter()
    }

    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind() == kind)
    }

    /// `None` when nothing was collected
    pub fn error_or_none(self) -> Option<Self> {
        if self.errors.is_empty() { None } else { Some(self) }
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.len() {
            0 => f.write_str("no errors"),
            1 => write!(f, "1 error occurred:\n\t* {}", self.errors[0]),
            n => {
                write!(f, "{} errors occurred:", n)?;
                for err in &self.errors {
                    write!(f, "\n\t* {}", err)?;
                }
                Ok(())
            },
        }
    }
}

impl std::error::Error for MultiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors.first().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl IntoIterator for MultiError {
    type Item = AdvisorError;
    type IntoIter = std::vec::IntoIter<AdvisorError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a MultiError {
    type Item = &'a AdvisorError;
    type IntoIter = std::slice::Iter<'a, AdvisorError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl From<AdvisorError> for MultiError {
    fn from(err: AdvisorError) -> Self {
        Self { errors: vec![err] }
    }
}
