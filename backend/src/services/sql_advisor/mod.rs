//! SQL tuning advisor
//!
//! Given a database id and a SQL statement, resolves the live server of the
//! database, runs soar against it, separates soar's log from its advice and
//! records every attempt in the audit table.

pub mod advisor;
pub mod classifier;
pub mod error;
pub mod fingerprint;
pub mod invoker;
pub mod repository;
pub mod resolver;
pub mod service;

pub use advisor::Advisor;
pub use classifier::{ClassifiedResult, classify};
pub use error::{AdvisorError, AdvisorResult, ErrorKind, MultiError, Stage};
pub use invoker::{Invoker, ProcessInvoker};
pub use repository::{AdviceRepository, SqlArg};
pub use resolver::{ConnectionTarget, MetadataSource, SqliteMetadataSource, TargetResolver};
pub use service::{AdviseOutcome, SqlAdvisorService};
