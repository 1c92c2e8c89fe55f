pub mod sql_advisor;

pub use sql_advisor::SqlAdvisorService;
