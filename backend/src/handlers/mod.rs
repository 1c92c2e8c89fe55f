pub mod health;
pub mod sql_advisor;
