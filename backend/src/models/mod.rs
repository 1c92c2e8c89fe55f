pub mod metadata;
pub mod sql_advisor;

pub use metadata::{DbInfo, MySQLServerInfo};
pub use sql_advisor::{
    AdviceRecord, AdviceRecordQuery, AdviseRequest, FingerprintResponse, SqlIdResponse,
    SqlTextRequest,
};
