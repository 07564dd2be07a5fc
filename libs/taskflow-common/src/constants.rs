//! Constants shared across TaskFlow crates

/// Remote table holding tasks
pub const TASK_TABLE: &str = "task";

/// Remote table holding projects
pub const PROJECT_TABLE: &str = "project";

/// Page size used when fetching tasks
pub const DEFAULT_TASK_PAGE_SIZE: u32 = 100;

/// Page size used when fetching projects
pub const DEFAULT_PROJECT_PAGE_SIZE: u32 = 50;

/// Largest page size the record service accepts
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Default request timeout for the HTTP record client
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Separator used for tag lists on the wire
pub const TAG_SEPARATOR: char = ',';

/// Wire field every record is ordered by
pub const CREATED_ON_FIELD: &str = "CreatedOn";

/// Environment variable names read by the configuration layer
pub const ENV_API_URL: &str = "TASKFLOW_API_URL";
pub const ENV_PROJECT_ID: &str = "TASKFLOW_PROJECT_ID";
pub const ENV_PUBLIC_KEY: &str = "TASKFLOW_PUBLIC_KEY";
pub const ENV_TASK_PAGE_SIZE: &str = "TASKFLOW_TASK_PAGE_SIZE";
pub const ENV_PROJECT_PAGE_SIZE: &str = "TASKFLOW_PROJECT_PAGE_SIZE";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "TASKFLOW_REQUEST_TIMEOUT_SECS";
pub const ENV_LOG_LEVEL: &str = "TASKFLOW_LOG_LEVEL";

/// Accepted date formats, wire format first
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
