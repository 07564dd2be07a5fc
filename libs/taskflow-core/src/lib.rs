//! TaskFlow Core - task and project state synchronized with a remote record service
//!
//! This library keeps a UI-shaped view of tasks and projects in sync with a
//! generic remote record API. Local state only changes once the service has
//! confirmed a mutation.
//!
//! # Features
//!
//! - **Typed Wire Schema**: writable fields are declared per table, audit fields can never be sent
//! - **Entity Services**: fetch/get/create/update/delete with batch result normalization
//! - **View State Controller**: form lifecycle, filtering, statistics and stale-response guarding
//! - **Pluggable Transport**: any [`RecordClient`]; an HTTP client ships behind `http-client`
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskflow_core::{
//!     HttpRecordClient, ProjectService, RecordClient, TaskBoard, TaskService, TaskflowConfig,
//!     TaskflowError,
//! };
//!
//! # async fn example() -> Result<(), TaskflowError> {
//! let config = TaskflowConfig::from_env()?;
//! let client: Arc<dyn RecordClient> = Arc::new(HttpRecordClient::new(&config)?);
//!
//! let board = TaskBoard::new(
//!     TaskService::new(Arc::clone(&client)).with_page_size(config.task_page_size),
//!     ProjectService::new(client).with_page_size(config.project_page_size),
//! );
//! board.load().await;
//! println!("{} tasks, {} overdue", board.stats().total, board.stats().overdue);
//! # Ok(())
//! # }
//! ```
//!
//! # Crate Features
//!
//! - `http-client` (default): [`HttpRecordClient`] over `reqwest`
//! - `test-utils`: in-memory record client and fixtures (for testing only)

pub mod board;
pub mod client;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod mappers;
pub mod models;
pub mod schema;
pub mod service;
pub mod stats;
pub mod tags;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use board::{ActionOutcome, FormMode, FormState, Notification, NotificationLevel, TaskBoard};
#[cfg(feature = "http-client")]
pub use client::HttpRecordClient;
pub use client::{FetchOptions, OrderBy, PagingInfo, RecordClient, SortType, WhereClause};
pub use config::{PartialConfig, TaskflowConfig};
pub use config_loader::{load_config, ConfigLoader};
pub use error::{RecordFailure, Result, TaskflowError};
pub use models::*;
pub use schema::{EntitySchema, ProjectFields, ProjectSchema, TaskFields, TaskSchema};
pub use service::{BulkDeleteResult, DeleteFailure, ProjectService, RecordService, TaskService};
pub use stats::{due_date_label, due_state, is_overdue, DueState, TaskStats};

/// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, Utc};
