//! TaskFlow Common - Shared constants and utilities
//!
//! # Examples
//!
//! ```
//! use taskflow_common::{TASK_TABLE, format_date, truncate_string};
//! use chrono::NaiveDate;
//!
//! assert_eq!(TASK_TABLE, "task");
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
//! assert_eq!(format_date(&date), "2024-03-09");
//!
//! assert_eq!(truncate_string("hello world", 5), "he...");
//! ```

pub mod constants;
pub mod utils;

pub use constants::*;
pub use utils::*;
