//! Wire schema for the remote record tables
//!
//! Each table has a write struct holding only the fields a client may set
//! and a read struct covering everything the service returns. Audit fields
//! (`CreatedOn`, `CreatedBy`, `ModifiedOn`, `ModifiedBy`) only exist on the
//! read side, so they can never be sent.

use crate::error::TaskflowError;
use crate::mappers;
use crate::models::{Project, ProjectDraft, Task, TaskDraft, TaskPriority, TaskStatus};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use taskflow_common::{DEFAULT_PROJECT_PAGE_SIZE, DEFAULT_TASK_PAGE_SIZE, PROJECT_TABLE, TASK_TABLE};

/// Static description of one remote table and its conversions
pub trait EntitySchema: Send + Sync + 'static {
    /// Remote table name
    const TABLE: &'static str;
    /// Name used in logs and operation labels
    const LABEL: &'static str;
    /// Fields projected on reads
    const FIELDS: &'static [&'static str];
    /// Page size used when no configuration overrides it
    const DEFAULT_PAGE_SIZE: u32;

    /// Domain model handed to callers
    type Model: Clone + Debug + Send + Sync;
    /// UI-shaped input for create/update
    type Draft: Debug + Send + Sync;
    /// Writable wire fields
    type Fields: Serialize + Clone + Debug + Default + Send + Sync;
    /// Readable wire record
    type Record: DeserializeOwned + Debug;

    /// Filter and coerce a draft into writable wire fields
    fn fields_from_draft(draft: &Self::Draft) -> Self::Fields;

    /// Convert a wire record into the domain model
    fn model_from_record(record: Self::Record) -> Self::Model;

    /// Not-found error for this entity
    fn not_found(id: &str) -> TaskflowError;
}

/// Task table marker
#[derive(Debug, Clone, Copy)]
pub struct TaskSchema;

/// Project table marker
#[derive(Debug, Clone, Copy)]
pub struct ProjectSchema;

const TASK_FIELDS: &[&str] = &[
    "Name",
    "Tags",
    "Owner",
    "CreatedOn",
    "CreatedBy",
    "ModifiedOn",
    "ModifiedBy",
    "title",
    "description",
    "priority",
    "status",
    "due_date",
    "project_id",
];

const PROJECT_FIELDS: &[&str] = &[
    "Name",
    "Tags",
    "Owner",
    "CreatedOn",
    "CreatedBy",
    "ModifiedOn",
    "ModifiedBy",
    "color",
];

impl EntitySchema for TaskSchema {
    const TABLE: &'static str = TASK_TABLE;
    const LABEL: &'static str = "task";
    const FIELDS: &'static [&'static str] = TASK_FIELDS;
    const DEFAULT_PAGE_SIZE: u32 = DEFAULT_TASK_PAGE_SIZE;

    type Model = Task;
    type Draft = TaskDraft;
    type Fields = TaskFields;
    type Record = TaskRecord;

    fn fields_from_draft(draft: &TaskDraft) -> TaskFields {
        mappers::task_fields_from_draft(draft)
    }

    fn model_from_record(record: TaskRecord) -> Task {
        mappers::task_from_record(record)
    }

    fn not_found(id: &str) -> TaskflowError {
        TaskflowError::TaskNotFound { id: id.to_string() }
    }
}

impl EntitySchema for ProjectSchema {
    const TABLE: &'static str = PROJECT_TABLE;
    const LABEL: &'static str = "project";
    const FIELDS: &'static [&'static str] = PROJECT_FIELDS;
    const DEFAULT_PAGE_SIZE: u32 = DEFAULT_PROJECT_PAGE_SIZE;

    type Model = Project;
    type Draft = ProjectDraft;
    type Fields = ProjectFields;
    type Record = ProjectRecord;

    fn fields_from_draft(draft: &ProjectDraft) -> ProjectFields {
        mappers::project_fields_from_draft(draft)
    }

    fn model_from_record(record: ProjectRecord) -> Project {
        mappers::project_from_record(record)
    }

    fn not_found(id: &str) -> TaskflowError {
        TaskflowError::ProjectNotFound { id: id.to_string() }
    }
}

/// Writable task fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskFields {
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Comma-separated tags
    #[serde(rename = "Tags", skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(rename = "Owner", skip_serializing_if = "Option::is_none")]
    pub owner: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// Serialized as `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
}

impl TaskFields {
    /// Fields carrying only a status change
    #[must_use]
    pub fn status_only(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Writable project fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectFields {
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Tags", skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(rename = "Owner", skip_serializing_if = "Option::is_none")]
    pub owner: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Update payload: the numeric record id plus the fields to change
#[derive(Debug, Clone, Serialize)]
pub struct UpdateRecord<F> {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(flatten)]
    pub fields: F,
}

/// Task as returned by the service
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TaskRecord {
    #[serde(rename = "Id", deserialize_with = "lookup_id")]
    pub id: Option<String>,
    #[serde(rename = "Name", deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(rename = "Tags", deserialize_with = "tag_text")]
    pub tags: Option<String>,
    #[serde(rename = "Owner", deserialize_with = "lookup_id")]
    pub owner: Option<String>,
    #[serde(rename = "CreatedOn", deserialize_with = "lenient_string")]
    pub created_on: Option<String>,
    #[serde(rename = "CreatedBy", deserialize_with = "lookup_id")]
    pub created_by: Option<String>,
    #[serde(rename = "ModifiedOn", deserialize_with = "lenient_string")]
    pub modified_on: Option<String>,
    #[serde(rename = "ModifiedBy", deserialize_with = "lookup_id")]
    pub modified_by: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub priority: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub due_date: Option<String>,
    #[serde(deserialize_with = "lookup_id")]
    pub project_id: Option<String>,
}

/// Project as returned by the service
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectRecord {
    #[serde(rename = "Id", deserialize_with = "lookup_id")]
    pub id: Option<String>,
    #[serde(rename = "Name", deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(rename = "Tags", deserialize_with = "tag_text")]
    pub tags: Option<String>,
    #[serde(rename = "Owner", deserialize_with = "lookup_id")]
    pub owner: Option<String>,
    #[serde(rename = "CreatedOn", deserialize_with = "lenient_string")]
    pub created_on: Option<String>,
    #[serde(rename = "CreatedBy", deserialize_with = "lookup_id")]
    pub created_by: Option<String>,
    #[serde(rename = "ModifiedOn", deserialize_with = "lenient_string")]
    pub modified_on: Option<String>,
    #[serde(rename = "ModifiedBy", deserialize_with = "lookup_id")]
    pub modified_by: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub color: Option<String>,
}

/// Lookup value as a string id
///
/// Accepts a number, a string, or an `{Id, Name}` object.
fn lookup_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(lookup_value_id(&value))
}

fn lookup_value_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Object(map) => map.get("Id").and_then(lookup_value_id),
        _ => None,
    }
}

/// Scalar rendered as a string; null and nested values become `None`
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Tags as comma-separated text; an array of strings is joined
fn tag_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(","),
        ),
        _ => None,
    })
}
