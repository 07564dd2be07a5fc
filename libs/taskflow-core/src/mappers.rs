//! Conversions between wire records and domain models
//!
//! Outbound: drafts are filtered and coerced into the writable wire fields.
//! Empty strings are left out, tag lists become comma-separated text and
//! lookup ids become integers. Inbound: wire records are normalized into
//! models with string ids, tag lists and parsed dates.

use crate::error::{Result, TaskflowError};
use crate::models::{Project, ProjectDraft, Task, TaskDraft};
use crate::schema::{ProjectFields, ProjectRecord, TaskFields, TaskRecord};
use crate::tags::{tags_from_wire, tags_to_wire};
use chrono::{DateTime, NaiveDateTime, Utc};
use taskflow_common::parse_date;
use tracing::debug;

/// Parse a string record id into the numeric wire id
///
/// # Errors
/// Returns `TaskflowError::InvalidId` if `id` is not a base-10 integer
pub fn parse_record_id(id: &str) -> Result<i64> {
    id.trim()
        .parse::<i64>()
        .map_err(|_| TaskflowError::InvalidId { id: id.to_string() })
}

/// Coerce a lookup id for a payload, dropping non-numeric input
pub fn lookup_to_wire(field: &str, value: Option<&str>) -> Option<i64> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match value.parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            debug!("Dropping non-numeric {} value: {}", field, value);
            None
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn non_empty_opt(value: Option<&str>) -> Option<String> {
    value.and_then(non_empty)
}

/// Writable task fields for a draft
///
/// `Name` mirrors the title.
pub fn task_fields_from_draft(draft: &TaskDraft) -> TaskFields {
    let title = non_empty(&draft.title);
    TaskFields {
        name: title.clone(),
        tags: tags_to_wire(&draft.tags),
        owner: lookup_to_wire("Owner", draft.owner.as_deref()),
        title,
        description: non_empty(&draft.description),
        priority: draft.priority,
        status: draft.status,
        due_date: draft.due_date,
        project_id: lookup_to_wire("project_id", draft.project_id.as_deref()),
    }
}

/// Writable project fields for a draft
pub fn project_fields_from_draft(draft: &ProjectDraft) -> ProjectFields {
    ProjectFields {
        name: non_empty(&draft.name),
        tags: tags_to_wire(&draft.tags),
        owner: lookup_to_wire("Owner", draft.owner.as_deref()),
        color: non_empty_opt(draft.color.as_deref()),
    }
}

/// Parse a server timestamp
///
/// RFC 3339 is expected; a bare `YYYY-MM-DDTHH:MM:SS` is read as UTC.
pub fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Convert a task record into a [`Task`]
///
/// Unknown priorities read as medium and unknown statuses as todo. A
/// missing title falls back to the record name.
pub fn task_from_record(record: TaskRecord) -> Task {
    let id = record.id.unwrap_or_default();
    if id.is_empty() {
        debug!("Task record without an Id");
    }

    Task {
        id,
        title: record.title.or(record.name).unwrap_or_default(),
        description: record.description.unwrap_or_default(),
        priority: record
            .priority
            .as_deref()
            .and_then(|p| p.parse().ok())
            .unwrap_or_default(),
        status: record
            .status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default(),
        due_date: record
            .due_date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .and_then(|d| parse_date(d).ok()),
        project_id: record.project_id,
        tags: tags_from_wire(record.tags.as_deref()),
        created_at: parse_timestamp(record.created_on.as_deref()),
        updated_at: parse_timestamp(record.modified_on.as_deref()),
    }
}

/// Convert a project record into a [`Project`]
pub fn project_from_record(record: ProjectRecord) -> Project {
    Project {
        id: record.id.unwrap_or_default(),
        name: record.name.unwrap_or_default(),
        color: record.color.filter(|c| !c.is_empty()),
        tags: tags_from_wire(record.tags.as_deref()),
        owner: record.owner,
        created_at: parse_timestamp(record.created_on.as_deref()),
        updated_at: parse_timestamp(record.modified_on.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskPriority, TaskStatus};
    use chrono::{NaiveDate, TimeZone};
    use serde_json::json;

    fn record(value: serde_json::Value) -> TaskRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_record_id() {
        assert_eq!(parse_record_id("42").unwrap(), 42);
        assert_eq!(parse_record_id(" 7 ").unwrap(), 7);
        assert!(matches!(
            parse_record_id("abc"),
            Err(TaskflowError::InvalidId { .. })
        ));
        assert!(parse_record_id("").is_err());
    }

    #[test]
    fn test_lookup_to_wire() {
        assert_eq!(lookup_to_wire("project_id", Some("3")), Some(3));
        assert_eq!(lookup_to_wire("project_id", Some("x3")), None);
        assert_eq!(lookup_to_wire("project_id", Some("")), None);
        assert_eq!(lookup_to_wire("project_id", None), None);
    }

    #[test]
    fn test_task_fields_from_draft() {
        let draft = TaskDraft {
            title: "Write release notes".to_string(),
            description: String::new(),
            priority: Some(TaskPriority::High),
            status: Some(TaskStatus::Todo),
            due_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            project_id: Some("1".to_string()),
            tags: vec!["draft".to_string(), "urgent".to_string()],
            owner: Some("not-a-number".to_string()),
        };

        let fields = task_fields_from_draft(&draft);
        assert_eq!(fields.name.as_deref(), Some("Write release notes"));
        assert_eq!(fields.title.as_deref(), Some("Write release notes"));
        assert!(fields.description.is_none());
        assert_eq!(fields.tags.as_deref(), Some("draft,urgent"));
        assert_eq!(fields.project_id, Some(1));
        assert!(fields.owner.is_none());
    }

    #[test]
    fn test_empty_draft_produces_empty_payload() {
        let fields = task_fields_from_draft(&TaskDraft::default());
        assert_eq!(serde_json::to_value(fields).unwrap(), json!({}));
    }

    #[test]
    fn test_project_fields_from_draft() {
        let fields = project_fields_from_draft(&ProjectDraft {
            name: "Mobile App".to_string(),
            color: Some(String::new()),
            tags: vec![],
            owner: Some("9".to_string()),
        });
        assert_eq!(
            serde_json::to_value(fields).unwrap(),
            json!({"Name": "Mobile App", "Owner": 9})
        );
    }

    #[test]
    fn test_task_from_record() {
        let task = task_from_record(record(json!({
            "Id": 5,
            "title": "X",
            "Tags": "a,b",
            "due_date": "2024-01-01"
        })));

        assert_eq!(task.id, "5");
        assert_eq!(task.title, "X");
        assert_eq!(task.tags, vec!["a", "b"]);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.status, TaskStatus::Todo);
    }

    #[test]
    fn test_task_from_record_normalizes_bad_values() {
        let task = task_from_record(record(json!({
            "Id": "8",
            "Name": "Fallback name",
            "priority": "critical",
            "status": "done",
            "due_date": "someday",
            "CreatedOn": "yesterday"
        })));

        assert_eq!(task.title, "Fallback name");
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(task.due_date.is_none());
        assert!(task.created_at.is_none());
    }

    #[test]
    fn test_task_from_record_dates() {
        let task = task_from_record(record(json!({
            "Id": 1,
            "status": "in-progress",
            "due_date": "2024-03-09T00:00:00",
            "CreatedOn": "2024-03-01T10:00:00Z",
            "ModifiedOn": "2024-03-02T11:30:00"
        })));

        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 3, 9));
        assert_eq!(
            task.created_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(
            task.updated_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 2, 11, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_project_from_record() {
        let record: ProjectRecord = serde_json::from_value(json!({
            "Id": 3,
            "Name": "Marketing Campaign",
            "color": "#f59e0b",
            "Tags": "q3, launch",
            "Owner": {"Id": 11, "Name": "Grace"}
        }))
        .unwrap();

        let project = project_from_record(record);
        assert_eq!(project.id, "3");
        assert_eq!(project.name, "Marketing Campaign");
        assert_eq!(project.color.as_deref(), Some("#f59e0b"));
        assert_eq!(project.tags, vec!["q3", "launch"]);
        assert_eq!(project.owner.as_deref(), Some("11"));
    }
}
