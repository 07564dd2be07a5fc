//! Data models for TaskFlow entities

use crate::tags::parse_tag_text;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task status enumeration
///
/// `InProgress` is tracked for statistics only; any status may follow any
/// other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "todo")]
    Todo,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

impl TaskStatus {
    /// Wire representation
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    /// Status after a completion toggle: completed tasks reopen, everything
    /// else completes
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Completed => Self::Todo,
            Self::Todo | Self::InProgress => Self::Completed,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = crate::TaskflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "todo" => Ok(Self::Todo),
            "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(crate::TaskflowError::validation(format!(
                "Unknown task status: {other}"
            ))),
        }
    }
}

/// Task priority enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskPriority {
    #[serde(rename = "low")]
    Low,
    #[default]
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "high")]
    High,
    #[serde(rename = "urgent")]
    Urgent,
}

impl TaskPriority {
    /// Wire representation
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = crate::TaskflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(crate::TaskflowError::validation(format!(
                "Unknown task priority: {other}"
            ))),
        }
    }
}

/// Main task entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned identifier, rendered as a string
    pub id: String,
    /// Task title
    pub title: String,
    /// Free-form description
    pub description: String,
    /// Task priority
    pub priority: TaskPriority,
    /// Task status
    pub status: TaskStatus,
    /// Due date
    pub due_date: Option<NaiveDate>,
    /// Owning project identifier
    pub project_id: Option<String>,
    /// Ordered tags, duplicates allowed
    pub tags: Vec<String>,
    /// Creation timestamp
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

/// Project entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Server-assigned identifier, rendered as a string
    pub id: String,
    /// Project name
    pub name: String,
    /// Display color hint (e.g. `#6366f1`)
    pub color: Option<String>,
    /// Associated tags
    pub tags: Vec<String>,
    /// Owner identifier
    pub owner: Option<String>,
    /// Creation timestamp
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

/// Project with task counts derived from the live task collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub project: Project,
    pub task_count: usize,
    pub completed_count: usize,
}

/// UI-shaped task data handed to the task service on create/update
///
/// Identifiers are strings here; they are coerced to numeric wire ids on the
/// way out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<NaiveDate>,
    pub project_id: Option<String>,
    pub tags: Vec<String>,
    pub owner: Option<String>,
}

/// UI-shaped project data handed to the project service on create/update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub name: String,
    pub color: Option<String>,
    pub tags: Vec<String>,
    pub owner: Option<String>,
}

/// Contents of the task form
///
/// Tags are kept as the comma-separated text the user typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub project_id: String,
    pub tags: String,
}

impl TaskForm {
    /// Empty form pointing at `project_id`
    #[must_use]
    pub fn for_project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            ..Self::default()
        }
    }

    /// Form pre-filled from an existing task
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            due_date: task.due_date,
            project_id: task.project_id.clone().unwrap_or_default(),
            tags: task.tags.join(", "),
        }
    }

    /// Whether the title is present once surrounding whitespace is removed
    #[must_use]
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Convert to a service draft, optionally forcing a status
    #[must_use]
    pub fn to_draft(&self, status: Option<TaskStatus>) -> TaskDraft {
        let project_id = self.project_id.trim();
        TaskDraft {
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            priority: Some(self.priority),
            status,
            due_date: self.due_date,
            project_id: (!project_id.is_empty()).then(|| project_id.to_string()),
            tags: parse_tag_text(&self.tags),
            owner: None,
        }
    }
}

/// Active project selector for the task list
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectFilter {
    /// Every task, regardless of project
    #[default]
    All,
    /// Tasks belonging to one project
    Project(String),
}

impl ProjectFilter {
    /// Whether `task` passes the filter
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Project(id) => task.project_id.as_deref() == Some(id.as_str()),
        }
    }
}

impl FromStr for ProjectFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Project(trimmed.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task {
            id: "1".to_string(),
            title: "Design new landing page".to_string(),
            description: "Modern and responsive".to_string(),
            priority: TaskPriority::High,
            status: TaskStatus::InProgress,
            due_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            project_id: Some("1".to_string()),
            tags: vec!["design".to_string(), "ui/ux".to_string()],
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_task_status_serialization() {
        assert_eq!(serde_json::to_string(&TaskStatus::Todo).unwrap(), "\"todo\"");
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!(
            serde_json::to_string(&TaskStatus::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn test_task_status_deserialization() {
        let status: TaskStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(status, TaskStatus::InProgress);
        assert!(serde_json::from_str::<TaskStatus>("\"done\"").is_err());
    }

    #[test]
    fn test_task_status_from_str() {
        assert_eq!("todo".parse::<TaskStatus>().unwrap(), TaskStatus::Todo);
        assert_eq!(
            " Completed ".parse::<TaskStatus>().unwrap(),
            TaskStatus::Completed
        );
        assert!("blocked".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_task_status_toggle() {
        assert_eq!(TaskStatus::Todo.toggled(), TaskStatus::Completed);
        assert_eq!(TaskStatus::InProgress.toggled(), TaskStatus::Completed);
        assert_eq!(TaskStatus::Completed.toggled(), TaskStatus::Todo);
    }

    #[test]
    fn test_task_status_toggle_twice() {
        for status in [TaskStatus::Todo, TaskStatus::Completed] {
            assert_eq!(status.toggled().toggled(), status);
        }
    }

    #[test]
    fn test_task_priority_round_trip_names() {
        for priority in [
            TaskPriority::Low,
            TaskPriority::Medium,
            TaskPriority::High,
            TaskPriority::Urgent,
        ] {
            assert_eq!(priority.as_str().parse::<TaskPriority>().unwrap(), priority);
            assert_eq!(
                serde_json::to_string(&priority).unwrap(),
                format!("\"{priority}\"")
            );
        }
        assert!("critical".parse::<TaskPriority>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
        assert_eq!(ProjectFilter::default(), ProjectFilter::All);

        let form = TaskForm::default();
        assert_eq!(form.priority, TaskPriority::Medium);
        assert!(form.title.is_empty());
        assert!(form.due_date.is_none());
    }

    #[test]
    fn test_form_from_task_joins_tags() {
        let form = TaskForm::from_task(&sample_task());
        assert_eq!(form.title, "Design new landing page");
        assert_eq!(form.tags, "design, ui/ux");
        assert_eq!(form.project_id, "1");
        assert_eq!(form.priority, TaskPriority::High);
    }

    #[test]
    fn test_form_has_title() {
        let mut form = TaskForm::for_project("1");
        assert!(!form.has_title());
        form.title = "   \t".to_string();
        assert!(!form.has_title());
        form.title = " Ship it ".to_string();
        assert!(form.has_title());
    }

    #[test]
    fn test_form_to_draft() {
        let form = TaskForm {
            title: "  Write release notes ".to_string(),
            description: String::new(),
            priority: TaskPriority::High,
            due_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            project_id: "1".to_string(),
            tags: "draft, urgent".to_string(),
        };

        let draft = form.to_draft(Some(TaskStatus::Todo));
        assert_eq!(draft.title, "Write release notes");
        assert_eq!(draft.status, Some(TaskStatus::Todo));
        assert_eq!(draft.priority, Some(TaskPriority::High));
        assert_eq!(draft.project_id.as_deref(), Some("1"));
        assert_eq!(draft.tags, vec!["draft", "urgent"]);
    }

    #[test]
    fn test_form_to_draft_without_project() {
        let draft = TaskForm::default().to_draft(None);
        assert!(draft.project_id.is_none());
        assert!(draft.status.is_none());
        assert!(draft.tags.is_empty());
    }

    #[test]
    fn test_project_filter_matches() {
        let task = sample_task();
        assert!(ProjectFilter::All.matches(&task));
        assert!(ProjectFilter::Project("1".to_string()).matches(&task));
        assert!(!ProjectFilter::Project("2".to_string()).matches(&task));

        let unassigned = Task {
            project_id: None,
            ..task
        };
        assert!(ProjectFilter::All.matches(&unassigned));
        assert!(!ProjectFilter::Project("1".to_string()).matches(&unassigned));
    }

    #[test]
    fn test_project_filter_from_str() {
        assert_eq!("all".parse::<ProjectFilter>().unwrap(), ProjectFilter::All);
        assert_eq!("ALL".parse::<ProjectFilter>().unwrap(), ProjectFilter::All);
        assert_eq!("".parse::<ProjectFilter>().unwrap(), ProjectFilter::All);
        assert_eq!(
            "3".parse::<ProjectFilter>().unwrap(),
            ProjectFilter::Project("3".to_string())
        );
    }

    #[test]
    fn test_task_serialization() {
        let task = sample_task();
        let serialized = serde_json::to_string(&task).unwrap();
        let deserialized: Task = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, task);
    }
}
