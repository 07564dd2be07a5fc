//! View state controller for the task board
//!
//! [`TaskBoard`] owns the in-memory task and project collections, the task
//! form and the notification queue. Local state only changes after the
//! remote service confirms a mutation. Edits and status toggles carry a
//! generation token for the part of the task they write (its content or its
//! status); a response is only applied to the parts no newer request has
//! claimed since.

use crate::client::FetchOptions;
use crate::error::TaskflowError;
use crate::models::{
    Project, ProjectDraft, ProjectFilter, ProjectSummary, Task, TaskForm, TaskStatus,
};
use crate::schema::TaskFields;
use crate::service::{ProjectService, TaskService};
use crate::stats::TaskStats;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, error, info, instrument, warn};

/// Source of the current time
pub type Clock = fn() -> DateTime<Utc>;

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// User-facing message produced by an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// What the open form will do on submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    /// Edit the task with this id
    Edit(String),
}

/// Task form lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Idle,
    Open { mode: FormMode, form: TaskForm },
    Submitting { mode: FormMode, form: TaskForm },
}

impl FormState {
    /// Form contents, if a form is open or submitting
    #[must_use]
    pub fn form(&self) -> Option<&TaskForm> {
        match self {
            Self::Idle => None,
            Self::Open { form, .. } | Self::Submitting { form, .. } => Some(form),
        }
    }
}

/// Result of a controller action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The change was confirmed and applied locally
    Applied,
    /// Refused locally; nothing was sent
    Rejected,
    /// The remote call failed; local collections are unchanged
    Failed,
    /// The response was superseded by a newer request and dropped
    Discarded,
    /// Nothing to do (unknown id, wrong form state)
    Ignored,
}

/// Part of a task a request writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Scope {
    /// Everything but the status (edit form)
    Content,
    Status,
}

#[derive(Debug, Default)]
struct BoardState {
    tasks: Vec<Task>,
    projects: Vec<Project>,
    stats: TaskStats,
    filter: ProjectFilter,
    form: FormState,
    notifications: Vec<Notification>,
    generations: HashMap<(String, Scope), u64>,
}

impl BoardState {
    fn refresh_stats(&mut self, clock: Clock) {
        self.stats = TaskStats::compute(&self.tasks, clock().date_naive());
    }

    fn next_generation(&mut self, id: &str, scope: Scope) -> u64 {
        let generation = self
            .generations
            .entry((id.to_string(), scope))
            .or_insert(0);
        *generation += 1;
        *generation
    }

    fn is_current(&self, id: &str, scope: Scope, generation: u64) -> bool {
        self.generations.get(&(id.to_string(), scope)).copied() == Some(generation)
    }

    fn forget(&mut self, id: &str) {
        self.generations.retain(|(key, _), _| key != id);
    }

    fn has_task(&self, id: &str) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    /// Put a submitting form back into the open state
    fn reopen_form(&mut self) {
        if let FormState::Submitting { mode, form } = std::mem::take(&mut self.form) {
            self.form = FormState::Open { mode, form };
        }
    }

    fn close_form(&mut self) {
        if matches!(self.form, FormState::Submitting { .. }) {
            self.form = FormState::Idle;
        }
    }
}

/// Marks a request in flight for as long as it lives
struct BusyGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> BusyGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

fn failure_message(action: &str, error: &TaskflowError) -> String {
    match error {
        TaskflowError::BatchFailure { failures, .. } if !failures.is_empty() => {
            let detail: Vec<String> = failures.iter().map(|f| f.summary()).collect();
            format!("Failed to {action}: {}", detail.join("; "))
        }
        _ => format!("Failed to {action}"),
    }
}

/// Task board view state controller
pub struct TaskBoard {
    tasks: TaskService,
    projects: ProjectService,
    state: Mutex<BoardState>,
    in_flight: AtomicUsize,
    clock: Clock,
}

impl std::fmt::Debug for TaskBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskBoard")
            .field("tasks", &self.tasks)
            .field("projects", &self.projects)
            .field("in_flight", &self.in_flight.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl TaskBoard {
    /// Create an empty board over the given services
    #[must_use]
    pub fn new(tasks: TaskService, projects: ProjectService) -> Self {
        Self {
            tasks,
            projects,
            state: Mutex::new(BoardState::default()),
            in_flight: AtomicUsize::new(0),
            clock: Utc::now,
        }
    }

    /// Use `clock` for due-date checks and local timestamps
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Seed the collections without contacting the service
    #[must_use]
    pub fn with_data(self, tasks: Vec<Task>, projects: Vec<Project>) -> Self {
        {
            let mut state = self.state.lock();
            state.tasks = tasks;
            state.projects = projects;
            state.refresh_stats(self.clock);
        }
        self
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Fetch tasks and projects concurrently and replace the collections
    ///
    /// A collection whose fetch fails is left as it was.
    #[instrument(skip(self))]
    pub async fn load(&self) -> ActionOutcome {
        let _busy = BusyGuard::new(&self.in_flight);
        let (tasks, projects) = tokio::join!(
            self.tasks.fetch_all(FetchOptions::default()),
            self.projects.fetch_all(FetchOptions::default())
        );

        let mut state = self.state.lock();
        let mut outcome = ActionOutcome::Applied;

        match tasks {
            Ok(tasks) => {
                info!("Loaded {} tasks", tasks.len());
                state.tasks = tasks;
                state.refresh_stats(self.clock);
            }
            Err(e) => {
                error!("Failed to load tasks: {}", e);
                state.notify(Notification::error("Failed to load tasks"));
                outcome = ActionOutcome::Failed;
            }
        }

        match projects {
            Ok(projects) => {
                info!("Loaded {} projects", projects.len());
                state.projects = projects;
            }
            Err(e) => {
                error!("Failed to load projects: {}", e);
                state.notify(Notification::error("Failed to load projects"));
                outcome = ActionOutcome::Failed;
            }
        }

        outcome
    }

    // ========================================================================
    // Form
    // ========================================================================

    /// Open an empty create form
    ///
    /// The project is pre-filled with the active project, else the first
    /// loaded project.
    pub fn open_create_form(&self) -> ActionOutcome {
        let mut state = self.state.lock();
        if matches!(state.form, FormState::Submitting { .. }) {
            return ActionOutcome::Ignored;
        }

        let project_id = match &state.filter {
            ProjectFilter::Project(id) => id.clone(),
            ProjectFilter::All => state
                .projects
                .first()
                .map(|p| p.id.clone())
                .unwrap_or_default(),
        };

        state.form = FormState::Open {
            mode: FormMode::Create,
            form: TaskForm::for_project(project_id),
        };
        ActionOutcome::Applied
    }

    /// Open the edit form for task `id`, pre-filled from the task
    pub fn open_edit_form(&self, id: &str) -> ActionOutcome {
        let mut state = self.state.lock();
        if matches!(state.form, FormState::Submitting { .. }) {
            return ActionOutcome::Ignored;
        }

        let Some(task) = state.tasks.iter().find(|t| t.id == id) else {
            debug!("Edit requested for unknown task {}", id);
            return ActionOutcome::Ignored;
        };

        let form = TaskForm::from_task(task);
        state.form = FormState::Open {
            mode: FormMode::Edit(id.to_string()),
            form,
        };
        ActionOutcome::Applied
    }

    /// Replace the contents of the open form
    pub fn set_form(&self, form: TaskForm) -> ActionOutcome {
        self.update_form(|current| *current = form)
    }

    /// Edit the open form in place
    pub fn update_form<F: FnOnce(&mut TaskForm)>(&self, edit: F) -> ActionOutcome {
        let mut state = self.state.lock();
        match &mut state.form {
            FormState::Open { form, .. } => {
                edit(form);
                ActionOutcome::Applied
            }
            _ => ActionOutcome::Ignored,
        }
    }

    /// Close the open form without saving
    pub fn cancel_form(&self) -> ActionOutcome {
        let mut state = self.state.lock();
        match state.form {
            FormState::Open { .. } => {
                state.form = FormState::Idle;
                ActionOutcome::Applied
            }
            _ => ActionOutcome::Ignored,
        }
    }

    /// Submit the open form, creating or updating a task
    #[instrument(skip(self))]
    pub async fn submit_form(&self) -> ActionOutcome {
        let (mode, form, generation) = {
            let mut state = self.state.lock();
            let (mode, form) = match &state.form {
                FormState::Open { mode, form } => (mode.clone(), form.clone()),
                _ => return ActionOutcome::Ignored,
            };

            if !form.has_title() {
                state.notify(Notification::error("Task title is required"));
                return ActionOutcome::Rejected;
            }

            let generation = match &mode {
                FormMode::Edit(id) => Some(state.next_generation(id, Scope::Content)),
                FormMode::Create => None,
            };
            state.form = FormState::Submitting {
                mode: mode.clone(),
                form: form.clone(),
            };
            (mode, form, generation)
        };

        let _busy = BusyGuard::new(&self.in_flight);
        match mode {
            FormMode::Create => self.submit_create(&form).await,
            FormMode::Edit(id) => {
                self.submit_edit(&id, &form, generation.unwrap_or_default())
                    .await
            }
        }
    }

    async fn submit_create(&self, form: &TaskForm) -> ActionOutcome {
        let result = self
            .tasks
            .create(&form.to_draft(Some(TaskStatus::Todo)))
            .await;

        let mut state = self.state.lock();
        match result {
            Ok(Some(task)) => {
                info!("Task {} created", task.id);
                state.tasks.insert(0, task);
                state.refresh_stats(self.clock);
                state.close_form();
                state.notify(Notification::success("Task created successfully!"));
                ActionOutcome::Applied
            }
            Ok(None) => {
                warn!("Task creation returned no record");
                state.reopen_form();
                state.notify(Notification::error("Failed to create task"));
                ActionOutcome::Failed
            }
            Err(e) => {
                error!("Failed to create task: {}", e);
                state.reopen_form();
                state.notify(Notification::error(failure_message("create task", &e)));
                ActionOutcome::Failed
            }
        }
    }

    async fn submit_edit(&self, id: &str, form: &TaskForm, generation: u64) -> ActionOutcome {
        let result = self.tasks.update(id, &form.to_draft(None)).await;

        let mut state = self.state.lock();
        if !state.is_current(id, Scope::Content, generation) {
            debug!("Discarding stale update response for task {}", id);
            state.close_form();
            return ActionOutcome::Discarded;
        }

        match result {
            Ok(Some(task)) => {
                info!("Task {} updated", id);
                // Edits never send a status; toggles own it locally
                if let Some(existing) = state.task_mut(id) {
                    let status = existing.status;
                    *existing = Task { status, ..task };
                }
                state.refresh_stats(self.clock);
                state.close_form();
                state.notify(Notification::success("Task updated successfully!"));
                ActionOutcome::Applied
            }
            Ok(None) => {
                warn!("Update of task {} returned no record", id);
                state.reopen_form();
                state.notify(Notification::error("Failed to update task"));
                ActionOutcome::Failed
            }
            Err(e) => {
                error!("Failed to update task {}: {}", id, e);
                state.reopen_form();
                state.notify(Notification::error(failure_message("update task", &e)));
                ActionOutcome::Failed
            }
        }
    }

    // ========================================================================
    // Task actions
    // ========================================================================

    /// Flip a task between completed and not completed
    ///
    /// Only the status is sent. Completed tasks go back to todo; any other
    /// status becomes completed.
    #[instrument(skip(self))]
    pub async fn toggle_status(&self, id: &str) -> ActionOutcome {
        let (new_status, generation) = {
            let mut state = self.state.lock();
            let Some(task) = state.tasks.iter().find(|t| t.id == id) else {
                debug!("Toggle requested for unknown task {}", id);
                return ActionOutcome::Ignored;
            };
            let new_status = task.status.toggled();
            (new_status, state.next_generation(id, Scope::Status))
        };

        let _busy = BusyGuard::new(&self.in_flight);
        let result = self
            .tasks
            .update_fields(id, TaskFields::status_only(new_status))
            .await;

        let mut state = self.state.lock();
        if !state.is_current(id, Scope::Status, generation) {
            debug!("Discarding stale status response for task {}", id);
            return ActionOutcome::Discarded;
        }

        match result {
            Ok(Some(record)) => {
                let now = (self.clock)();
                let Some(task) = state.task_mut(id) else {
                    return ActionOutcome::Ignored;
                };
                task.status = new_status;
                task.updated_at = record.updated_at.or(Some(now));
                state.refresh_stats(self.clock);
                info!("Task {} is now {}", id, new_status);
                ActionOutcome::Applied
            }
            Ok(None) => {
                warn!("Status update of task {} returned no record", id);
                state.notify(Notification::error("Failed to update task"));
                ActionOutcome::Failed
            }
            Err(e) => {
                error!("Failed to update status of task {}: {}", id, e);
                state.notify(Notification::error(failure_message("update task", &e)));
                ActionOutcome::Failed
            }
        }
    }

    /// Delete one task
    #[instrument(skip(self))]
    pub async fn delete_task(&self, id: &str) -> ActionOutcome {
        let known = self.state.lock().has_task(id);
        if !known {
            debug!("Delete requested for unknown task {}", id);
            return ActionOutcome::Ignored;
        }

        let _busy = BusyGuard::new(&self.in_flight);
        let result = self.tasks.delete(id).await;

        let mut state = self.state.lock();
        match result {
            Ok(true) => {
                state.tasks.retain(|t| t.id != id);
                state.forget(id);
                state.refresh_stats(self.clock);
                state.notify(Notification::success("Task deleted successfully!"));
                ActionOutcome::Applied
            }
            Ok(false) => {
                warn!("Deletion of task {} was not confirmed", id);
                state.notify(Notification::error("Failed to delete task"));
                ActionOutcome::Failed
            }
            Err(e) => {
                error!("Failed to delete task {}: {}", id, e);
                state.notify(Notification::error(failure_message("delete task", &e)));
                ActionOutcome::Failed
            }
        }
    }

    /// Delete several tasks, removing each confirmed deletion locally
    ///
    /// Ids missing from the local collection are skipped without a request.
    /// `Applied` when at least one task was deleted.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_tasks(&self, ids: &[String]) -> ActionOutcome {
        let ids: Vec<String> = {
            let state = self.state.lock();
            ids.iter().filter(|id| state.has_task(id)).cloned().collect()
        };
        if ids.is_empty() {
            debug!("Bulk delete requested for no known tasks");
            return ActionOutcome::Ignored;
        }

        let _busy = BusyGuard::new(&self.in_flight);
        let result = self.tasks.delete_many(&ids).await;

        let mut state = self.state.lock();
        match result {
            Ok(result) => {
                for id in &result.succeeded {
                    state.tasks.retain(|t| &t.id != id);
                    state.forget(id);
                }
                state.refresh_stats(self.clock);

                if result.is_complete() {
                    state.notify(Notification::success(format!(
                        "Deleted {} task(s)",
                        result.count()
                    )));
                } else {
                    for failure in &result.failed {
                        warn!("Task {} not deleted: {}", failure.id, failure.message);
                    }
                    state.notify(Notification::error(format!(
                        "Deleted {} of {} task(s)",
                        result.count(),
                        ids.len()
                    )));
                }

                if result.count() > 0 {
                    ActionOutcome::Applied
                } else {
                    ActionOutcome::Failed
                }
            }
            Err(e) => {
                error!("Failed to delete tasks: {}", e);
                state.notify(Notification::error("Failed to delete tasks"));
                ActionOutcome::Failed
            }
        }
    }

    // ========================================================================
    // Project actions
    // ========================================================================

    /// Create a project
    #[instrument(skip(self, draft))]
    pub async fn create_project(&self, draft: ProjectDraft) -> ActionOutcome {
        if draft.name.trim().is_empty() {
            self.state
                .lock()
                .notify(Notification::error("Project name is required"));
            return ActionOutcome::Rejected;
        }

        let _busy = BusyGuard::new(&self.in_flight);
        let result = self.projects.create(&draft).await;

        let mut state = self.state.lock();
        match result {
            Ok(Some(project)) => {
                info!("Project {} created", project.id);
                state.projects.insert(0, project);
                state.notify(Notification::success("Project created successfully!"));
                ActionOutcome::Applied
            }
            Ok(None) => {
                state.notify(Notification::error("Failed to create project"));
                ActionOutcome::Failed
            }
            Err(e) => {
                error!("Failed to create project: {}", e);
                state.notify(Notification::error(failure_message("create project", &e)));
                ActionOutcome::Failed
            }
        }
    }

    /// Update a project
    #[instrument(skip(self, draft))]
    pub async fn update_project(&self, id: &str, draft: ProjectDraft) -> ActionOutcome {
        let known = self.state.lock().projects.iter().any(|p| p.id == id);
        if !known {
            return ActionOutcome::Ignored;
        }

        let _busy = BusyGuard::new(&self.in_flight);
        let result = self.projects.update(id, &draft).await;

        let mut state = self.state.lock();
        match result {
            Ok(Some(project)) => {
                if let Some(existing) = state.projects.iter_mut().find(|p| p.id == id) {
                    *existing = project;
                }
                state.notify(Notification::success("Project updated successfully!"));
                ActionOutcome::Applied
            }
            Ok(None) => {
                state.notify(Notification::error("Failed to update project"));
                ActionOutcome::Failed
            }
            Err(e) => {
                error!("Failed to update project {}: {}", id, e);
                state.notify(Notification::error(failure_message("update project", &e)));
                ActionOutcome::Failed
            }
        }
    }

    /// Delete a project
    ///
    /// If the project was the active filter the filter falls back to all.
    #[instrument(skip(self))]
    pub async fn delete_project(&self, id: &str) -> ActionOutcome {
        let known = self.state.lock().projects.iter().any(|p| p.id == id);
        if !known {
            return ActionOutcome::Ignored;
        }

        let _busy = BusyGuard::new(&self.in_flight);
        let result = self.projects.delete(id).await;

        let mut state = self.state.lock();
        match result {
            Ok(true) => {
                state.projects.retain(|p| p.id != id);
                if state.filter == ProjectFilter::Project(id.to_string()) {
                    state.filter = ProjectFilter::All;
                }
                state.notify(Notification::success("Project deleted successfully!"));
                ActionOutcome::Applied
            }
            Ok(false) => {
                state.notify(Notification::error("Failed to delete project"));
                ActionOutcome::Failed
            }
            Err(e) => {
                error!("Failed to delete project {}: {}", id, e);
                state.notify(Notification::error(failure_message("delete project", &e)));
                ActionOutcome::Failed
            }
        }
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Set the active project filter
    pub fn select_project(&self, filter: ProjectFilter) {
        self.state.lock().filter = filter;
    }

    /// Active project filter
    #[must_use]
    pub fn active_filter(&self) -> ProjectFilter {
        self.state.lock().filter.clone()
    }

    /// Tasks passing the active filter, in collection order
    #[must_use]
    pub fn visible_tasks(&self) -> Vec<Task> {
        let state = self.state.lock();
        state
            .tasks
            .iter()
            .filter(|t| state.filter.matches(t))
            .cloned()
            .collect()
    }

    /// Every project with task counts derived from the current tasks
    #[must_use]
    pub fn project_summaries(&self) -> Vec<ProjectSummary> {
        let state = self.state.lock();
        state
            .projects
            .iter()
            .map(|project| {
                let owned = state
                    .tasks
                    .iter()
                    .filter(|t| t.project_id.as_deref() == Some(project.id.as_str()));
                let (task_count, completed_count) =
                    owned.fold((0, 0), |(total, done), task| {
                        let done = done + usize::from(task.status == TaskStatus::Completed);
                        (total + 1, done)
                    });
                ProjectSummary {
                    project: project.clone(),
                    task_count,
                    completed_count,
                }
            })
            .collect()
    }

    /// Current statistics
    #[must_use]
    pub fn stats(&self) -> TaskStats {
        self.state.lock().stats
    }

    /// Calendar date used for due-date checks
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        (self.clock)().date_naive()
    }

    /// Every task
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.clone()
    }

    /// Task with the given id
    #[must_use]
    pub fn task(&self, id: &str) -> Option<Task> {
        self.state.lock().tasks.iter().find(|t| t.id == id).cloned()
    }

    /// Every project
    #[must_use]
    pub fn projects(&self) -> Vec<Project> {
        self.state.lock().projects.clone()
    }

    /// Current form state
    #[must_use]
    pub fn form_state(&self) -> FormState {
        self.state.lock().form.clone()
    }

    /// Whether any request is in flight
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Drain pending notifications
    pub fn take_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut self.state.lock().notifications)
    }
}
