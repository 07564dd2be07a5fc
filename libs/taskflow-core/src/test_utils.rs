//! Test utilities: an in-process record service and mock data

use crate::client::{
    BatchResponse, FetchParams, FetchResponse, FieldError, RecordClient, RecordResponse,
    RecordResult, SortType,
};
use crate::error::{Result, TaskflowError};
use crate::models::{Project, Task, TaskPriority, TaskStatus};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use taskflow_common::{CREATED_ON_FIELD, PROJECT_TABLE, TASK_TABLE};
use tokio::sync::Notify;

/// Kind of call made against the record client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Fetch,
    Get,
    Create,
    Update,
    Delete,
}

/// A call received by [`InMemoryRecordClient`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub table: String,
    /// Fetch parameters, record payloads or record ids, as JSON
    pub payload: Value,
}

/// Failure to inject into the next call
#[derive(Debug, Clone)]
pub enum InjectedFailure {
    /// The call errors before reaching the store
    Transport(String),
    /// The service answers with `success: false`
    Unsuccessful(String),
    /// Every item of the batch fails with these field errors
    RecordErrors(Vec<(String, String)>),
}

/// Handle on a gated call
///
/// The gated call blocks after being recorded until [`CallGate::release`]
/// is called.
#[derive(Debug, Clone)]
pub struct CallGate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl CallGate {
    /// Wait until the gated call has reached the gate
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the gated call proceed
    pub fn release(&self) {
        self.release.notify_one();
    }
}

type Table = BTreeMap<i64, Map<String, Value>>;

#[derive(Default)]
struct Store {
    tables: HashMap<String, Table>,
    next_id: i64,
    clock: i64,
}

impl Store {
    fn tick(&mut self) -> String {
        self.clock += 1;
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single();
        base.map(|b| (b + Duration::seconds(self.clock)).to_rfc3339())
            .unwrap_or_default()
    }

    fn insert(&mut self, table: &str, fields: &Map<String, Value>) -> Map<String, Value> {
        self.next_id += 1;
        let id = self.next_id;
        let now = self.tick();

        let mut record = fields.clone();
        record.insert("Id".to_string(), json!(id));
        record.insert(CREATED_ON_FIELD.to_string(), json!(now));
        record.insert("ModifiedOn".to_string(), json!(now));

        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(id, record.clone());
        record
    }
}

/// In-process record service with call recording, failure injection and
/// call gating
#[derive(Default)]
pub struct InMemoryRecordClient {
    store: Mutex<Store>,
    calls: Mutex<Vec<RecordedCall>>,
    failures: Mutex<VecDeque<InjectedFailure>>,
    gates: Mutex<VecDeque<CallGate>>,
}

impl InMemoryRecordClient {
    /// Create an empty client
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client seeded with [`sample_project_records`] and
    /// [`sample_task_records`]
    #[must_use]
    pub fn with_sample_data() -> Self {
        let client = Self::new();
        for project in sample_project_records() {
            client.insert(PROJECT_TABLE, project);
        }
        for task in sample_task_records() {
            client.insert(TASK_TABLE, task);
        }
        client
    }

    /// Store a record directly, without recording a call; returns its id
    pub fn insert(&self, table: &str, fields: Value) -> i64 {
        let fields = fields.as_object().cloned().unwrap_or_default();
        let record = self.store.lock().insert(table, &fields);
        record.get("Id").and_then(Value::as_i64).unwrap_or_default()
    }

    /// Stored record, if present
    #[must_use]
    pub fn record(&self, table: &str, id: i64) -> Option<Value> {
        self.store
            .lock()
            .tables
            .get(table)
            .and_then(|t| t.get(&id))
            .map(|r| Value::Object(r.clone()))
    }

    /// Number of stored records in `table`
    #[must_use]
    pub fn record_count(&self, table: &str) -> usize {
        self.store.lock().tables.get(table).map_or(0, BTreeMap::len)
    }

    /// Every call received so far
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Calls of one kind
    #[must_use]
    pub fn calls_of(&self, kind: CallKind) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.kind == kind)
            .cloned()
            .collect()
    }

    /// Number of calls received so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Make the next call fail
    pub fn fail_next(&self, failure: InjectedFailure) {
        self.failures.lock().push_back(failure);
    }

    /// Hold the next call until the returned gate is released
    #[must_use]
    pub fn gate_next_call(&self) -> CallGate {
        let gate = CallGate {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        };
        self.gates.lock().push_back(gate.clone());
        gate
    }

    /// Record a call and apply any pending gate; returns an injected failure
    async fn begin(&self, kind: CallKind, table: &str, payload: Value) -> Option<InjectedFailure> {
        self.calls.lock().push(RecordedCall {
            kind,
            table: table.to_string(),
            payload,
        });
        let failure = self.failures.lock().pop_front();
        let gate = self.gates.lock().pop_front();

        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        failure
    }

    fn batch_failure(failure: InjectedFailure, items: usize) -> Result<BatchResponse> {
        match failure {
            InjectedFailure::Transport(message) => Err(TaskflowError::transport(message)),
            InjectedFailure::Unsuccessful(message) => Ok(BatchResponse {
                success: false,
                message: Some(message),
                results: None,
            }),
            InjectedFailure::RecordErrors(errors) => {
                let item = RecordResult {
                    success: false,
                    data: None,
                    message: Some("Validation failed".to_string()),
                    errors: Some(
                        errors
                            .into_iter()
                            .map(|(field_label, message)| FieldError {
                                field_label,
                                message,
                            })
                            .collect(),
                    ),
                };
                Ok(BatchResponse {
                    success: true,
                    message: None,
                    results: Some(vec![item; items.max(1)]),
                })
            }
        }
    }

    fn project(record: &Map<String, Value>, fields: &[String]) -> Value {
        if fields.is_empty() {
            return Value::Object(record.clone());
        }
        let mut projected = Map::new();
        if let Some(id) = record.get("Id") {
            projected.insert("Id".to_string(), id.clone());
        }
        for field in fields {
            if let Some(value) = record.get(field) {
                projected.insert(field.clone(), value.clone());
            }
        }
        Value::Object(projected)
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

fn not_found_item() -> RecordResult {
    RecordResult {
        success: false,
        message: Some("Record does not exist".to_string()),
        ..RecordResult::default()
    }
}

#[async_trait]
impl RecordClient for InMemoryRecordClient {
    async fn fetch_records(&self, table: &str, params: &FetchParams) -> Result<FetchResponse> {
        let payload = serde_json::to_value(params)?;
        match self.begin(CallKind::Fetch, table, payload).await {
            Some(InjectedFailure::Transport(message)) => {
                return Err(TaskflowError::transport(message))
            }
            Some(InjectedFailure::Unsuccessful(message)) => {
                return Ok(FetchResponse {
                    success: false,
                    message: Some(message),
                    data: None,
                })
            }
            Some(InjectedFailure::RecordErrors(_)) => {
                return Ok(FetchResponse {
                    success: false,
                    message: Some("Injected failure".to_string()),
                    data: None,
                })
            }
            None => {}
        }

        let store = self.store.lock();
        let mut rows: Vec<&Map<String, Value>> = store
            .tables
            .get(table)
            .map(|t| t.values().collect())
            .unwrap_or_default();

        rows.retain(|row| {
            params.where_clauses.iter().all(|clause| {
                row.get(&clause.field_name)
                    .is_some_and(|value| clause.values.contains(value))
            })
        });

        if let Some(order) = params.order_by.first() {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(&order.field_name), b.get(&order.field_name))
                    .then_with(|| compare_values(a.get("Id"), b.get("Id")));
                match order.sort_type {
                    SortType::Asc => ordering,
                    SortType::Desc => ordering.reverse(),
                }
            });
        }

        let (offset, limit) = params
            .paging_info
            .map_or((0, usize::MAX), |p| (p.offset as usize, p.limit as usize));

        let data = rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| Self::project(row, &params.fields))
            .collect();

        Ok(FetchResponse {
            success: true,
            message: None,
            data: Some(data),
        })
    }

    async fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        params: &FetchParams,
    ) -> Result<RecordResponse> {
        let mut payload = serde_json::to_value(params)?;
        payload["id"] = json!(id);
        match self.begin(CallKind::Get, table, payload).await {
            Some(InjectedFailure::Transport(message)) => {
                return Err(TaskflowError::transport(message))
            }
            Some(InjectedFailure::Unsuccessful(message)) => {
                return Ok(RecordResponse {
                    success: false,
                    message: Some(message),
                    data: None,
                })
            }
            Some(InjectedFailure::RecordErrors(_)) => return Ok(RecordResponse::default()),
            None => {}
        }

        let store = self.store.lock();
        let data = store
            .tables
            .get(table)
            .and_then(|t| t.get(&id))
            .map(|row| Self::project(row, &params.fields));

        Ok(RecordResponse {
            success: true,
            message: None,
            data,
        })
    }

    async fn create_records(&self, table: &str, records: Vec<Value>) -> Result<BatchResponse> {
        let count = records.len();
        if let Some(failure) = self
            .begin(CallKind::Create, table, Value::Array(records.clone()))
            .await
        {
            return Self::batch_failure(failure, count);
        }

        let mut store = self.store.lock();
        let results = records
            .iter()
            .map(|record| {
                let fields = record.as_object().cloned().unwrap_or_default();
                RecordResult {
                    success: true,
                    data: Some(Value::Object(store.insert(table, &fields))),
                    ..RecordResult::default()
                }
            })
            .collect();

        Ok(BatchResponse {
            success: true,
            message: None,
            results: Some(results),
        })
    }

    async fn update_records(&self, table: &str, records: Vec<Value>) -> Result<BatchResponse> {
        let count = records.len();
        if let Some(failure) = self
            .begin(CallKind::Update, table, Value::Array(records.clone()))
            .await
        {
            return Self::batch_failure(failure, count);
        }

        let mut store = self.store.lock();
        let mut results = Vec::with_capacity(count);
        for record in &records {
            let Some(id) = record.get("Id").and_then(Value::as_i64) else {
                results.push(not_found_item());
                continue;
            };
            if !store.tables.get(table).is_some_and(|t| t.contains_key(&id)) {
                results.push(not_found_item());
                continue;
            }

            let now = store.tick();
            let Some(row) = store.tables.get_mut(table).and_then(|t| t.get_mut(&id)) else {
                results.push(not_found_item());
                continue;
            };
            if let Some(fields) = record.as_object() {
                for (key, value) in fields {
                    row.insert(key.clone(), value.clone());
                }
            }
            row.insert("ModifiedOn".to_string(), json!(now));
            results.push(RecordResult {
                success: true,
                data: Some(Value::Object(row.clone())),
                ..RecordResult::default()
            });
        }

        Ok(BatchResponse {
            success: true,
            message: None,
            results: Some(results),
        })
    }

    async fn delete_records(&self, table: &str, ids: &[i64]) -> Result<BatchResponse> {
        if let Some(failure) = self.begin(CallKind::Delete, table, json!(ids)).await {
            return Self::batch_failure(failure, ids.len());
        }

        let mut store = self.store.lock();
        let results = ids
            .iter()
            .map(|id| {
                let removed = store
                    .tables
                    .get_mut(table)
                    .and_then(|t| t.remove(id))
                    .is_some();
                if removed {
                    RecordResult {
                        success: true,
                        ..RecordResult::default()
                    }
                } else {
                    not_found_item()
                }
            })
            .collect();

        Ok(BatchResponse {
            success: true,
            message: None,
            results: Some(results),
        })
    }
}

/// Wire records for the three sample projects
#[must_use]
pub fn sample_project_records() -> Vec<Value> {
    vec![
        json!({"Name": "Website Redesign", "color": "#6366f1"}),
        json!({"Name": "Mobile App", "color": "#10b981"}),
        json!({"Name": "Marketing Campaign", "color": "#f59e0b", "Tags": "q3,launch"}),
    ]
}

/// Wire records for sample tasks spread over the sample projects
#[must_use]
pub fn sample_task_records() -> Vec<Value> {
    vec![
        json!({
            "Name": "Design new landing page",
            "title": "Design new landing page",
            "description": "Create a modern, responsive landing page",
            "priority": "high",
            "status": "in-progress",
            "due_date": "2024-01-20",
            "project_id": 1,
            "Tags": "design,ui/ux"
        }),
        json!({
            "Name": "Set up analytics",
            "title": "Set up analytics",
            "priority": "medium",
            "status": "completed",
            "due_date": "2024-01-10",
            "project_id": 1
        }),
        json!({
            "Name": "Implement push notifications",
            "title": "Implement push notifications",
            "priority": "urgent",
            "status": "todo",
            "project_id": 2,
            "Tags": "mobile"
        }),
        json!({
            "Name": "Plan launch posts",
            "title": "Plan launch posts",
            "priority": "low",
            "status": "todo",
            "due_date": "2099-12-31",
            "project_id": 3
        }),
    ]
}

/// A task model for tests
#[must_use]
pub fn mock_task(id: &str, title: &str, status: TaskStatus, project_id: Option<&str>) -> Task {
    Task {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        priority: TaskPriority::Medium,
        status,
        due_date: None,
        project_id: project_id.map(ToString::to_string),
        tags: Vec::new(),
        created_at: None,
        updated_at: None,
    }
}

/// A project model for tests
#[must_use]
pub fn mock_project(id: &str, name: &str) -> Project {
    Project {
        id: id.to_string(),
        name: name.to_string(),
        color: None,
        tags: Vec::new(),
        owner: None,
        created_at: None,
        updated_at: None,
    }
}

/// Mock tasks covering every status, with due dates relative to `today`
#[must_use]
pub fn create_mock_tasks(today: NaiveDate) -> Vec<Task> {
    vec![
        Task {
            due_date: today.pred_opt(),
            ..mock_task("1", "Overdue work", TaskStatus::Todo, Some("1"))
        },
        Task {
            due_date: Some(today),
            ..mock_task("2", "Due today", TaskStatus::InProgress, Some("1"))
        },
        Task {
            due_date: today.pred_opt(),
            ..mock_task("3", "Finished late", TaskStatus::Completed, Some("2"))
        },
        mock_task("4", "Someday", TaskStatus::Todo, None),
    ]
}

/// Fixed timestamp used for deterministic tests
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}
