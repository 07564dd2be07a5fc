//! Entity services over the remote record client
//!
//! A [`RecordService`] is a stateless translation layer for one table. It
//! applies default fetch parameters, filters drafts down to writable fields
//! and turns batch responses into a single record, a flag or a
//! [`BulkDeleteResult`].

use crate::client::{
    BatchResponse, FetchOptions, FetchParams, OrderBy, PagingInfo, RecordClient, RecordResult,
    WhereClause,
};
use crate::error::{RecordFailure, Result, TaskflowError};
use crate::mappers::parse_record_id;
use crate::schema::{EntitySchema, ProjectSchema, TaskSchema, UpdateRecord};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use taskflow_common::CREATED_ON_FIELD;
use tracing::{debug, error, info, instrument, warn};

/// Service for the task table
pub type TaskService = RecordService<TaskSchema>;

/// Service for the project table
pub type ProjectService = RecordService<ProjectSchema>;

/// One id a bulk delete could not remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub id: String,
    pub message: String,
}

/// Outcome of a bulk delete, split per id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkDeleteResult {
    pub succeeded: Vec<String>,
    pub failed: Vec<DeleteFailure>,
}

impl BulkDeleteResult {
    /// Number of records actually deleted
    #[must_use]
    pub fn count(&self) -> usize {
        self.succeeded.len()
    }

    /// Whether every requested id was deleted
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Stateless CRUD service for one entity table
pub struct RecordService<E: EntitySchema> {
    client: Arc<dyn RecordClient>,
    page_size: u32,
    _schema: PhantomData<E>,
}

impl<E: EntitySchema> Clone for RecordService<E> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            page_size: self.page_size,
            _schema: PhantomData,
        }
    }
}

impl<E: EntitySchema> fmt::Debug for RecordService<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordService")
            .field("table", &E::TABLE)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl<E: EntitySchema> RecordService<E> {
    /// Create a service using the table's default page size
    #[must_use]
    pub fn new(client: Arc<dyn RecordClient>) -> Self {
        Self {
            client,
            page_size: E::DEFAULT_PAGE_SIZE,
            _schema: PhantomData,
        }
    }

    /// Override the page size used by [`Self::fetch_all`]
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Page size used by [`Self::fetch_all`]
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Default fetch parameters: every projected field, newest first, one page
    #[must_use]
    pub fn default_params(&self) -> FetchParams {
        FetchParams {
            fields: E::FIELDS.iter().map(ToString::to_string).collect(),
            order_by: vec![OrderBy::descending(CREATED_ON_FIELD)],
            where_clauses: Vec::new(),
            paging_info: Some(PagingInfo {
                limit: self.page_size,
                offset: 0,
            }),
        }
    }

    /// Fetch one page of records
    ///
    /// # Errors
    /// Returns an error if the call fails or the service reports failure
    #[instrument(skip(self, options), fields(table = E::TABLE))]
    pub async fn fetch_all(&self, options: FetchOptions) -> Result<Vec<E::Model>> {
        let params = options.merge_into(self.default_params());

        let response = match self.client.fetch_records(E::TABLE, &params).await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to fetch {} records: {}", E::LABEL, e);
                return Err(e);
            }
        };

        if !response.success {
            let message = response
                .message
                .unwrap_or_else(|| format!("fetch {} failed", E::LABEL));
            error!("Failed to fetch {} records: {}", E::LABEL, message);
            return Err(TaskflowError::remote(message));
        }

        let models: Vec<E::Model> = response
            .data
            .unwrap_or_default()
            .into_iter()
            .filter_map(Self::decode)
            .collect();

        debug!("Fetched {} {} records", models.len(), E::LABEL);
        Ok(models)
    }

    /// Fetch one record by id
    ///
    /// Returns `None` when the service reports no data.
    ///
    /// # Errors
    /// Returns `TaskflowError::InvalidId` for a non-numeric id, or the
    /// underlying error if the call fails
    #[instrument(skip(self, options), fields(table = E::TABLE))]
    pub async fn get_by_id(&self, id: &str, options: FetchOptions) -> Result<Option<E::Model>> {
        let record_id = parse_record_id(id)?;
        let params = options.merge_into(FetchParams {
            fields: E::FIELDS.iter().map(ToString::to_string).collect(),
            ..FetchParams::default()
        });

        let response = match self.client.get_record_by_id(E::TABLE, record_id, &params).await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to fetch {} {}: {}", E::LABEL, id, e);
                return Err(e);
            }
        };

        // Refusals and missing records both come back as None
        if !response.success {
            warn!(
                "{} {} not returned: {}",
                E::LABEL,
                id,
                response.message.as_deref().unwrap_or("no message")
            );
            return Ok(None);
        }

        Ok(response.data.and_then(Self::decode))
    }

    /// Fetch one record by id, failing when it does not exist
    ///
    /// # Errors
    /// Returns the entity's not-found error when no record comes back
    pub async fn require(&self, id: &str) -> Result<E::Model> {
        self.get_by_id(id, FetchOptions::default())
            .await?
            .ok_or_else(|| E::not_found(id))
    }

    /// Create a record from a draft
    ///
    /// Returns the created record, or `None` if the service returned no
    /// result for it.
    ///
    /// # Errors
    /// Returns `TaskflowError::BatchFailure` if the service refused the
    /// record, or the underlying error if the call fails
    #[instrument(skip(self, draft), fields(table = E::TABLE))]
    pub async fn create(&self, draft: &E::Draft) -> Result<Option<E::Model>> {
        let operation = format!("create {}", E::LABEL);
        let fields = E::fields_from_draft(draft);
        let payload = vec![serde_json::to_value(&fields)?];

        let response = self
            .send(&operation, self.client.create_records(E::TABLE, payload))
            .await?;
        let results = Self::confirm_all(&operation, response, &[None])?;

        let created = Self::first_record(results);
        if let Some(model) = &created {
            info!("Created {}: {:?}", E::LABEL, model);
        } else {
            warn!("{} returned no record", operation);
        }
        Ok(created)
    }

    /// Update a record from a draft
    ///
    /// # Errors
    /// Returns `TaskflowError::InvalidId` for a non-numeric id,
    /// `TaskflowError::BatchFailure` if the service refused the update, or the
    /// underlying error if the call fails
    pub async fn update(&self, id: &str, draft: &E::Draft) -> Result<Option<E::Model>> {
        self.update_fields(id, E::fields_from_draft(draft)).await
    }

    /// Update selected writable fields of a record
    ///
    /// # Errors
    /// Same as [`Self::update`]
    #[instrument(skip(self, fields), fields(table = E::TABLE))]
    pub async fn update_fields(&self, id: &str, fields: E::Fields) -> Result<Option<E::Model>> {
        let operation = format!("update {}", E::LABEL);
        let record_id = parse_record_id(id)?;
        let payload = vec![serde_json::to_value(UpdateRecord {
            id: record_id,
            fields,
        })?];

        let response = self
            .send(&operation, self.client.update_records(E::TABLE, payload))
            .await?;
        let results = Self::confirm_all(&operation, response, &[Some(record_id)])?;

        let updated = Self::first_record(results);
        if updated.is_some() {
            info!("Updated {} {}", E::LABEL, id);
        } else {
            warn!("{} {} returned no record", operation, id);
        }
        Ok(updated)
    }

    /// Delete one record
    ///
    /// Returns `true` when the service confirmed the deletion.
    ///
    /// # Errors
    /// Returns `TaskflowError::BatchFailure` if the service refused the
    /// deletion, or the underlying error if the call fails
    #[instrument(skip(self), fields(table = E::TABLE))]
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let operation = format!("delete {}", E::LABEL);
        let record_id = parse_record_id(id)?;

        let response = self
            .send(&operation, self.client.delete_records(E::TABLE, &[record_id]))
            .await?;
        let results = Self::confirm_all(&operation, response, &[Some(record_id)])?;

        let deleted = results.iter().any(|r| r.success);
        if deleted {
            info!("Deleted {} {}", E::LABEL, id);
        }
        Ok(deleted)
    }

    /// Delete several records, reporting the outcome per id
    ///
    /// Non-numeric ids are reported as failed without being sent.
    ///
    /// # Errors
    /// Returns an error only if the call as a whole fails
    #[instrument(skip(self, ids), fields(table = E::TABLE, count = ids.len()))]
    pub async fn delete_many(&self, ids: &[String]) -> Result<BulkDeleteResult> {
        let operation = format!("delete {}s", E::LABEL);
        let mut result = BulkDeleteResult::default();

        let mut sent: Vec<(String, i64)> = Vec::with_capacity(ids.len());
        for id in ids {
            match parse_record_id(id) {
                Ok(record_id) => sent.push((id.clone(), record_id)),
                Err(e) => result.failed.push(DeleteFailure {
                    id: id.clone(),
                    message: e.to_string(),
                }),
            }
        }

        if sent.is_empty() {
            return Ok(result);
        }

        let record_ids: Vec<i64> = sent.iter().map(|(_, record_id)| *record_id).collect();
        let response = self
            .send(&operation, self.client.delete_records(E::TABLE, &record_ids))
            .await?;
        let results = Self::check_response(&operation, response)?;

        for (index, (id, _)) in sent.into_iter().enumerate() {
            match results.get(index) {
                Some(item) if item.success => result.succeeded.push(id),
                Some(item) => result.failed.push(DeleteFailure {
                    id,
                    message: item.to_failure(None).summary(),
                }),
                None => result.failed.push(DeleteFailure {
                    id,
                    message: "no result reported".to_string(),
                }),
            }
        }

        if result.is_complete() {
            info!("Deleted {} {} records", result.count(), E::LABEL);
        } else {
            warn!(
                "Failed to delete {} of {} {} records",
                result.failed.len(),
                ids.len(),
                E::LABEL
            );
        }
        Ok(result)
    }

    async fn send<F>(&self, operation: &str, call: F) -> Result<BatchResponse>
    where
        F: std::future::Future<Output = Result<BatchResponse>>,
    {
        call.await.map_err(|e| {
            error!("Error in {}: {}", operation, e);
            e
        })
    }

    /// Results of a batch call the service accepted as a whole
    fn check_response(operation: &str, response: BatchResponse) -> Result<Vec<RecordResult>> {
        if !response.success {
            let message = response
                .message
                .unwrap_or_else(|| format!("{operation} failed"));
            error!("Error in {}: {}", operation, message);
            return Err(TaskflowError::remote(message));
        }
        Ok(response.results.unwrap_or_default())
    }

    /// Results of a batch call where every item must have succeeded
    fn confirm_all(
        operation: &str,
        response: BatchResponse,
        record_ids: &[Option<i64>],
    ) -> Result<Vec<RecordResult>> {
        let results = Self::check_response(operation, response)?;

        let failures: Vec<RecordFailure> = results
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.success)
            .map(|(index, item)| item.to_failure(record_ids.get(index).copied().flatten()))
            .collect();

        if failures.is_empty() {
            return Ok(results);
        }

        warn!("{} failed for {} record(s)", operation, failures.len());
        for failure in &failures {
            if failure.field_errors.is_empty() {
                error!(
                    "Error: {}",
                    failure
                        .message
                        .clone()
                        .unwrap_or_else(|| format!("{operation} failed"))
                );
            }
            for (field, message) in &failure.field_errors {
                error!("Field: {}, Error: {}", field, message);
            }
        }

        Err(TaskflowError::BatchFailure {
            operation: operation.to_string(),
            failures,
        })
    }

    fn first_record(results: Vec<RecordResult>) -> Option<E::Model> {
        results
            .into_iter()
            .filter(|item| item.success)
            .find_map(|item| item.data)
            .and_then(Self::decode)
    }

    fn decode(value: Value) -> Option<E::Model> {
        match serde_json::from_value::<E::Record>(value) {
            Ok(record) => Some(E::model_from_record(record)),
            Err(e) => {
                warn!("Skipping malformed {} record: {}", E::LABEL, e);
                None
            }
        }
    }
}

impl TaskService {
    /// Fetch the tasks of one project
    ///
    /// # Errors
    /// Returns `TaskflowError::Validation` if `project_id` is not numeric; no
    /// request is sent in that case
    #[instrument(skip(self))]
    pub async fn list_by_project(&self, project_id: &str) -> Result<Vec<crate::models::Task>> {
        let numeric = project_id.trim().parse::<i64>().map_err(|_| {
            TaskflowError::validation(format!("Project id must be numeric: {project_id}"))
        })?;

        self.fetch_all(FetchOptions::filtered(WhereClause::exact("project_id", numeric)))
            .await
    }
}
