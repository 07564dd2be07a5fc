//! Remote record service seam
//!
//! The record service is a generic per-table CRUD API. Reads accept field
//! projection, ordering, equality filters and paging. Writes are always
//! batches and report success per item.

#[cfg(feature = "http-client")]
mod http;

#[cfg(feature = "http-client")]
pub use http::HttpRecordClient;

use crate::error::{RecordFailure, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sort direction for an ordering clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortType {
    Asc,
    Desc,
}

/// Ordering clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    #[serde(rename = "SortType")]
    pub sort_type: SortType,
}

impl OrderBy {
    #[must_use]
    pub fn descending(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            sort_type: SortType::Desc,
        }
    }
}

/// Filter operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    ExactMatch,
}

/// Equality filter clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    pub operator: FilterOperator,
    pub values: Vec<Value>,
}

impl WhereClause {
    /// `field_name` equals `value`
    #[must_use]
    pub fn exact(field_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field_name: field_name.into(),
            operator: FilterOperator::ExactMatch,
            values: vec![value.into()],
        }
    }
}

/// Page window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingInfo {
    pub limit: u32,
    pub offset: u32,
}

/// Parameters of a fetch or get call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchParams {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(rename = "orderBy", default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(rename = "where", default, skip_serializing_if = "Vec::is_empty")]
    pub where_clauses: Vec<WhereClause>,
    #[serde(rename = "pagingInfo", default, skip_serializing_if = "Option::is_none")]
    pub paging_info: Option<PagingInfo>,
}

/// Caller overrides merged over a service's default fetch parameters
///
/// Each populated piece replaces the matching default wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOptions {
    pub fields: Option<Vec<String>>,
    pub order_by: Option<Vec<OrderBy>>,
    pub where_clauses: Option<Vec<WhereClause>>,
    pub paging_info: Option<PagingInfo>,
}

impl FetchOptions {
    /// Options filtering on a single field
    #[must_use]
    pub fn filtered(clause: WhereClause) -> Self {
        Self {
            where_clauses: Some(vec![clause]),
            ..Self::default()
        }
    }

    /// Apply these overrides on top of `defaults`
    #[must_use]
    pub fn merge_into(self, mut defaults: FetchParams) -> FetchParams {
        if let Some(fields) = self.fields {
            defaults.fields = fields;
        }
        if let Some(order_by) = self.order_by {
            defaults.order_by = order_by;
        }
        if let Some(where_clauses) = self.where_clauses {
            defaults.where_clauses = where_clauses;
        }
        if let Some(paging_info) = self.paging_info {
            defaults.paging_info = Some(paging_info);
        }
        defaults
    }
}

/// Response to a fetch call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<Value>>,
}

/// Response to a get-by-id call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Field-level error attached to a failed batch item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(rename = "fieldLabel")]
    pub field_label: String,
    pub message: String,
}

/// Outcome of one item of a batch call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<FieldError>>,
}

impl RecordResult {
    /// Convert a failed item into a [`RecordFailure`]
    #[must_use]
    pub fn to_failure(&self, record_id: Option<i64>) -> RecordFailure {
        RecordFailure {
            record_id,
            message: self.message.clone(),
            field_errors: self
                .errors
                .iter()
                .flatten()
                .map(|e| (e.field_label.clone(), e.message.clone()))
                .collect(),
        }
    }
}

/// Response to a batch create/update/delete call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<RecordResult>>,
}

fn default_true() -> bool {
    true
}

/// Generic remote CRUD API keyed by table name
#[async_trait]
pub trait RecordClient: Send + Sync {
    /// Fetch a page of records
    async fn fetch_records(&self, table: &str, params: &FetchParams) -> Result<FetchResponse>;

    /// Fetch a single record by id
    async fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        params: &FetchParams,
    ) -> Result<RecordResponse>;

    /// Create a batch of records
    async fn create_records(&self, table: &str, records: Vec<Value>) -> Result<BatchResponse>;

    /// Update a batch of records; each record carries its `Id`
    async fn update_records(&self, table: &str, records: Vec<Value>) -> Result<BatchResponse>;

    /// Delete a batch of records by id
    async fn delete_records(&self, table: &str, ids: &[i64]) -> Result<BatchResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fetch_params_wire_shape() {
        let params = FetchParams {
            fields: vec!["title".to_string()],
            order_by: vec![OrderBy::descending("CreatedOn")],
            where_clauses: vec![WhereClause::exact("project_id", 3)],
            paging_info: Some(PagingInfo {
                limit: 100,
                offset: 0,
            }),
        };

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(
            value,
            json!({
                "fields": ["title"],
                "orderBy": [{"fieldName": "CreatedOn", "SortType": "DESC"}],
                "where": [{"fieldName": "project_id", "operator": "ExactMatch", "values": [3]}],
                "pagingInfo": {"limit": 100, "offset": 0}
            })
        );
    }

    #[test]
    fn test_empty_fetch_params_serialize_to_empty_object() {
        let value = serde_json::to_value(FetchParams::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_fetch_options_merge_replaces_pieces() {
        let defaults = FetchParams {
            fields: vec!["a".to_string(), "b".to_string()],
            order_by: vec![OrderBy::descending("CreatedOn")],
            where_clauses: vec![],
            paging_info: Some(PagingInfo {
                limit: 100,
                offset: 0,
            }),
        };

        let merged = FetchOptions {
            paging_info: Some(PagingInfo {
                limit: 10,
                offset: 20,
            }),
            ..FetchOptions::filtered(WhereClause::exact("status", "todo"))
        }
        .merge_into(defaults.clone());

        assert_eq!(merged.fields, defaults.fields);
        assert_eq!(merged.order_by, defaults.order_by);
        assert_eq!(merged.where_clauses.len(), 1);
        assert_eq!(merged.paging_info.unwrap().offset, 20);
    }

    #[test]
    fn test_empty_options_keep_defaults() {
        let defaults = FetchParams {
            fields: vec!["a".to_string()],
            ..FetchParams::default()
        };
        assert_eq!(FetchOptions::default().merge_into(defaults.clone()), defaults);
    }

    #[test]
    fn test_batch_response_parsing() {
        let response: BatchResponse = serde_json::from_value(json!({
            "success": true,
            "results": [
                {"success": true, "data": {"Id": 1}},
                {"success": false, "errors": [{"fieldLabel": "title", "message": "required"}]}
            ]
        }))
        .unwrap();

        let results = response.results.unwrap();
        assert!(results[0].success);
        let failure = results[1].to_failure(None);
        assert_eq!(
            failure.field_errors,
            vec![("title".to_string(), "required".to_string())]
        );
    }

    #[test]
    fn test_fetch_response_defaults_to_success() {
        let response: FetchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.success);
        assert!(response.data.is_none());
    }
}
