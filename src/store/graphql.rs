//! GraphQL result store client. Every call is one POST with a static
//! document and JSON variables; GraphQL-level errors surface as
//! [`StoreError::Rejected`].
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use url::Url;

use crate::config::RunnerConfig;
use crate::error::StoreError;
use crate::lifecycle::state::{ExecutionState, InstanceState, InstanceType};
use crate::metrics::types::{AggregateRecord, ErrorEntry};

use super::{
    ExecutionConfiguration, ExecutionUpdate, ExecutionView, InstanceUpdate, InstanceView,
    ProbeSample, ResultStore, StageLogEntry,
};

const GET_EXECUTION: &str = r"
query ($execution_id: uuid) {
    execution(where: {id: {_eq: $execution_id}}) {
        status
        configuration {
            has_load_tests
            has_monitoring
            monitoring_interval
            monitoring_duration
        }
    }
}";

const UPDATE_EXECUTION: &str = r"
mutation ($execution_id: uuid, $data: execution_set_input) {
    update_execution(where: {id: {_eq: $execution_id}}, _set: $data) {
        affected_rows
    }
}";

const INSERT_AGGREGATE: &str = r"
mutation ($object: execution_aggregate_insert_input!) {
    insert_execution_aggregate_one(object: $object) {
        timestamp
    }
}";

const INSERT_ERRORS: &str = r"
mutation ($objects: [execution_errors_insert_input!]!) {
    insert_execution_errors(objects: $objects) {
        affected_rows
    }
}";

const INSERT_PROBE_SAMPLE: &str = r"
mutation ($object: execution_metrics_data_insert_input!) {
    insert_execution_metrics_data_one(object: $object) {
        timestamp
    }
}";

const INSERT_STAGE_LOG: &str = r"
mutation ($object: execution_stage_log_insert_input!) {
    insert_execution_stage_log_one(object: $object) {
        timestamp
    }
}";

const GET_INSTANCE: &str = r"
query ($execution_id: uuid, $instance_type: String) {
    execution_instance(where: {execution_id: {_eq: $execution_id}, instance_type: {_eq: $instance_type}}) {
        status
        instance_type
        created_at
    }
}";

const INSERT_INSTANCE: &str = r"
mutation ($object: execution_instance_insert_input!) {
    insert_execution_instance_one(object: $object) {
        status
        instance_type
        created_at
    }
}";

const UPDATE_INSTANCE: &str = r"
mutation ($execution_id: uuid, $instance_type: String, $data: execution_instance_set_input) {
    update_execution_instance(
        where: {execution_id: {_eq: $execution_id}, instance_type: {_eq: $instance_type}},
        _set: $data
    ) {
        affected_rows
    }
}";

pub struct GraphQlStore {
    http: reqwest::Client,
    endpoint: Url,
    token: Option<String>,
}

impl GraphQlStore {
    #[must_use]
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.store_url.clone(),
            token: config.store_token.clone(),
        }
    }

    async fn post(
        &self,
        context: &'static str,
        query: &'static str,
        variables: Value,
    ) -> Result<Value, StoreError> {
        let mut request = self
            .http
            .post(self.endpoint.clone())
            .json(&json!({ "query": query, "variables": variables }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|source| StoreError::Transport { context, source })?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                context,
                status: status.as_u16(),
            });
        }
        let body: Value = response
            .json()
            .await
            .map_err(|source| StoreError::Transport { context, source })?;
        if let Some(message) = first_error_message(&body) {
            return Err(StoreError::Rejected { context, message });
        }
        body.get("data")
            .cloned()
            .ok_or(StoreError::MissingData { context })
    }
}

fn first_error_message(body: &Value) -> Option<String> {
    body.get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
        .map(|error| {
            error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unspecified error")
                .to_owned()
        })
}

fn first_row<'a>(
    data: &'a Value,
    root: &str,
    context: &'static str,
) -> Result<&'a Value, StoreError> {
    data.get(root)
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
        .ok_or(StoreError::MissingData { context })
}

fn parse_instance(row: &Value, context: &'static str) -> Result<InstanceView, StoreError> {
    let status: InstanceState = serde_json::from_value(
        row.get("status").cloned().unwrap_or(Value::Null),
    )
    .map_err(|source| StoreError::Decode { context, source })?;
    let instance_type: InstanceType = serde_json::from_value(
        row.get("instance_type").cloned().unwrap_or(Value::Null),
    )
    .map_err(|source| StoreError::Decode { context, source })?;
    let created_at = row
        .get("created_at")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
        .ok_or(StoreError::MissingData { context })?;
    Ok(InstanceView {
        status,
        instance_type,
        created_at,
    })
}

#[async_trait]
impl ResultStore for GraphQlStore {
    async fn insert_aggregate(&self, record: &AggregateRecord) -> Result<(), StoreError> {
        let context = "insert_aggregate";
        let timestamp = DateTime::<Utc>::from_timestamp(record.timestamp, 0)
            .map_or_else(|| Utc::now().to_rfc3339(), |parsed| parsed.to_rfc3339());
        let object = json!({
            "execution_id": record.execution_id,
            "timestamp": timestamp,
            "number_of_successes": record.successes,
            "number_of_fails": record.fails,
            "number_of_errors": record.distinct_errors,
            "number_of_users": record.users,
            "average_response_time": record.avg_response_time,
            "average_response_size": record.avg_response_size,
        });
        self.post(context, INSERT_AGGREGATE, json!({ "object": object }))
            .await?;
        Ok(())
    }

    async fn insert_errors(&self, entries: &[ErrorEntry]) -> Result<(), StoreError> {
        let context = "insert_errors";
        let objects: Vec<Value> = entries
            .iter()
            .map(|entry| {
                json!({
                    "execution_id": entry.execution_id,
                    "name": entry.name,
                    "error_type": entry.method,
                    "exception_data": entry.exception,
                    "number_of_occurrences": entry.occurrences,
                })
            })
            .collect();
        self.post(context, INSERT_ERRORS, json!({ "objects": objects }))
            .await?;
        Ok(())
    }

    async fn insert_probe_sample(
        &self,
        execution_id: &str,
        sample: &ProbeSample,
    ) -> Result<(), StoreError> {
        let context = "insert_probe_sample";
        let object = json!({
            "execution_id": execution_id,
            "timestamp": sample.timestamp,
            "data": sample.data.to_string(),
        });
        self.post(context, INSERT_PROBE_SAMPLE, json!({ "object": object }))
            .await?;
        Ok(())
    }

    async fn insert_stage_log(
        &self,
        execution_id: &str,
        entry: &StageLogEntry,
    ) -> Result<(), StoreError> {
        let context = "insert_stage_log";
        let object = json!({
            "execution_id": execution_id,
            "timestamp": entry.timestamp,
            "stage": entry.stage,
            "msg": entry.msg,
        });
        self.post(context, INSERT_STAGE_LOG, json!({ "object": object }))
            .await?;
        Ok(())
    }

    async fn get_execution(&self, execution_id: &str) -> Result<ExecutionView, StoreError> {
        let context = "get_execution";
        let data = self
            .post(context, GET_EXECUTION, json!({ "execution_id": execution_id }))
            .await?;
        let row = first_row(&data, "execution", context)?;
        let status: ExecutionState = serde_json::from_value(
            row.get("status").cloned().unwrap_or(Value::Null),
        )
        .map_err(|source| StoreError::Decode { context, source })?;
        let configuration: Option<ExecutionConfiguration> = serde_json::from_value(
            row.get("configuration").cloned().unwrap_or(Value::Null),
        )
        .map_err(|source| StoreError::Decode { context, source })?;
        Ok(ExecutionView {
            status,
            configuration,
        })
    }

    async fn update_execution(
        &self,
        execution_id: &str,
        update: &ExecutionUpdate,
    ) -> Result<(), StoreError> {
        let context = "update_execution";
        let data =
            serde_json::to_value(update).map_err(|source| StoreError::Decode { context, source })?;
        self.post(
            context,
            UPDATE_EXECUTION,
            json!({ "execution_id": execution_id, "data": data }),
        )
        .await?;
        Ok(())
    }

    async fn get_instance(
        &self,
        execution_id: &str,
        instance_type: InstanceType,
    ) -> Result<Option<InstanceView>, StoreError> {
        let context = "get_instance";
        let data = self
            .post(
                context,
                GET_INSTANCE,
                json!({
                    "execution_id": execution_id,
                    "instance_type": instance_type.to_string(),
                }),
            )
            .await?;
        let rows = data
            .get("execution_instance")
            .and_then(Value::as_array)
            .ok_or(StoreError::MissingData { context })?;
        match rows.first() {
            Some(row) => Ok(Some(parse_instance(row, context)?)),
            None => Ok(None),
        }
    }

    async fn insert_instance(
        &self,
        execution_id: &str,
        instance_type: InstanceType,
        update: &InstanceUpdate,
    ) -> Result<InstanceView, StoreError> {
        let context = "insert_instance";
        let object = json!({
            "execution_id": execution_id,
            "instance_type": instance_type.to_string(),
            "status": update.status,
        });
        let data = self
            .post(context, INSERT_INSTANCE, json!({ "object": object }))
            .await?;
        let row = data
            .get("insert_execution_instance_one")
            .filter(|row| !row.is_null())
            .ok_or(StoreError::MissingData { context })?;
        parse_instance(row, context)
    }

    async fn update_instance(
        &self,
        execution_id: &str,
        instance_type: InstanceType,
        update: &InstanceUpdate,
    ) -> Result<(), StoreError> {
        let context = "update_instance";
        let data =
            serde_json::to_value(update).map_err(|source| StoreError::Decode { context, source })?;
        self.post(
            context,
            UPDATE_INSTANCE,
            json!({
                "execution_id": execution_id,
                "instance_type": instance_type.to_string(),
                "data": data,
            }),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult};

    #[test]
    fn surfaces_the_first_graphql_error() -> AppResult<()> {
        let body = json!({
            "errors": [
                { "message": "field 'executions' not found" },
                { "message": "second" }
            ]
        });
        match first_error_message(&body) {
            Some(message) if message == "field 'executions' not found" => Ok(()),
            Some(message) => Err(AppError::store(message)),
            None => Err(AppError::store("Expected an error message")),
        }
    }

    #[test]
    fn missing_rows_are_missing_data() -> AppResult<()> {
        let data = json!({ "execution": [] });
        match first_row(&data, "execution", "get_execution") {
            Err(StoreError::MissingData { .. }) => Ok(()),
            Ok(_) | Err(_) => Err(AppError::store("Expected MissingData")),
        }
    }

    #[test]
    fn parses_instance_rows() -> AppResult<()> {
        let row = json!({
            "status": "READY",
            "instance_type": "load_tests",
            "created_at": "2026-08-23T10:00:00+00:00"
        });
        let instance = parse_instance(&row, "get_instance").map_err(AppError::from)?;
        if instance.status != InstanceState::Ready {
            return Err(AppError::store("Expected READY"));
        }
        if instance.instance_type != InstanceType::LoadTests {
            return Err(AppError::store("Expected load_tests"));
        }
        if instance.created_at.timestamp() != 1_787_479_200 {
            return Err(AppError::store(instance.created_at.timestamp().to_string()));
        }
        Ok(())
    }

    #[test]
    fn execution_update_skips_unset_fields() -> AppResult<()> {
        let update = ExecutionUpdate::status(ExecutionState::Running)
            .with_started_at("2026-08-23T10:00:00+00:00".to_owned());
        let encoded = serde_json::to_value(&update)?;
        if encoded.get("finished_at").is_some() {
            return Err(AppError::store("finished_at should be omitted"));
        }
        if encoded.get("status").and_then(Value::as_str) != Some("RUNNING") {
            return Err(AppError::store(encoded.to_string()));
        }
        Ok(())
    }
}
