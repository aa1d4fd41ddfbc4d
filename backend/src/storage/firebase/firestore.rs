use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use super::codec::{decode_document, encode_fields, encode_value};
use crate::config::FirebaseConfig;
use crate::storage::document::{Document, EqualityFilter, FieldWrite, FieldWrites, Fields};
use crate::storage::traits::{DocumentStore, TokenSource};

/// Cloud Firestore over its REST API
///
/// Writes go through `documents:commit` so server timestamps can be set with
/// `REQUEST_TIME` transforms in the same write; reads use
/// `documents:runQuery` with a single equality filter.
pub struct FirestoreStore {
    http: Client,
    config: FirebaseConfig,
    tokens: Arc<dyn TokenSource>,
}

/// Plain values and server-timestamp field paths of one write
fn split_writes(writes: FieldWrites) -> (Fields, Vec<String>) {
    let mut values = Fields::new();
    let mut server_timestamps = Vec::new();
    for (name, write) in writes {
        match write {
            FieldWrite::Value(value) => {
                values.insert(name, value);
            }
            FieldWrite::ServerTimestamp => server_timestamps.push(name),
        }
    }
    (values, server_timestamps)
}

fn timestamp_transforms(paths: &[String]) -> Value {
    Value::Array(
        paths
            .iter()
            .map(|path| json!({ "fieldPath": path, "setToServerValue": "REQUEST_TIME" }))
            .collect(),
    )
}

impl FirestoreStore {
    pub fn new(config: FirebaseConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client for Firestore")?;
        Ok(Self { http, config, tokens })
    }

    fn database_path(&self) -> String {
        format!(
            "projects/{}/databases/{}",
            self.config.project_id, self.config.database
        )
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{}/{}", self.database_path(), collection, id)
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/v1/{}/documents:{}",
            self.config.firestore_base_url.trim_end_matches('/'),
            self.database_path(),
            method
        )
    }

    async fn post(&self, method: &str, body: &Value) -> Result<Value> {
        let token = self
            .tokens
            .id_token()
            .await
            .map_err(|e| anyhow!("Cannot authorize Firestore request: {}", e))?;

        let mut request = self.http.post(self.endpoint(method)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Firestore {} request failed", method))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(text);
            error!("Firestore {} failed ({}): {}", method, status, message);
            bail!("Firestore {} failed ({}): {}", method, status, message);
        }

        response
            .json::<Value>()
            .await
            .with_context(|| format!("Failed to parse Firestore {} response", method))
    }

    async fn commit(&self, write: Value) -> Result<()> {
        self.post("commit", &json!({ "writes": [write] })).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn query(&self, collection: &str, filter: &EqualityFilter) -> Result<Vec<Document>> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": filter.field },
                        "op": "EQUAL",
                        "value": encode_value(&filter.value),
                    }
                }
            }
        });

        let response = self.post("runQuery", &body).await?;
        let results = response
            .as_array()
            .ok_or_else(|| anyhow!("Firestore runQuery returned a non-array response"))?;

        // Entries without a document only carry read metadata
        let documents: Vec<Document> = results
            .iter()
            .filter_map(|entry| entry.get("document"))
            .filter_map(|resource| match decode_document(resource) {
                Ok(document) => Some(document),
                Err(e) => {
                    warn!("Skipping unreadable {} document: {:#}", collection, e);
                    None
                }
            })
            .collect();

        debug!(
            "runQuery {} where {} == {:?}: {} documents",
            collection,
            filter.field,
            filter.value,
            documents.len()
        );
        Ok(documents)
    }

    async fn insert(&self, collection: &str, fields: FieldWrites) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();
        let (values, server_timestamps) = split_writes(fields);

        let write = json!({
            "update": {
                "name": self.document_name(collection, &id),
                "fields": encode_fields(&values),
            },
            "updateTransforms": timestamp_transforms(&server_timestamps),
            "currentDocument": { "exists": false },
        });
        self.commit(write).await?;

        debug!("Inserted {}/{}", collection, id);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: FieldWrites) -> Result<()> {
        let (values, server_timestamps) = split_writes(fields);
        let mask: Vec<&String> = values.keys().collect();

        let write = json!({
            "update": {
                "name": self.document_name(collection, id),
                "fields": encode_fields(&values),
            },
            "updateMask": { "fieldPaths": mask },
            "updateTransforms": timestamp_transforms(&server_timestamps),
            "currentDocument": { "exists": true },
        });
        self.commit(write).await?;

        debug!("Updated {}/{}", collection, id);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.commit(json!({ "delete": self.document_name(collection, id) }))
            .await?;
        debug!("Deleted {}/{}", collection, id);
        Ok(())
    }
}
