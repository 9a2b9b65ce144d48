//! REST backend for a hosted document service speaking the Appwrite v1 wire
//! protocol. Collection-level reads and writes only; realtime needs a
//! websocket session and is not part of this backend.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::DocumentStore;
use crate::document::{Document, Permission};
use crate::error::StoreError;
use crate::query::Query;

#[derive(Debug, Clone)]
pub struct RestConfig {
    pub endpoint: String,
    pub project_id: String,
    pub api_key: String,
}

pub struct RestStore {
    config: RestConfig,
    database_id: String,
    client: Client,
}

#[derive(Deserialize)]
struct DocumentList {
    #[expect(unused)]
    total: u64,
    documents: Vec<Document>,
}

impl RestStore {
    pub fn new(config: RestConfig, database_id: impl Into<String>) -> Self {
        RestStore {
            config,
            database_id: database_id.into(),
            client: Client::new(),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{collection}/documents",
            self.config.endpoint.trim_end_matches('/'),
            self.database_id
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("X-Appwrite-Project", &self.config.project_id)
            .header("X-Appwrite-Key", &self.config.api_key)
    }

    async fn failure(&self, collection: &str, id: Option<&str>, response: Response) -> StoreError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        match status {
            StatusCode::NOT_FOUND => StoreError::NotFound {
                collection: collection.to_string(),
                id: id.unwrap_or("-").to_string(),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                StoreError::Permission(format!("{status}: {body}"))
            }
            _ => StoreError::Io(format!("{status}: {body}")),
        }
    }
}

impl DocumentStore for RestStore {
    async fn list(&self, collection: &str, queries: &[Query]) -> Result<Vec<Document>, StoreError> {
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|query| ("queries[]", query.to_wire().to_string()))
            .collect();
        let response = self
            .request(Method::GET, &self.collection_url(collection))
            .query(&params)
            .send()
            .await
            .map_err(io_error)?;
        if !response.status().is_success() {
            return Err(self.failure(collection, None, response).await);
        }
        let list: DocumentList = response.json().await.map_err(io_error)?;
        Ok(list.documents)
    }

    async fn create(
        &self,
        collection: &str,
        data: Value,
        permissions: &[Permission],
    ) -> Result<Document, StoreError> {
        let body = json!({
            "documentId": "unique()",
            "data": data,
            "permissions": permissions,
        });
        let response = self
            .request(Method::POST, &self.collection_url(collection))
            .json(&body)
            .send()
            .await
            .map_err(io_error)?;
        if !response.status().is_success() {
            return Err(self.failure(collection, None, response).await);
        }
        response.json().await.map_err(io_error)
    }

    async fn update(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Document, StoreError> {
        let url = format!("{}/{document_id}", self.collection_url(collection));
        let response = self
            .request(Method::PATCH, &url)
            .json(&json!({ "data": data }))
            .send()
            .await
            .map_err(io_error)?;
        if !response.status().is_success() {
            return Err(self.failure(collection, Some(document_id), response).await);
        }
        response.json().await.map_err(io_error)
    }

    async fn delete(&self, collection: &str, document_id: &str) -> Result<(), StoreError> {
        let url = format!("{}/{document_id}", self.collection_url(collection));
        let response = self
            .request(Method::DELETE, &url)
            .send()
            .await
            .map_err(io_error)?;
        if !response.status().is_success() {
            return Err(self.failure(collection, Some(document_id), response).await);
        }
        Ok(())
    }
}

fn io_error(error: reqwest::Error) -> StoreError {
    StoreError::Io(error.to_string())
}
