use super::{ApiError, ChatInput, ChatOutput, UploadOutput, UploadRequest};
use crate::config::ClientConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

/// HTTP client for the Q&A backend. Built once from [`ClientConfig`];
/// clones share the same connection pool and settings.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    request_timeout: Duration,
    upload_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout(),
            upload_timeout: config.upload_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /chat/` with the given questions.
    pub async fn chat(&self, questions: &[String]) -> Result<ChatOutput, ApiError> {
        let body = ChatInput {
            questions: questions.to_vec(),
        };
        let url = format!("{}/chat/", self.base_url);

        with_timeout(self.request_timeout, async {
            let resp = self.http.post(url).json(&body).send().await?;
            read_json(resp).await
        })
        .await
    }

    /// `POST /upload` as multipart with `file` and `title` fields.
    pub async fn upload(&self, request: &UploadRequest) -> Result<UploadOutput, ApiError> {
        // Cloning `Bytes` bumps a refcount; the payload itself is not copied.
        let part = multipart::Part::stream_with_length(
            request.bytes.clone(),
            request.bytes.len() as u64,
        )
        .file_name(request.file_name.clone())
        .mime_str(request.mime_type())?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("title", request.title.clone());
        let url = format!("{}/upload", self.base_url);

        with_timeout(self.upload_timeout, async {
            let resp = self.http.post(url).multipart(form).send().await?;
            read_json(resp).await
        })
        .await
    }
}

async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| ApiError::Timeout(limit))?
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        return Err(ApiError::Api {
            status,
            message: text,
        });
    }

    let text = resp.text().await?;
    serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))
}
