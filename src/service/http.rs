// src/service/http.rs
// HTTP client for the remote job service

use super::{DownloadLink, JobId, JobService, ServiceError, UploadResponse, VideoJob, VideoUpload};
use crate::identity::{Access, ApiBase, Rendition};
use crate::selection::SelectionSet;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::{multipart, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 15;
const UPLOAD_TIMEOUT_SECS: u64 = 60;
const CONNECT_TIMEOUT_SECS: u64 = 10;

pub struct HttpJobService {
    base: ApiBase,
    client: reqwest::Client,
}

impl HttpJobService {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let base = ApiBase::new(base_url);
        tracing::info!("Job service client initialized for {}", base.as_str());

        Ok(Self { base, client })
    }

    /// Open the video byte stream for the given rendition
    pub async fn video_stream(
        &self,
        access: &Access,
        job_id: &JobId,
        rendition: Rendition,
    ) -> Result<impl Stream<Item = Result<Bytes, ServiceError>>, ServiceError> {
        let path = access.family().stream_path(job_id, rendition);
        let response = send(self.request(Method::GET, access, &path)).await?;
        Ok(response.bytes_stream().map(|chunk| chunk.map_err(map_transport_error)))
    }

    fn request(&self, method: Method, access: &Access, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.base.url(path));
        match access.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn json_request(&self, method: Method, access: &Access, path: &str) -> RequestBuilder {
        self.request(method, access, path)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }
}

#[async_trait]
impl JobService for HttpJobService {
    async fn upload(&self, access: &Access, video: &VideoUpload) -> Result<UploadResponse, ServiceError> {
        let file = tokio::fs::File::open(video.path())
            .await
            .map_err(|e| ServiceError::Io(e.to_string()))?;

        let file_part = multipart::Part::stream_with_length(reqwest::Body::from(file), video.size())
            .file_name(video.file_name().to_string())
            .mime_str(video.mime())
            .map_err(|e| ServiceError::Io(e.to_string()))?;
        let form = multipart::Form::new().part("file", file_part);

        tracing::info!(
            "Uploading {} ({} bytes) via {:?} endpoints",
            video.file_name(),
            video.size(),
            access.family()
        );

        let response = send(
            self.request(Method::POST, access, access.family().upload_path())
                .multipart(form)
                .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS)),
        )
        .await?;
        decode(response).await
    }

    async fn job_status(&self, access: &Access, job_id: &JobId) -> Result<VideoJob, ServiceError> {
        let path = access.family().job_path(job_id, "status");
        let response = send(self.json_request(Method::GET, access, &path)).await?;
        decode(response).await
    }

    async fn submit_selections(
        &self,
        access: &Access,
        job_id: &JobId,
        selections: &SelectionSet,
    ) -> Result<(), ServiceError> {
        let path = access.family().job_path(job_id, "watermarks");
        send(self.json_request(Method::POST, access, &path).json(selections)).await?;
        Ok(())
    }

    async fn selections(&self, access: &Access, job_id: &JobId) -> Result<SelectionSet, ServiceError> {
        let path = access.family().job_path(job_id, "watermarks");
        let response = send(self.json_request(Method::GET, access, &path)).await?;
        decode(response).await
    }

    async fn start_processing(&self, access: &Access, job_id: &JobId) -> Result<(), ServiceError> {
        let path = access.family().job_path(job_id, "process");
        send(self.json_request(Method::POST, access, &path)).await?;
        Ok(())
    }

    async fn list_jobs(&self, access: &Access) -> Result<Vec<VideoJob>, ServiceError> {
        access.require_authenticated()?;
        let response = send(self.json_request(Method::GET, access, "/api/jobs")).await?;
        decode(response).await
    }

    async fn delete_job(&self, access: &Access, job_id: &JobId) -> Result<(), ServiceError> {
        access.require_authenticated()?;
        let path = format!("/api/jobs/{}", job_id);
        send(self.json_request(Method::DELETE, access, &path)).await?;
        Ok(())
    }

    async fn download_link(&self, access: &Access, job_id: &JobId) -> Result<DownloadLink, ServiceError> {
        access.require_authenticated()?;
        let path = format!("/api/jobs/{}/download", job_id);
        let response = send(self.json_request(Method::GET, access, &path)).await?;
        decode(response).await
    }

    fn stream_url(&self, access: &Access, job_id: &JobId, rendition: Rendition) -> String {
        self.base.url(&access.family().stream_path(job_id, rendition))
    }
}

async fn send(builder: RequestBuilder) -> Result<Response, ServiceError> {
    let response = builder.send().await.map_err(map_transport_error)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status, &body))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let body = response
        .bytes()
        .await
        .map_err(map_transport_error)?;
    serde_json::from_slice(&body).map_err(|e| ServiceError::Decode(e.to_string()))
}

fn map_transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout
    } else {
        ServiceError::Network(err.to_string())
    }
}

/// Map a non-success response onto the error taxonomy
fn classify_status(status: StatusCode, body: &str) -> ServiceError {
    match status {
        StatusCode::UNAUTHORIZED => ServiceError::Unauthorized,
        StatusCode::NOT_FOUND => ServiceError::NotFound,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ServiceError::Timeout,
        _ => ServiceError::Http {
            status: status.as_u16(),
            detail: error_detail(body),
        },
    }
}

/// The service reports failures as `{"detail": "..."}`
fn error_detail(body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("detail").cloned())
        .map(|detail| match detail {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        });

    from_json.unwrap_or_else(|| body.trim().chars().take(200).collect())
}
