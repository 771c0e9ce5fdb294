use std::{path::Path, time::Duration};

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::{
    application::services::BackgroundRemover,
    domain::{config::UpstreamConfig, models::inference::InferenceResult},
    services::error::InferenceError,
};

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Client for a Gradio Space exposing a single image-in, image-out endpoint.
///
/// A submission is three calls: upload the file, queue a call that references
/// it, then read the event stream until the job completes.
pub struct GradioRemover {
    client: Client,
    config: UpstreamConfig,
}

#[derive(Debug, Deserialize)]
struct QueuedCall {
    event_id: String,
}

/// Output shapes a Space can return before they are mapped onto
/// [`InferenceResult`].
#[derive(Debug, PartialEq)]
enum UpstreamOutput {
    Text(String),
    Url(String),
    Bytes(Vec<u8>),
}

impl GradioRemover {
    pub fn new(config: UpstreamConfig) -> Result<Self, InferenceError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| InferenceError::InternalError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response, InferenceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(InferenceError::ProviderError {
            status: status.as_u16(),
            message,
        })
    }

    async fn upload(&self, input: &Path) -> Result<String, InferenceError> {
        let content = tokio::fs::read(input)
            .await
            .map_err(|e| InferenceError::InternalError(format!("Cannot read input: {}", e)))?;
        let file_name = file_name_of(input);

        let part = multipart::Part::bytes(content).file_name(file_name);
        let form = multipart::Form::new().part("files", part);

        let url = format!("{}/gradio_api/upload", self.config.base_url);
        let response = self
            .authorize(self.client.post(&url))
            .multipart(form)
            .send()
            .await?;
        let paths: Vec<String> = Self::check(response).await?.json().await?;

        paths.into_iter().next().ok_or_else(|| {
            InferenceError::UnsupportedFormat("upload returned no file paths".to_string())
        })
    }

    async fn queue_call(&self, remote_path: &str, orig_name: &str) -> Result<String, InferenceError> {
        let url = format!(
            "{}/gradio_api/call/{}",
            self.config.base_url,
            self.config.endpoint()
        );
        let body = json!({
            "data": [{
                "path": remote_path,
                "orig_name": orig_name,
                "meta": { "_type": "gradio.FileData" },
            }]
        });

        let response = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await?;
        let queued: QueuedCall = Self::check(response).await?.json().await?;
        Ok(queued.event_id)
    }

    async fn await_result(&self, event_id: &str) -> Result<Value, InferenceError> {
        let url = format!(
            "{}/gradio_api/call/{}/{}",
            self.config.base_url,
            self.config.endpoint(),
            event_id
        );
        let response = self.authorize(self.client.get(&url)).send().await?;
        let body = Self::check(response).await?.text().await?;
        parse_event_stream(&body)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, InferenceError> {
        let response = self.authorize(self.client.get(url)).send().await?;
        let bytes = Self::check(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn submit(&self, input: &Path) -> Result<InferenceResult, InferenceError> {
        let remote_path = self.upload(input).await?;
        debug!("Uploaded {} as {}", input.display(), remote_path);

        let event_id = self.queue_call(&remote_path, &file_name_of(input)).await?;
        debug!("Queued call {} on {}", event_id, self.config.api_name);

        let data = self.await_result(&event_id).await?;
        match interpret_output(data)? {
            UpstreamOutput::Text(text) => Ok(InferenceResult::from_upstream_text(&text)),
            UpstreamOutput::Url(url) if self.config.fetch_results => {
                Ok(InferenceResult::Bytes(self.fetch(&url).await?))
            }
            UpstreamOutput::Url(url) => Ok(InferenceResult::RemoteUrl(url)),
            UpstreamOutput::Bytes(bytes) => Ok(InferenceResult::Bytes(bytes)),
        }
    }
}

#[async_trait]
impl BackgroundRemover for GradioRemover {
    async fn remove_background(&self, input: &Path) -> Result<InferenceResult, InferenceError> {
        info!(
            "Submitting {} to {}{}",
            input.display(),
            self.config.base_url,
            self.config.api_name
        );

        let mut attempt = 0;
        loop {
            match self.submit(input).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        "Upstream attempt {} of {} failed: {}",
                        attempt,
                        self.config.max_retries + 1,
                        e
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image.jpg".to_string())
}

/// Reads a Gradio server-sent event stream and returns the `data` of the
/// `complete` event.
fn parse_event_stream(body: &str) -> Result<Value, InferenceError> {
    let mut event: Option<&str> = None;

    for line in body.lines() {
        if let Some(name) = line.strip_prefix("event:") {
            event = Some(name.trim());
        } else if let Some(data) = line.strip_prefix("data:") {
            match event {
                Some("complete") => {
                    return serde_json::from_str(data.trim())
                        .map_err(|e| InferenceError::UnsupportedFormat(e.to_string()));
                }
                Some("error") => return Err(InferenceError::JobFailed(data.trim().to_string())),
                _ => {}
            }
        }
    }

    Err(InferenceError::JobFailed(
        "event stream ended without a result".to_string(),
    ))
}

fn interpret_output(data: Value) -> Result<UpstreamOutput, InferenceError> {
    let output = match data {
        Value::Array(mut outputs) if !outputs.is_empty() => outputs.swap_remove(0),
        other => return Err(InferenceError::UnsupportedFormat(other.to_string())),
    };

    match output {
        Value::String(text) => Ok(UpstreamOutput::Text(text)),
        Value::Object(ref file) => {
            if let Some(url) = file.get("url").and_then(Value::as_str) {
                Ok(UpstreamOutput::Url(url.to_string()))
            } else if let Some(path) = file.get("path").and_then(Value::as_str) {
                Ok(UpstreamOutput::Text(path.to_string()))
            } else {
                Err(InferenceError::UnsupportedFormat(output.to_string()))
            }
        }
        Value::Array(ref items) => items
            .iter()
            .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
            .collect::<Option<Vec<u8>>>()
            .map(UpstreamOutput::Bytes)
            .ok_or_else(|| InferenceError::UnsupportedFormat(output.to_string())),
        other => Err(InferenceError::UnsupportedFormat(other.to_string())),
    }
}
