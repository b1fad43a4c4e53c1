//! # Image Job Client Module
//!
//! Client for the asynchronous image generation API. A job is submitted with
//! the quote as its prompt, then its operation is polled until it reports
//! `done`. The finished image arrives base64 encoded and is written to disk.
//!
//! ## Polling
//!
//! Polling is an async sleep loop bounded by [`PollPolicy`]:
//!
//! - a missing `done` field is a shape error, returned immediately
//! - `done: false` consumes one attempt; exhausting them is a timeout
//! - `done: true` with `error` is an operation failure
//!
//! Dropping the returned future stops the poll.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::prelude::*;
use chrono::Local;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::PollPolicy;
use crate::errors::ApiError;

pub const SUBMIT_URL: &str =
    "https://llm.api.cloud.yandex.net/foundationModels/v1/imageGenerationAsync";
pub const OPERATIONS_URL: &str = "https://llm.api.cloud.yandex.net:443/operations";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(40);

/// State of an image job as reported by the operations endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum OperationState {
    Pending,
    /// Finished; carries the base64 image payload
    Done(String),
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ImageRequest<'a> {
    model_uri: String,
    generation_options: GenerationOptions,
    messages: Vec<WeightedPrompt<'a>>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationOptions {
    seed: u64,
    aspect_ratio: AspectRatio,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct AspectRatio {
    width_ratio: &'static str,
    height_ratio: &'static str,
}

#[derive(Serialize, Debug)]
struct WeightedPrompt<'a> {
    weight: &'static str,
    text: &'a str,
}

/// Client for the image generation API
#[derive(Clone)]
pub struct ImageJobClient {
    client: Client,
    api_key: String,
    catalog_id: String,
    submit_url: String,
    operations_url: String,
    image_dir: PathBuf,
    poll: PollPolicy,
}

impl ImageJobClient {
    pub fn new(
        api_key: impl Into<String>,
        catalog_id: impl Into<String>,
        image_dir: impl Into<PathBuf>,
        poll: PollPolicy,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            catalog_id: catalog_id.into(),
            submit_url: SUBMIT_URL.to_string(),
            operations_url: OPERATIONS_URL.to_string(),
            image_dir: image_dir.into(),
            poll,
        })
    }

    /// Point the client at other submit and operations endpoints
    pub fn with_urls(
        mut self,
        submit_url: impl Into<String>,
        operations_url: impl Into<String>,
    ) -> Self {
        self.submit_url = submit_url.into();
        self.operations_url = operations_url.into();
        self
    }

    /// Generate an image for `prompt` and return the path of the saved file
    pub async fn generate(&self, prompt: &str, seed: u64) -> Result<PathBuf, ApiError> {
        let operation_id = self.submit(prompt, seed).await?;
        info!(operation_id = %operation_id, "Image job submitted");

        let id = operation_id.as_str();
        let encoded = poll_operation(&self.poll, id, move || self.fetch_operation(id)).await?;

        let path = save_image(&self.image_dir, &encoded).await?;
        info!(path = %path.display(), "Image saved");
        Ok(path)
    }

    async fn submit(&self, prompt: &str, seed: u64) -> Result<String, ApiError> {
        let request = build_request(&self.catalog_id, prompt, seed);
        let body = send_json(
            self.authorized(self.client.post(&self.submit_url))
                .json(&request),
        )
        .await?;

        parse_operation_id(&body)
    }

    async fn fetch_operation(&self, operation_id: &str) -> Result<Value, ApiError> {
        let url = format!("{}/{}", self.operations_url.trim_end_matches('/'), operation_id);
        send_json(self.authorized(self.client.get(url))).await
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Api-Key {}", self.api_key))
    }
}

async fn send_json(request: RequestBuilder) -> Result<Value, ApiError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            body,
        });
    }
    Ok(response.json().await?)
}

fn build_request<'a>(catalog_id: &str, prompt: &'a str, seed: u64) -> ImageRequest<'a> {
    ImageRequest {
        model_uri: format!("art://{catalog_id}/yandex-art/latest"),
        generation_options: GenerationOptions {
            seed,
            aspect_ratio: AspectRatio {
                width_ratio: "1",
                height_ratio: "1",
            },
        },
        messages: vec![WeightedPrompt {
            weight: "1",
            text: prompt,
        }],
    }
}

/// Read the operation id from a submit response
pub fn parse_operation_id(body: &Value) -> Result<String, ApiError> {
    match body.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Null) | None => Err(ApiError::Shape(format!(
            "ID field not found in response: {body}"
        ))),
        Some(other) => Ok(other.to_string()),
    }
}

/// Interpret one operations endpoint response
pub fn parse_operation(body: &Value) -> Result<OperationState, ApiError> {
    let done = body
        .get("done")
        .and_then(Value::as_bool)
        .ok_or_else(|| ApiError::Shape(format!("missing 'done' field in response: {body}")))?;

    if !done {
        return Ok(OperationState::Pending);
    }

    if let Some(err) = body.get("error").filter(|e| !e.is_null()) {
        return Err(ApiError::OperationFailed(err.to_string()));
    }

    body.pointer("/response/image")
        .and_then(Value::as_str)
        .map(|image| OperationState::Done(image.to_string()))
        .ok_or_else(|| {
            ApiError::Shape(format!("failed to get image data from response: {body}"))
        })
}

/// Poll an operation until it finishes or the policy runs out
///
/// `fetch` is called once per attempt, after waiting `policy.interval`.
pub async fn poll_operation<F, Fut>(
    policy: &PollPolicy,
    operation_id: &str,
    mut fetch: F,
) -> Result<String, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Value, ApiError>>,
{
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.interval).await;

        debug!(operation_id, attempt, "Checking image job status");
        let body = fetch().await?;
        match parse_operation(&body)? {
            OperationState::Pending => continue,
            OperationState::Done(image) => return Ok(image),
        }
    }

    warn!(operation_id, attempts = policy.max_attempts, "Image job did not finish in time");
    Err(ApiError::Timeout(format!(
        "operation {operation_id} not done after {} checks",
        policy.max_attempts
    )))
}

/// Decode a base64 payload and write it to a timestamp-named file in `dir`
pub async fn save_image(dir: &Path, encoded: &str) -> Result<PathBuf, ApiError> {
    let bytes = BASE64_STANDARD
        .decode(encoded.trim())
        .map_err(|e| ApiError::Shape(format!("image payload is not valid base64: {e}")))?;

    let format = image::guess_format(&bytes)
        .map_err(|e| ApiError::Shape(format!("image payload is not a known format: {e}")))?;
    debug!(format = ?format, size = bytes.len(), "Decoded image payload");

    tokio::fs::create_dir_all(dir).await?;
    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let (path, mut file) = create_image_file(dir, &stamp).await?;
    file.write_all(&bytes).await?;
    file.flush().await?;

    Ok(path)
}

// Two jobs finishing within the same second get `_1`, `_2`, ... suffixes.
// `create_new` reserves the name, so concurrent saves never share a file.
async fn create_image_file(dir: &Path, stamp: &str) -> Result<(PathBuf, File), ApiError> {
    let mut suffix = 0u32;
    loop {
        let name = if suffix == 0 {
            format!("{stamp}.jpeg")
        } else {
            format!("{stamp}_{suffix}.jpeg")
        };
        let candidate = dir.join(name);

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => suffix += 1,
            Err(e) => return Err(e.into()),
        }
    }
}
