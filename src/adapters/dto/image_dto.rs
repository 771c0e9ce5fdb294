use serde::{Deserialize, Serialize};

use crate::domain::models::{inference::InferenceResult, job::JobId};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    pub original: String,
    pub processed: String,
    pub download: String,
    pub api_url: Option<String>,
}

impl UploadResponse {
    /// Remote results are handed to the browser as-is; everything else is
    /// served from scratch storage.
    pub fn new(job_id: &JobId, result: &InferenceResult) -> Self {
        let original = format!("/get_image/{}", job_id.input_filename());
        match result {
            InferenceResult::RemoteUrl(url) => Self {
                original,
                processed: url.clone(),
                download: url.clone(),
                api_url: Some(url.clone()),
            },
            _ => Self {
                original,
                processed: format!("/get_image/{}", job_id.output_filename()),
                download: format!("/download/{}", job_id.output_filename()),
                api_url: result.api_url(),
            },
        }
    }
}
