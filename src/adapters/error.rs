use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::{application::error::ApplicationError, domain::models::job::allowed_extensions_list};

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApplicationError::InvalidContentType => {
                warn!("Upload rejected: request is not multipart/form-data");
                (
                    StatusCode::BAD_REQUEST,
                    "Invalid content type. Expected multipart/form-data".to_string(),
                )
            }
            ApplicationError::MissingFile => {
                warn!("Upload rejected: no 'image' field");
                (StatusCode::BAD_REQUEST, "No file part".to_string())
            }
            ApplicationError::EmptyFilename => {
                warn!("Upload rejected: empty filename");
                (StatusCode::BAD_REQUEST, "No selected file".to_string())
            }
            ApplicationError::UnsupportedType => {
                warn!("Upload rejected: unsupported file type");
                (
                    StatusCode::BAD_REQUEST,
                    format!(
                        "File type not allowed. Please upload {}",
                        allowed_extensions_list()
                    ),
                )
            }
            ApplicationError::UploadError(ref msg) => {
                warn!("Upload error: {}", msg);
                (StatusCode::BAD_REQUEST, format!("Upload error: {}", msg))
            }
            ApplicationError::UpstreamInvalidPath(ref path) => {
                error!("API returned file path that doesn't exist: {}", path);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "API returned invalid file path".to_string(),
                )
            }
            ApplicationError::UpstreamUnsupportedFormat => {
                error!("API returned a result that is not a URL, path or bytes");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "API returned unsupported format".to_string(),
                )
            }
            ApplicationError::ProcessingFailure(ref msg) => {
                error!("Image processing failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Image processing failed: {}", msg),
                )
            }
            ApplicationError::NotFound => {
                warn!("Requested scratch file not found");
                (StatusCode::NOT_FOUND, "File not found".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
