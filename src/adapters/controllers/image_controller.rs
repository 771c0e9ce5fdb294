use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info, warn};

use crate::{
    adapters::{dto::image_dto::UploadResponse, state::AppState},
    application::error::ApplicationError,
    domain::models::{
        inference::InferenceResult,
        job::{is_allowed_filename, JobId},
    },
};

pub struct ImageController;

impl ImageController {
    /// POST /upload
    /// Multipart field `image`. Stores the upload, runs it through the
    /// background remover and returns where the results can be fetched.
    pub async fn upload(
        State(app_state): State<AppState>,
        headers: HeaderMap,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<Json<UploadResponse>, ApplicationError> {
        let is_multipart = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("multipart/form-data"));
        if !is_multipart {
            return Err(ApplicationError::InvalidContentType);
        }

        let mut multipart =
            multipart.map_err(|e| ApplicationError::UploadError(e.body_text()))?;
        let (filename, content) = read_image_field(&mut multipart)
            .await?
            .ok_or(ApplicationError::MissingFile)?;

        if filename.is_empty() {
            return Err(ApplicationError::EmptyFilename);
        }
        if !is_allowed_filename(&filename) {
            return Err(ApplicationError::UnsupportedType);
        }

        let job_id = JobId::new();
        info!(
            "Received {} ({} bytes) as job {}",
            filename,
            content.len(),
            job_id
        );

        let input_path = app_state
            .scratch
            .write(&job_id.input_filename(), &content)
            .await
            .map_err(|e| ApplicationError::ProcessingFailure(e.to_string()))?;

        debug!("Submitting job to remove background from {}", input_path.display());
        let result = app_state
            .background_remover
            .remove_background(&input_path)
            .await?;
        debug!("API returned: {:?}", ResultKind(&result));

        store_result(&app_state, &job_id, &result).await?;

        Ok(Json(UploadResponse::new(&job_id, &result)))
    }

    /// GET /get_image/{filename}
    pub async fn get_image(
        State(app_state): State<AppState>,
        Path(filename): Path<String>,
    ) -> Result<Response, ApplicationError> {
        let content = app_state.scratch.read(&filename).await?;
        Ok(file_response(&filename, content))
    }

    /// GET /download/{filename}
    pub async fn download(
        State(app_state): State<AppState>,
        Path(filename): Path<String>,
    ) -> Result<Response, ApplicationError> {
        let content = app_state.scratch.read(&filename).await?;
        let mut response = file_response(&filename, content);

        let disposition = format!("attachment; filename=\"removed_bg_{}\"", filename);
        match HeaderValue::from_str(&disposition) {
            Ok(value) => {
                response
                    .headers_mut()
                    .insert(header::CONTENT_DISPOSITION, value);
            }
            Err(e) => warn!("Cannot build Content-Disposition for {}: {}", filename, e),
        }

        Ok(response)
    }
}

/// Returns the client filename and content of the first `image` file part.
/// Parts without a `filename` parameter are plain form values, not files.
async fn read_image_field(
    multipart: &mut Multipart,
) -> Result<Option<(String, Bytes)>, ApplicationError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Invalid multipart data: {}", e);
        ApplicationError::UploadError(e.body_text())
    })? {
        if field.name() != Some("image") {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            debug!("Ignoring 'image' form value without a filename");
            continue;
        };

        let content = field.bytes().await.map_err(|e| {
            warn!("Cannot read image bytes: {}", e);
            ApplicationError::UploadError(e.body_text())
        })?;
        return Ok(Some((filename, content)));
    }

    Ok(None)
}

async fn store_result(
    app_state: &AppState,
    job_id: &JobId,
    result: &InferenceResult,
) -> Result<(), ApplicationError> {
    let output = job_id.output_filename();

    match result {
        InferenceResult::RemoteUrl(url) => {
            info!("Job {} produced remote result {}", job_id, url);
        }
        InferenceResult::LocalPath(path) => {
            let exists = tokio::fs::try_exists(path).await.unwrap_or(false);
            if !exists {
                return Err(ApplicationError::UpstreamInvalidPath(
                    path.display().to_string(),
                ));
            }
            app_state
                .scratch
                .copy_from(path, &output)
                .await
                .map_err(|e| ApplicationError::ProcessingFailure(e.to_string()))?;
            info!("Job {} copied result from {}", job_id, path.display());
        }
        InferenceResult::Bytes(bytes) => {
            app_state
                .scratch
                .write(&output, bytes)
                .await
                .map_err(|e| ApplicationError::ProcessingFailure(e.to_string()))?;
            info!("Job {} wrote {} result bytes", job_id, bytes.len());
        }
    }

    Ok(())
}

fn file_response(filename: &str, content: Vec<u8>) -> Response {
    let mime = mime_guess::from_path(filename).first_or_octet_stream();
    ([(header::CONTENT_TYPE, mime.to_string())], content).into_response()
}

/// Logs a result without dumping image bytes.
struct ResultKind<'a>(&'a InferenceResult);

impl std::fmt::Debug for ResultKind<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            InferenceResult::RemoteUrl(url) => write!(f, "RemoteUrl({})", url),
            InferenceResult::LocalPath(path) => write!(f, "LocalPath({})", path.display()),
            InferenceResult::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}
