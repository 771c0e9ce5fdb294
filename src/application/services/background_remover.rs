use std::path::Path;

use async_trait::async_trait;

use crate::{domain::models::inference::InferenceResult, services::InferenceError};

/// Submits a stored image to the external background-removal endpoint.
///
/// Implementations decide the shape of the upstream answer exactly once and
/// hand back one of the [`InferenceResult`] variants.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    async fn remove_background(&self, input: &Path) -> Result<InferenceResult, InferenceError>;
}
