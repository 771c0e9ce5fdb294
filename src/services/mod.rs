mod error;
mod gradio_remover;
mod scratch_storage;

pub use error::InferenceError;
pub use gradio_remover::GradioRemover;
pub use scratch_storage::{spawn_eviction, ScratchStorage};

use std::sync::Arc;

use crate::{application::services::BackgroundRemover, domain::config::UpstreamConfig};

pub fn create_background_remover(
    config: &UpstreamConfig,
) -> Result<Arc<dyn BackgroundRemover>, InferenceError> {
    let remover = GradioRemover::new(config.clone())?;
    Ok(Arc::new(remover))
}
