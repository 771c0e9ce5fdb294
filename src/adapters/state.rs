use std::sync::Arc;

use crate::{application::services::BackgroundRemover, services::ScratchStorage};

#[derive(Clone)]
pub struct AppState {
    pub scratch: Arc<ScratchStorage>,
    pub background_remover: Arc<dyn BackgroundRemover>,
}
