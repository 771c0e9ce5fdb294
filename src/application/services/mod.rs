pub mod background_remover;

pub use background_remover::BackgroundRemover;
