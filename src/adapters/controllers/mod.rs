pub mod image_controller;
pub mod page_controller;
