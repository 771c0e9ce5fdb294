pub mod image_dto;
