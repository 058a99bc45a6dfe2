pub mod catalog_dto;
pub mod library_dto;
pub mod session_dto;
pub mod settings_dto;
