pub mod catalog_service;
pub mod export_service;
pub mod favorite_service;
pub mod grading_service;
pub mod problem_service;
pub mod progress_service;
pub mod quiz_set_service;
pub mod session_config;
pub mod session_service;
pub mod settings_service;
