pub mod favorite;
pub mod problem;
pub mod progress;
pub mod quiz_set;
pub mod session;
pub mod settings;
