pub mod log_archive;
pub mod logger;
pub mod models;
