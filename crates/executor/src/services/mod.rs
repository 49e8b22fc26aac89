pub mod execution_service;
pub mod signal_validator;
