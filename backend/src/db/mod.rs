pub mod farmer_repository;
pub mod feedback_log;
