pub mod file_processor;
pub mod import;
pub mod session;
pub mod submitter;
