pub mod batch;
pub mod generator;
pub mod orchestrator;
pub mod prompt;
pub mod retry;
pub mod schema;
