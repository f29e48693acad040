// Library interface for newswise modules
// This allows tests and the binaries to import modules

pub mod context;
pub mod feed;
pub mod ingestion;
pub mod llm;
pub mod model;
pub mod personalization;
pub mod processing;
pub mod sections;
pub mod server;
pub mod storage;
