// Library for the binary and for tests to access modules

pub mod aggregation;
pub mod config;
pub mod directory;
pub mod ingest;
pub mod models;
pub mod render;
pub mod report;
pub mod sink;
pub mod source;
pub mod store;
