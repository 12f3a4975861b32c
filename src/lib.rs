// Wildfire: trend and engagement analytics for monitored social accounts.
//
// This is the library root. Each module corresponds to a major subsystem
// of the collection and scoring pipeline.

pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod output;
pub mod scoring;
pub mod source;
pub mod status;
pub mod trends;
