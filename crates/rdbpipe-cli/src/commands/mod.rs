pub mod ingest;
pub mod tables;
