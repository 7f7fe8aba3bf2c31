pub mod config;
pub mod endpoints;
pub mod ingest;
pub mod live;
pub mod models;
pub mod render;
pub mod storage;
pub mod upstream;
