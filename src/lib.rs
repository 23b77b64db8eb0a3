pub mod compactor;
pub mod config;
pub mod engine;
pub mod input;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod people;
pub mod ports;
pub mod wal;
