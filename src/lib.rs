pub mod api;
pub mod config;
pub mod error;
pub mod humanize;
pub mod observability;
pub mod queue;
pub mod status;
pub mod task;
pub mod worker;
