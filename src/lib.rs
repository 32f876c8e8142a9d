// Library for tests to access modules

pub mod aggregation;
pub mod cli;
pub mod config;
pub mod fetcher;
pub mod models;
pub mod proxmox_repo;
pub mod report;
