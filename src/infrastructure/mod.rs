// Infrastructure layer - PRTG API adapters and configuration
pub mod config;
pub mod prtg_client;
pub mod prtg_repository;
