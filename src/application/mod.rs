// Application layer - Use cases over the monitoring repository
pub mod cancellation;
pub mod entity_service;
pub mod monitoring_repository;
pub mod property_resolver;
pub mod query_service;
