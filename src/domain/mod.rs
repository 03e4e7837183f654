// Domain layer - Value types and pure normalization rules
pub mod averaging;
pub mod datetime;
pub mod entity;
pub mod error;
pub mod frame;
pub mod historical;
pub mod query;
pub mod status;
