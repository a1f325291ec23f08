//! Topic names for PUB/SUB routing.

/// Host and service status events published by monitoring agents.
pub const STATUS: &str = "status";
