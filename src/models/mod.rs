pub mod chat;
pub mod plan;
pub mod usage;
