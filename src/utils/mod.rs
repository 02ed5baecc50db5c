pub mod jwt;
pub mod plan_limits;
