pub mod mock_db;
pub mod postgres_subscription_repository;
pub mod postgres_usage_repository;
pub mod subscription_repository;
pub mod usage_repository;
