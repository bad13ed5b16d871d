pub mod calendar;
pub mod churn;
pub mod config;
pub mod error;
pub mod features;
pub mod forecast;
pub mod health;
pub mod loader;
pub mod mock_data;
pub mod normalize;
pub mod overview;
pub mod pipeline;
pub mod records;
pub mod rng;
pub mod sentiment;
pub mod types;
