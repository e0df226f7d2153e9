// Library for tests to access modules

pub mod ai_gateway;
pub mod api_gateway;
pub mod config;
pub mod error;
pub mod models;
pub mod monitoring;
pub mod notifications;
pub mod routes;
pub mod sensor_gateway;
pub mod services;
pub mod simulation;
pub mod upstream;
pub mod version;
pub mod worker;
