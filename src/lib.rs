pub mod api;
pub mod app_error;
pub mod app_state;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod geo;
pub mod middleware;
pub mod models;
pub mod orders;
pub mod otp;
pub mod relay;
pub mod routes;
pub mod schema;
pub mod storage;
pub mod swagger;
