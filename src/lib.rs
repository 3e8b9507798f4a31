pub mod capacity;
pub mod client;
pub mod config;
pub mod controller;
pub mod errors;
pub mod helpers;
pub mod models;
pub mod planner;
pub mod repositories;
