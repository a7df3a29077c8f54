// src/services/mod.rs
pub mod cache_service;
pub mod user_client;
pub mod user_service;
