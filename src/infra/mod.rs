pub mod app;
pub mod config;
pub mod db;
pub mod setup;
pub mod shopify_client;
pub mod webhook_verifier;
