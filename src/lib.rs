//! techhub - Backend for the Beit Shemesh tech community site
//!
//! This library provides the JSON API, storage layer and mail notifier
//! behind the community's public pages and admin dashboard.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
