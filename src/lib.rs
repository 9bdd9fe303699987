//! petmed Library
//!
//! Pet medication schedule and daily health-record tracking.

pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod schedule;
pub mod session;
pub mod tools;
