//! Command handlers

pub mod config;
pub mod graph;
pub mod maintenance;
pub mod query;
pub mod reference;
pub mod tag;
