//! MovR API Library
//!
//! This library provides the core functionality for the MovR fleet API,
//! including domain logic, repositories, and infrastructure components.

pub mod api;
pub mod config;
pub mod domain;
pub mod infrastructure;
