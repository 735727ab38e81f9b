//! Integration test suite for tempvar-engine
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **hydration**: Whole hydration passes through the public API with a scripted runner
//! - **render**: Rendering hydrated dashboards
//! - **cli**: The `tempvar` binary end to end

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cli;
mod hydration;
mod render;
