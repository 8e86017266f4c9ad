//! Integration tests for hierarchical routing
//!
//! This test suite validates:
//! - Route propagation across several hierarchy levels
//! - Loop and usability checks when clusters forward routes
//! - Repeatable passes and consistency under concurrent access
//! - Scenario files as consumed by the simulation driver

pub mod test_utils;

#[cfg(test)]
mod propagation_tests;


#[cfg(test)]
mod scenario_tests;
