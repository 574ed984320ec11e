//! Common test utilities for genmap.
//!
//! This module provides shared fixtures and assertions for the integration tests.

pub mod assertions;
pub mod image_utils;
pub mod test_data;
