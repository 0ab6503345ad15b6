//! Integration tests for Sitelens
//!
//! These tests use wiremock to stand in for the analyzed sites and run the
//! pipeline end-to-end against both storage backends.

mod analyzer_tests;
mod common;
mod pipeline_tests;
