//! Test Module
//!
//! Cross-module test suite for the Pokédex core.
//!
//! ## Test Categories
//! - `fixtures`: in-memory creature provider and mock LLM shared by all suites
//! - `brain_tests`: name resolution, intent priority, team synthesis, renderers
//! - `actor_tests`: supervisor orchestration over the brain and a mock LLM
//! - `integration_tests`: reference conversations and the full HTTP stack


mod brain_tests;
