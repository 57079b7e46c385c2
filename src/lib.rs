//! Mailnav library
//!
//! Exposes the binary's config and fixture modules for integration testing.

pub mod config;
pub mod fixture;

pub use config::AppConfig;
pub use fixture::{build_fixture_site, Fixture, FixturePractice};
