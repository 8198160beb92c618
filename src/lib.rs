//! `gem-license-checkr` — resolve the licenses of a Bundler project's gems
//! and check them against a policy.
//!
//! # Flow
//! 1. Resolve locked gems from `Gemfile.lock` ([`resolver`]).
//! 2. Fetch each gem's licenses from installed gemspecs or RubyGems.org,
//!    canonicalizing descriptive labels through GitHub ([`fetcher`], [`registry`]).
//! 3. Classify every gem against the policy ([`config`], [`checker`]).
//! 4. Render a report ([`report`]).

pub mod checker;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod license;
pub mod models;
pub mod registry;
pub mod report;
pub mod resolver;

pub use error::{Error, Result};
