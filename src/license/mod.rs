//! License label normalization.
//!
//! - [`matcher`] — fingerprints free-text labels so that formatting variants
//!   ("BSD 2-Clause" vs "BSD-2-Clause") compare equal.

pub mod matcher;
