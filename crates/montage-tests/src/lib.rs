//! Integration test crate for Montage.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on the other montage crates to verify they work together.

#[cfg(test)]
mod fake;

#[cfg(test)]
mod editing;

#[cfg(test)]
mod export;

#[cfg(test)]
mod project;
