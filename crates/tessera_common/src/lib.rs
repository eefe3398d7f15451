//! Shared foundational types used across the Tessera mapping engine.
//!
//! This crate provides [`Bits`], the fixed-width unsigned bit-vector value
//! that flows through expression construction, architecture descriptions,
//! solver models, and interpretation.

#![warn(missing_docs)]

pub mod bits;

pub use bits::Bits;
