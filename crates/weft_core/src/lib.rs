//! # weft_core - Core Primitives
//!
//! Shared primitives for the Weft mounting runtime:
//! - Surface, view-tag and revision-number identifiers
//! - Injectable monotonic sequence generation
//!
//! This crate carries no external dependencies so every other crate in the
//! workspace can depend on it without pulling anything else in.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod id;
pub mod sequence;

pub use id::{RevisionNumber, SurfaceId, ViewTag};
pub use sequence::SequenceGenerator;
