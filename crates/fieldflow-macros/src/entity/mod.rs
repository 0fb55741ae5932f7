//! Implementation of the `#[derive(Entity)]` macro.
//!
//! This module provides derive macro support for fieldflow, generating typed
//! field constants and column metadata from struct annotations.

mod attrs;
mod derive;

pub use derive::entity_derive_impl;
