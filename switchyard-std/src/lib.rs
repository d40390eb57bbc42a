//! # switchyard-std
//!
//! Standard implementations for the switchyard agent router.
//!
//! This crate provides:
//! - **Schemas**: [`schema::JsonSchema`], [`schema::FnSchema`], [`schema::AnyInput`]
//! - **Streaming**: [`stream::channel`], [`stream::ResponseStream`]
//! - **Writing**: [`writer::StreamWriter`] for text, metadata and synthetic tool calls
//! - **Messages**: helpers for UI-shaped conversation messages
//! - **Identifiers**: [`ids::UuidGenerator`], [`ids::ShortIdGenerator`]
//! - **Testing**: recording doubles in [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use switchyard_core;

// Modules
pub mod ids;
pub mod messages;
pub mod schema;
pub mod stream;
pub mod testing;
pub mod writer;
