//! Core library for gamesense
//!
//! This crate implements the **Functional Core** of the gamesense proxy,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`gamesense_core`** (this crate): Pure transformation functions with zero I/O
//! - **`gamesense`**: HTTP server, guide fetching and model dispatch (the Imperative Shell)
//!
//! Everything here can be tested with fixture data. Nothing here opens a
//! socket, reads the clock or sleeps.
//!
//! # Module Organization
//!
//! - [`api`]: Request and response bodies of `POST /api/generate-content`
//! - [`chat`]: Chat roles, messages and the pending placeholder
//! - [`guide`]: Readable-text extraction from guide pages
//! - [`payload`]: Prompt resolution and context assembly under a character budget
//! - [`gemini`]: Gemini `generateContent` wire types
//! - [`retry`]: Failure classification and exponential backoff schedule
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use gamesense_core::guide::GuideText;
//! use gamesense_core::payload::{build_payload, ContextBudget, PayloadInput};
//!
//! let guides = vec![GuideText::loaded("https://example.com/guide", "Rush B.")];
//! let request = build_payload(
//!     PayloadInput {
//!         history: &[],
//!         prompt: Some("How do I win pistol rounds?"),
//!         system_instruction: None,
//!         guides: &guides,
//!     },
//!     ContextBudget::default(),
//! )?;
//!
//! assert_eq!(request.contents.len(), 1);
//! ```

pub mod api;
pub mod chat;
pub mod gemini;
pub mod guide;
pub mod payload;
pub mod retry;
