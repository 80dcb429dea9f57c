//! Core library for reading anime subtitle files and keeping translations of
//! their dialogue lines.
//!
//! The pipeline is `decode` (bytes to text), `ass` (text to dialogue events,
//! using `classify` to drop song lyrics and `ident` to assign stable ids).
//! `key` builds the storage keys translations live under, `store` and
//! `service` persist them, and `scan`/`library` tie files on disk to episodes.

pub mod ass;
pub mod classify;
pub mod decode;
pub mod error;
pub mod ident;
pub mod key;
pub mod library;
pub mod model;
pub mod scan;
pub mod service;
pub mod store;
pub mod time;

pub use ass::{parse, parse_with, DialogueEvent, ParsedDocument};
pub use error::{Error, Result};
pub use model::{Record, Translation, UserProgress};
