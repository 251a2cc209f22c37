//! Data models for the book inventory

pub mod book;

pub use book::{Book, BookDraft, BookFilter, BookPayload};
