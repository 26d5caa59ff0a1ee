//! Core types & traits: credentials, errors, input shapes and tool contracts.

pub mod content;
pub mod credential;
pub mod error;
pub mod shape;
pub mod tool;
