//! Kids asset API - validates child-facing prompts and turns them into illustrations
//!
//! A prompt goes through local filters, is reinterpreted by a language model into
//! a brand-free visual description with multilingual labels, and is then rendered
//! by an image model into a PNG stored under the media directory.

pub mod ai;
pub mod app;
pub mod error;
pub mod media;
pub mod models;
pub mod prompts;
pub mod server;
pub mod validator;

pub use error::{Error, Result};
