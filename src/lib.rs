pub mod analyzer;
pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod handler;
pub mod model;
pub mod server;
pub mod session;
pub mod tokenizer;
pub mod util;
