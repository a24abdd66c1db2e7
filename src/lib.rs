//! LM-driven Instagram caption generation.
//!
//! The core is a linear prompt chain: pick a template for the post, plan the
//! caption structure and the facts it needs, retrieve those facts from web
//! search, then write the final caption in the template's style. Publishing
//! the result as a carousel and extracting new templates from example
//! captions are thin layers on top.

pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod pipeline;
pub mod publish;
pub mod search;
pub mod templates;
