//! Fingerprinted static asset server
//!
//! Builds CSS and JavaScript bundles from source directories or a prebuilt
//! manifest, serves them under digest-stamped URLs with far-future caching
//! and renders the matching `<script>`/`<link>` tags.

pub mod assets;
pub mod compiler;
pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
