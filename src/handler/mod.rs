//! Request handler module
//!
//! Responsible for request routing dispatch and fingerprinted asset serving.

pub mod assets;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
