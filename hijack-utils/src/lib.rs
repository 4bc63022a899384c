//! Utility library for the hijack-mitigation project

pub mod json_stream;
pub mod serde;
