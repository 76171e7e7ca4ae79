//! Coarse semantic roles derived from path conventions.

pub mod purpose;

pub use purpose::{directory_purposes, infer_directory_purpose, infer_file_purpose};
