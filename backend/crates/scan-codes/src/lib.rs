//! Scanned-payload primitives shared by warehouse scan flows and label
//! generation.
//!
//! The crate is intentionally free of database and async dependencies: it
//! only interprets the text carried by a QR or barcode payload and renders
//! the payload strings printed onto labels. Image encoding stays with the
//! rendering collaborator.

pub mod label;
pub mod resolve;

pub use label::{LabelPayload, item_code, warehouse_code};
pub use resolve::{ScanResolution, resolve};
