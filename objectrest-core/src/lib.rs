//! Core wire types for objectrest.
//!
//! This crate provides the pieces shared between generated SDK crates and the
//! client runtime (`objectrest-client`):
//!
//! - [`codec`]: polymorphic JSON entity encode/decode with scalar adapters
//! - [`mask`]: the object-mask selection tree and its compact renderer
//! - [`descriptor`]: generator-produced type, service and method descriptors
//! - [`registry`]: the process-wide wire-tag → type descriptor registry
//! - [`entity`]: the [`ApiType`] object model and unknown-field capture
//! - [`nullable`]: tri-state nullable-optional fields
//! - [`error`]: codec errors and the remote fault envelope
//!
//! Generated code depends on this crate alone; nothing here performs I/O.

mod descriptor;
mod entity;
mod error;
mod nullable;
mod registry;

pub mod codec;
pub mod mask;

pub use descriptor::{MethodSpec, ServiceSpec, TypeSpec};
pub use entity::{ApiType, JsonMap, Poly, TypedEntity, UnknownFields};
pub use error::{CodecError, Fault, FaultKind};
pub use nullable::NullableOption;
pub use registry::TypeRegistry;

// Re-export the mask entry points at the top level for convenience.
pub use mask::{Mask, MaskNodeId, MaskRef};
