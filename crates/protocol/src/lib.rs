//! TDF Engine Protocol Types
//!
//! This crate contains protocol types and structures for the TDF engine, including:
//! - Access policy and its canonical serialization
//! - TDF manifest structures, builder, and validating parser
//! - The binary container codec
//!
//! This crate contains NO cryptographic operations and NO I/O.
//! It is purely focused on data structures and serialization.

pub mod binary;
pub mod container;
pub mod manifest;
pub mod policy;

// Re-export commonly used types
pub use container::{ContainerError, ContainerHeader, DecodedContainer, FORMAT_VERSION, MAGIC};

pub use manifest::{
    BindingAlgorithm, EncryptionAlgorithm, EncryptionInformation, EncryptionMethod,
    IntegrityInformation, KeyAccess, Manifest, ManifestBuilder, ManifestError, Payload,
    PolicyBinding, RootSignature, Segment, SegmentHashAlgorithm, WrapAlgorithm, SCHEMA_VERSION,
    SEGMENT_OVERHEAD,
};

pub use policy::{AttributeValue, Policy, PolicyBody, PolicyBuilder, PolicyError};
