//! Compiles computation graphs exported from PyTorch into a typed, validated
//! intermediate representation.
//!
//! The external extractor hands over node records, a weight dictionary and
//! input/output declarations (see [`loader::GraphSource`]); [`importer`]
//! turns them into an immutable [`ir::ModelIR`].

pub mod config;
pub mod error;
pub mod importer;
pub mod ir;
pub mod loader;
pub mod ops;

pub use config::ImportOptions;
pub use error::ImportError;
pub use importer::{import, Importer};
pub use ir::{DataType, ModelIR, Op, OpKind, Operator, Tensor, TensorKind, TensorRegistry};
pub use loader::{GraphDescription, GraphSource, InputDeclaration, NodeRecord, WeightEntry};
