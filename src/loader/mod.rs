//! The boundary to whatever extracted the graph. The importer only sees a
//! [`GraphSource`]; how the records were produced is not its concern.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ir::Attributes;

pub mod json;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// One operation of the external graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(default)]
    pub name: Option<String>,
    pub kind: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Element-type label per output; the first one types the node.
    #[serde(default)]
    pub output_types: Vec<String>,
}

impl NodeRecord {
    pub fn new(kind: impl Into<String>, inputs: &[&str], outputs: &[&str]) -> Self {
        Self {
            name: None,
            kind: kind.into(),
            attributes: Attributes::new(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            output_types: vec!["Float".to_string(); outputs.len()],
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: crate::ir::Attribute) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_output_types(mut self, types: &[&str]) -> Self {
        self.output_types = types.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// A learned parameter: raw little-endian element bytes plus metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightEntry {
    pub name: String,
    pub dtype: String,
    pub shape: Vec<usize>,
    pub data: Vec<u8>,
}

impl WeightEntry {
    pub fn from_f32(name: impl Into<String>, shape: &[usize], values: &[f32]) -> Self {
        Self {
            name: name.into(),
            dtype: "Float".to_string(),
            shape: shape.to_vec(),
            data: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDeclaration {
    pub name: String,
    #[serde(default = "default_dtype")]
    pub dtype: String,
    pub shape: Vec<usize>,
}

impl InputDeclaration {
    pub fn new(name: impl Into<String>, dtype: impl Into<String>, shape: &[usize]) -> Self {
        Self {
            name: name.into(),
            dtype: dtype.into(),
            shape: shape.to_vec(),
        }
    }
}

fn default_dtype() -> String {
    "Float".to_string()
}

pub trait GraphSource {
    fn nodes(&self) -> &[NodeRecord];
    fn weights(&self) -> &[WeightEntry];
    fn inputs(&self) -> &[InputDeclaration];
    fn outputs(&self) -> &[String];

    /// Leading entries of [`GraphSource::inputs`] that stand for the
    /// extractor's own module placeholder rather than real graph inputs.
    fn placeholder_inputs(&self) -> usize {
        0
    }

    fn model_name(&self) -> &str {
        "model"
    }
}

/// An in-memory graph description, typically produced by [`json::JsonGraphLoader`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphDescription {
    pub name: String,
    pub nodes: Vec<NodeRecord>,
    pub weights: Vec<WeightEntry>,
    pub inputs: Vec<InputDeclaration>,
    pub outputs: Vec<String>,
    pub placeholder_inputs: usize,
}

impl GraphSource for GraphDescription {
    fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    fn weights(&self) -> &[WeightEntry] {
        &self.weights
    }

    fn inputs(&self) -> &[InputDeclaration] {
        &self.inputs
    }

    fn outputs(&self) -> &[String] {
        &self.outputs
    }

    fn placeholder_inputs(&self) -> usize {
        self.placeholder_inputs
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

pub trait ModelLoader {
    fn load<P: AsRef<Path>>(path: P) -> Result<GraphDescription, LoaderError>;
}
