use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::loader::{
    GraphDescription, InputDeclaration, LoaderError, ModelLoader, NodeRecord, WeightEntry,
};

/// Loads a graph description dumped by an external extractor:
///
/// ```json
/// {
///   "name": "sequential",
///   "placeholder_inputs": 1,
///   "inputs": [{"name": "self.1"}, {"name": "x", "shape": [1, 4]}],
///   "nodes": [{"kind": "onnx::Relu", "inputs": ["x"], "outputs": ["y"], "output_types": ["Float"]}],
///   "weights": [{"name": "w", "dtype": "Float", "shape": [2], "values": [0.5, 1.0]}],
///   "outputs": ["y"]
/// }
/// ```
pub struct JsonGraphLoader;

#[derive(Deserialize)]
struct RawDescription {
    #[serde(default = "default_name")]
    name: String,
    #[serde(default)]
    placeholder_inputs: usize,
    #[serde(default)]
    inputs: Vec<RawInput>,
    #[serde(default)]
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    weights: Vec<RawWeight>,
    #[serde(default)]
    outputs: Vec<String>,
}

/// Placeholder inputs carry no shape, so it is optional here.
#[derive(Deserialize)]
struct RawInput {
    name: String,
    #[serde(default)]
    dtype: Option<String>,
    #[serde(default)]
    shape: Vec<usize>,
}

#[derive(Deserialize)]
struct RawWeight {
    name: String,
    dtype: String,
    shape: Vec<usize>,
    values: Vec<f32>,
}

fn default_name() -> String {
    "model".to_string()
}

impl JsonGraphLoader {
    pub fn from_str(s: &str) -> Result<GraphDescription, LoaderError> {
        let raw: RawDescription =
            serde_json::from_str(s).map_err(|e| LoaderError::InvalidFormat(e.to_string()))?;
        Ok(raw.into())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<GraphDescription, LoaderError> {
        let raw: RawDescription = serde_json::from_reader(reader)
            .map_err(|e| LoaderError::InvalidFormat(e.to_string()))?;
        Ok(raw.into())
    }
}

impl ModelLoader for JsonGraphLoader {
    fn load<P: AsRef<Path>>(path: P) -> Result<GraphDescription, LoaderError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading graph description");
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl From<RawDescription> for GraphDescription {
    fn from(raw: RawDescription) -> Self {
        GraphDescription {
            name: raw.name,
            placeholder_inputs: raw.placeholder_inputs,
            inputs: raw
                .inputs
                .into_iter()
                .map(|i| InputDeclaration {
                    name: i.name,
                    dtype: i.dtype.unwrap_or_else(|| "Float".to_string()),
                    shape: i.shape,
                })
                .collect(),
            nodes: raw.nodes,
            weights: raw
                .weights
                .into_iter()
                .map(|w| WeightEntry {
                    name: w.name,
                    dtype: w.dtype,
                    shape: w.shape,
                    data: w.values.iter().flat_map(|v| v.to_le_bytes()).collect(),
                })
                .collect(),
            outputs: raw.outputs,
        }
    }
}
