use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ImportError;

pub mod registry;
pub mod shape_inference;

pub use registry::TensorRegistry;

/// Element types the importer only accepts. Extending support means adding a
/// variant here and teaching the builders about it.
pub const SUPPORTED_TYPES: &[DataType] = &[DataType::F32];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    F32,
    F64,
    F16,
    I32,
    I64,
    U8,
}

impl DataType {
    /// Parses an element-type label as emitted by PyTorch (`Float`,
    /// `torch.float32`, `torch.FloatTensor`) or numpy (`float32`).
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().trim_matches('\'');
        let label = label.strip_prefix("torch.").unwrap_or(label);
        let label = label.strip_suffix("Tensor").unwrap_or(label);
        match label.to_ascii_lowercase().as_str() {
            "float" | "float32" => Some(DataType::F32),
            "double" | "float64" => Some(DataType::F64),
            "half" | "float16" => Some(DataType::F16),
            "int" | "int32" => Some(DataType::I32),
            "long" | "int64" => Some(DataType::I64),
            "byte" | "uint8" => Some(DataType::U8),
            _ => None,
        }
    }

    pub const fn width(self) -> usize {
        match self {
            DataType::F64 | DataType::I64 => 8,
            DataType::F32 | DataType::I32 => 4,
            DataType::F16 => 2,
            DataType::U8 => 1,
        }
    }

    pub fn is_supported(self) -> bool {
        SUPPORTED_TYPES.contains(&self)
    }

    /// Fails with `UnsupportedType` unless the type is allow-listed.
    pub fn ensure_supported(self, context: impl Into<String>) -> Result<Self, ImportError> {
        if self.is_supported() {
            Ok(self)
        } else {
            Err(ImportError::UnsupportedType {
                dtype: self.to_string(),
                context: context.into(),
            })
        }
    }

    /// Parses a label and checks it against the allow-list in one go.
    pub fn parse_supported(label: &str, context: impl Into<String>) -> Result<Self, ImportError> {
        match DataType::from_label(label) {
            Some(dtype) => dtype.ensure_supported(context),
            None => Err(ImportError::UnsupportedType {
                dtype: label.to_string(),
                context: context.into(),
            }),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::F32 => "float32",
            DataType::F64 => "float64",
            DataType::F16 => "float16",
            DataType::I32 => "int32",
            DataType::I64 => "int64",
            DataType::U8 => "uint8",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TensorKind {
    Input,
    Initialized,
    Intermediate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    Input,
    /// Little-endian element bytes owned by the registry.
    Initialized(Bytes),
    Intermediate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    pub name: String,
    pub data_type: DataType,
    /// `None` for intermediates, whose shapes the importer does not resolve.
    pub shape: Option<Vec<usize>>,
    pub storage: Storage,
}

impl Tensor {
    pub fn kind(&self) -> TensorKind {
        match self.storage {
            Storage::Input => TensorKind::Input,
            Storage::Initialized(_) => TensorKind::Initialized,
            Storage::Intermediate => TensorKind::Intermediate,
        }
    }

    pub fn data(&self) -> Option<&Bytes> {
        match &self.storage {
            Storage::Initialized(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Decodes initialized float32 data. `None` for other storages or types.
    pub fn to_f32_vec(&self) -> Option<Vec<f32>> {
        if self.data_type != DataType::F32 {
            return None;
        }
        let bytes = self.data()?;
        Some(
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        )
    }
}

/// Loosely-typed attribute value as found on an external node record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribute {
    Int(i64),
    Float(f32),
    String(String),
    Ints(Vec<i64>),
    Floats(Vec<f32>),
}

impl Attribute {
    pub fn type_name(&self) -> &'static str {
        match self {
            Attribute::Int(_) => "int",
            Attribute::Float(_) => "float",
            Attribute::String(_) => "string",
            Attribute::Ints(_) => "ints",
            Attribute::Floats(_) => "floats",
        }
    }
}

pub type Attributes = BTreeMap<String, Attribute>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Gemm,
    Relu,
    Transpose,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OpKind::Gemm => "Gemm",
            OpKind::Relu => "Relu",
            OpKind::Transpose => "Transpose",
        };
        f.write_str(s)
    }
}

/// `Y = alpha * op(A) * op(B) + beta * C`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GemmAttrs {
    pub alpha: f32,
    pub beta: f32,
    pub trans_a: bool,
    pub trans_b: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransposeAttrs {
    pub perm: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Gemm(GemmAttrs),
    Relu,
    Transpose(TransposeAttrs),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub name: String,
    pub op: Op,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub data_type: DataType,
}

impl Operator {
    pub fn kind(&self) -> OpKind {
        match self.op {
            Op::Gemm(_) => OpKind::Gemm,
            Op::Relu => OpKind::Relu,
            Op::Transpose(_) => OpKind::Transpose,
        }
    }
}

/// The compiled graph. Only the importer builds one; afterwards it is
/// read-only.
#[derive(Debug, Clone)]
pub struct ModelIR {
    name: String,
    operators: Vec<Operator>,
    tensors: TensorRegistry,
    outputs: Vec<String>,
}

impl ModelIR {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operators: Vec::new(),
            tensors: TensorRegistry::new(),
            outputs: Vec::new(),
        }
    }

    pub(crate) fn push_operator(&mut self, op: Operator) {
        self.operators.push(op);
    }

    pub(crate) fn tensors_mut(&mut self) -> &mut TensorRegistry {
        &mut self.tensors
    }

    pub(crate) fn set_outputs(&mut self, outputs: Vec<String>) {
        self.outputs = outputs;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn tensors(&self) -> &TensorRegistry {
        &self.tensors
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Tensor> {
        self.tensors.iter_kind(TensorKind::Input)
    }

    pub fn initializers(&self) -> impl Iterator<Item = &Tensor> {
        self.tensors.iter_kind(TensorKind::Initialized)
    }
}
