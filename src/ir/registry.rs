use std::collections::HashMap;

use bytes::Bytes;

use crate::error::ImportError;
use crate::ir::{DataType, Storage, Tensor, TensorKind};

/// Name-keyed tensor table. Iteration follows registration order.
#[derive(Debug, Clone, Default)]
pub struct TensorRegistry {
    tensors: Vec<Tensor>,
    index: HashMap<String, usize>,
}

impl TensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an input or intermediate tensor. Initialized tensors carry
    /// data and go through [`TensorRegistry::materialize`] instead.
    pub fn declare(
        &mut self,
        name: &str,
        data_type: DataType,
        shape: Option<Vec<usize>>,
        kind: TensorKind,
    ) -> Result<&Tensor, ImportError> {
        let storage = match kind {
            TensorKind::Input => {
                if shape.is_none() {
                    return Err(ImportError::InvalidTensor {
                        name: name.to_string(),
                        reason: "input tensors must declare a shape".to_string(),
                    });
                }
                Storage::Input
            }
            TensorKind::Intermediate => Storage::Intermediate,
            TensorKind::Initialized => {
                return Err(ImportError::InvalidTensor {
                    name: name.to_string(),
                    reason: "initialized tensors must be materialized with their data".to_string(),
                })
            }
        };
        self.ensure_vacant(name)?;
        data_type.ensure_supported(format!("tensor '{}'", name))?;

        Ok(self.insert(Tensor {
            name: name.to_string(),
            data_type,
            shape,
            storage,
        }))
    }

    /// Copies `buffer` into registry-owned storage as an initialized tensor.
    /// `buffer` must hold exactly `product(shape)` little-endian elements.
    pub fn materialize(
        &mut self,
        name: &str,
        data_type: DataType,
        shape: &[usize],
        buffer: &[u8],
    ) -> Result<&Tensor, ImportError> {
        self.ensure_vacant(name)?;
        data_type.ensure_supported(format!("weight '{}'", name))?;

        let width = data_type.width();
        let (expected, byte_len) = shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .and_then(|n| n.checked_mul(width).map(|bytes| (n, bytes)))
            .ok_or_else(|| ImportError::InvalidTensor {
                name: name.to_string(),
                reason: format!("shape {:?} is too large to address", shape),
            })?;
        if buffer.len() != byte_len {
            return Err(ImportError::ShapeMismatch {
                name: name.to_string(),
                expected,
                actual: buffer.len() / width,
            });
        }

        Ok(self.insert(Tensor {
            name: name.to_string(),
            data_type,
            shape: Some(shape.to_vec()),
            storage: Storage::Initialized(Bytes::copy_from_slice(buffer)),
        }))
    }

    pub fn lookup(&self, name: &str) -> Result<&Tensor, ImportError> {
        self.get(name).ok_or_else(|| ImportError::UnknownTensor {
            name: name.to_string(),
            referenced_by: "lookup".to_string(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.index.get(name).map(|&i| &self.tensors[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tensor> {
        self.tensors.iter()
    }

    pub fn iter_kind(&self, kind: TensorKind) -> impl Iterator<Item = &Tensor> {
        self.tensors.iter().filter(move |t| t.kind() == kind)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.iter().map(|t| t.name.as_str())
    }

    fn ensure_vacant(&self, name: &str) -> Result<(), ImportError> {
        if self.contains(name) {
            return Err(ImportError::DuplicateName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn insert(&mut self, tensor: Tensor) -> &Tensor {
        let idx = self.tensors.len();
        self.index.insert(tensor.name.clone(), idx);
        self.tensors.push(tensor);
        &self.tensors[idx]
    }
}
