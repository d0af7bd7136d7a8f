//! Operator builders. Each one turns a node record into an [`Operator`],
//! validating arity, element type and a typed attribute set. Builders never
//! touch the tensor registry.

use std::collections::BTreeSet;

use crate::error::ImportError;
use crate::ir::{Attribute, Attributes, DataType, Operator};

pub mod gemm;
pub mod relu;
pub mod transpose;

/// Everything a builder gets to see of a node.
#[derive(Debug, Clone, Copy)]
pub struct NodeContext<'a> {
    pub name: &'a str,
    pub attributes: &'a Attributes,
    pub inputs: &'a [String],
    pub outputs: &'a [String],
    pub data_type: DataType,
}

pub type BuildFn = fn(&NodeContext<'_>) -> Result<Operator, ImportError>;

impl<'a> NodeContext<'a> {
    pub(crate) fn expect_arity(&self, inputs: usize, outputs: usize) -> Result<(), ImportError> {
        if self.inputs.len() != inputs || self.outputs.len() != outputs {
            return Err(ImportError::InvalidNode {
                node: self.name.to_string(),
                reason: format!(
                    "expected {} input(s) and {} output(s), found {} and {}",
                    inputs,
                    outputs,
                    self.inputs.len(),
                    self.outputs.len()
                ),
            });
        }
        Ok(())
    }

    pub(crate) fn expect_supported_type(&self, op: &str) -> Result<DataType, ImportError> {
        self.data_type
            .ensure_supported(format!("operator {} ({})", self.name, op))
    }

    pub(crate) fn attributes(&self) -> AttributeReader<'a> {
        AttributeReader {
            node: self.name,
            attributes: self.attributes,
            consumed: BTreeSet::new(),
        }
    }
}

/// Typed view over a node's attribute map. Every read marks the key as
/// consumed; [`AttributeReader::finish`] rejects whatever is left.
pub(crate) struct AttributeReader<'a> {
    node: &'a str,
    attributes: &'a Attributes,
    consumed: BTreeSet<&'a str>,
}

impl<'a> AttributeReader<'a> {
    fn take(&mut self, key: &str) -> Option<(&'a str, &'a Attribute)> {
        let (k, v) = self.attributes.get_key_value(key)?;
        self.consumed.insert(k.as_str());
        Some((k.as_str(), v))
    }

    fn invalid(&self, key: &str, reason: String) -> ImportError {
        ImportError::InvalidAttribute {
            node: self.node.to_string(),
            attribute: key.to_string(),
            reason,
        }
    }

    pub fn float(&mut self, key: &str) -> Result<Option<f32>, ImportError> {
        match self.take(key) {
            None => Ok(None),
            Some((k, Attribute::Float(f))) if !f.is_finite() => {
                Err(self.invalid(k, format!("expected a finite float, found {}", f)))
            }
            Some((_, Attribute::Float(f))) => Ok(Some(*f)),
            Some((_, Attribute::Int(i))) => Ok(Some(*i as f32)),
            Some((k, other)) => Err(self.invalid(k, format!("expected float, found {}", other.type_name()))),
        }
    }

    /// Integer flags as exported by PyTorch: 0 is false, anything else true.
    pub fn flag(&mut self, key: &str) -> Result<Option<bool>, ImportError> {
        match self.take(key) {
            None => Ok(None),
            Some((_, Attribute::Int(i))) => Ok(Some(*i != 0)),
            Some((k, other)) => Err(self.invalid(k, format!("expected int flag, found {}", other.type_name()))),
        }
    }

    pub fn ints(&mut self, key: &str) -> Result<Option<&'a [i64]>, ImportError> {
        match self.take(key) {
            None => Ok(None),
            Some((_, Attribute::Ints(v))) => Ok(Some(v.as_slice())),
            Some((k, other)) => Err(self.invalid(k, format!("expected ints, found {}", other.type_name()))),
        }
    }

    pub fn finish(self) -> Result<(), ImportError> {
        let extra = self
            .attributes
            .keys()
            .find(|k| !self.consumed.contains(k.as_str()));
        match extra {
            Some(k) => Err(self.invalid(k, "not recognised for this operator".to_string())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(attrs: &'a Attributes, inputs: &'a [String], outputs: &'a [String]) -> NodeContext<'a> {
        NodeContext {
            name: "n0",
            attributes: attrs,
            inputs,
            outputs,
            data_type: DataType::F32,
        }
    }

    #[test]
    fn test_reader_rejects_mistyped_and_extra() {
        let mut attrs = Attributes::new();
        attrs.insert("alpha".to_string(), Attribute::String("one".to_string()));
        attrs.insert("unused".to_string(), Attribute::Int(3));
        let no_names: Vec<String> = Vec::new();
        let c = ctx(&attrs, &no_names, &no_names);

        let mut reader = c.attributes();
        let err = reader.float("alpha").unwrap_err();
        assert!(matches!(err, ImportError::InvalidAttribute { attribute, .. } if attribute == "alpha"));

        let err = reader.finish().unwrap_err();
        assert!(matches!(err, ImportError::InvalidAttribute { attribute, .. } if attribute == "unused"));
    }

    #[test]
    fn test_reader_widens_int_to_float() {
        let mut attrs = Attributes::new();
        attrs.insert("beta".to_string(), Attribute::Int(2));
        let no_names: Vec<String> = Vec::new();
        let c = ctx(&attrs, &no_names, &no_names);

        let mut reader = c.attributes();
        assert_eq!(reader.float("beta").unwrap(), Some(2.0));
        assert_eq!(reader.float("alpha").unwrap(), None);
        reader.finish().unwrap();
    }

    #[test]
    fn test_reader_rejects_non_finite_float() {
        // 1e39 overflows f32 during deserialization
        let attrs: Attributes = serde_json::from_str(r#"{"beta": 1e39}"#).unwrap();
        assert_eq!(attrs["beta"], Attribute::Float(f32::INFINITY));
        let no_names: Vec<String> = Vec::new();
        let c = ctx(&attrs, &no_names, &no_names);

        let err = c.attributes().float("beta").unwrap_err();
        assert!(matches!(err, ImportError::InvalidAttribute { attribute, .. } if attribute == "beta"));
    }

    #[test]
    fn test_expect_arity() {
        let attrs = Attributes::new();
        let inputs = vec!["x".to_string()];
        let outputs = vec!["y".to_string(), "z".to_string()];
        let err = ctx(&attrs, &inputs, &outputs).expect_arity(1, 1).unwrap_err();
        assert!(matches!(err, ImportError::InvalidNode { node, .. } if node == "n0"));
    }
}
