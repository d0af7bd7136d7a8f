use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::ImportError;
use crate::ir::OpKind;
use crate::ops::{self, BuildFn};

/// Kind labels accepted from the external graph. Adding a kind means adding
/// its labels here and a builder in [`builder_for`].
const KIND_LABELS: &[(&str, OpKind)] = &[
    ("onnx::Gemm", OpKind::Gemm),
    ("affine", OpKind::Gemm),
    ("onnx::Relu", OpKind::Relu),
    ("rectifier", OpKind::Relu),
    ("onnx::Transpose", OpKind::Transpose),
    ("transpose", OpKind::Transpose),
];

static KIND_TABLE: Lazy<HashMap<&'static str, OpKind>> =
    Lazy::new(|| KIND_LABELS.iter().copied().collect());

/// Labels may arrive quoted when the extractor used a Python `repr`.
fn normalize(label: &str) -> &str {
    let label = label.trim();
    label
        .strip_prefix('\'')
        .and_then(|l| l.strip_suffix('\''))
        .unwrap_or(label)
}

pub fn resolve_kind(label: &str) -> Result<OpKind, ImportError> {
    KIND_TABLE
        .get(normalize(label))
        .copied()
        .ok_or_else(|| ImportError::UnknownNodeKind {
            kind: label.to_string(),
        })
}

pub fn builder_for(kind: OpKind) -> BuildFn {
    match kind {
        OpKind::Gemm => ops::gemm::build,
        OpKind::Relu => ops::relu::build,
        OpKind::Transpose => ops::transpose::build,
    }
}

pub fn supported_kinds() -> impl Iterator<Item = (&'static str, OpKind)> {
    KIND_LABELS.iter().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_labels() {
        assert_eq!(resolve_kind("onnx::Gemm").unwrap(), OpKind::Gemm);
        assert_eq!(resolve_kind("'onnx::Gemm'").unwrap(), OpKind::Gemm);
        assert_eq!(resolve_kind("affine").unwrap(), OpKind::Gemm);
        assert_eq!(resolve_kind("rectifier").unwrap(), OpKind::Relu);
        assert_eq!(resolve_kind(" 'onnx::Transpose' ").unwrap(), OpKind::Transpose);
    }

    #[test]
    fn test_unknown_label() {
        let err = resolve_kind("unknown_op").unwrap_err();
        assert_eq!(
            err,
            ImportError::UnknownNodeKind {
                kind: "unknown_op".to_string()
            }
        );
        assert!(resolve_kind("onnx::Conv").is_err());
        assert!(resolve_kind("Gemm").is_err());
    }

    #[test]
    fn test_every_label_has_a_builder() {
        for (label, kind) in supported_kinds() {
            assert_eq!(resolve_kind(label).unwrap(), kind);
            let _ = builder_for(kind);
        }
    }
}
