use std::collections::HashMap;

use crate::error::ImportError;
use crate::ir::{GemmAttrs, ModelIR, Op, Operator};

/// Resolves intermediate shapes of an imported model. The model itself is not
/// touched; operators whose input shapes are unknown are skipped.
pub struct ShapeInference;

impl ShapeInference {
    pub fn infer(ir: &ModelIR) -> Result<HashMap<String, Vec<usize>>, ImportError> {
        let mut value_shapes: HashMap<String, Vec<usize>> = ir
            .tensors()
            .iter()
            .filter_map(|t| t.shape.clone().map(|s| (t.name.clone(), s)))
            .collect();

        for node in ir.operators() {
            let shapes: Option<Vec<&Vec<usize>>> =
                node.inputs.iter().map(|i| value_shapes.get(i)).collect();
            let Some(shapes) = shapes else {
                continue;
            };

            let output_shape = match &node.op {
                Op::Relu => shapes[0].clone(),
                Op::Transpose(attrs) => {
                    let shape = shapes[0];
                    if attrs.perm.len() != shape.len() {
                        return Err(rank_error(node, &node.inputs[0], attrs.perm.len(), shape.len()));
                    }
                    attrs.perm.iter().map(|&p| shape[p]).collect()
                }
                Op::Gemm(attrs) => infer_gemm(node, attrs, shapes[0], shapes[1])?,
            };

            value_shapes.insert(node.outputs[0].clone(), output_shape);
        }

        Ok(value_shapes)
    }
}

fn infer_gemm(
    node: &Operator,
    attrs: &GemmAttrs,
    shape_a: &[usize],
    shape_b: &[usize],
) -> Result<Vec<usize>, ImportError> {
    if shape_a.len() != 2 {
        return Err(rank_error(node, &node.inputs[0], 2, shape_a.len()));
    }
    if shape_b.len() != 2 {
        return Err(rank_error(node, &node.inputs[1], 2, shape_b.len()));
    }

    let (m, k_a) = if attrs.trans_a {
        (shape_a[1], shape_a[0])
    } else {
        (shape_a[0], shape_a[1])
    };
    let (k_b, n) = if attrs.trans_b {
        (shape_b[1], shape_b[0])
    } else {
        (shape_b[0], shape_b[1])
    };

    if k_a != k_b {
        return Err(ImportError::ShapeMismatch {
            name: node.inputs[1].clone(),
            expected: k_a,
            actual: k_b,
        });
    }
    Ok(vec![m, n])
}

fn rank_error(node: &Operator, tensor: &str, expected: usize, actual: usize) -> ImportError {
    ImportError::InvalidNode {
        node: node.name.clone(),
        reason: format!(
            "expected '{}' to have rank {}, found rank {}",
            tensor, expected, actual
        ),
    }
}
