use crate::error::ImportError;
use crate::ir::{Op, Operator, TransposeAttrs};
use crate::ops::NodeContext;

/// Builds a Transpose. `perm` must be a permutation of `0..perm.len()`;
/// agreement with the input's rank is checked by the importer, which knows
/// the shapes.
pub fn build(ctx: &NodeContext<'_>) -> Result<Operator, ImportError> {
    ctx.expect_arity(1, 1)?;
    let data_type = ctx.expect_supported_type("Transpose")?;

    let mut attrs = ctx.attributes();
    let raw = attrs.ints("perm")?.ok_or_else(|| ImportError::MissingAttribute {
        node: ctx.name.to_string(),
        attribute: "perm".to_string(),
    })?;
    attrs.finish()?;

    let perm = validate_permutation(raw).map_err(|reason| ImportError::InvalidAttribute {
        node: ctx.name.to_string(),
        attribute: "perm".to_string(),
        reason,
    })?;

    Ok(Operator {
        name: ctx.name.to_string(),
        op: Op::Transpose(TransposeAttrs { perm }),
        inputs: ctx.inputs.to_vec(),
        outputs: ctx.outputs.to_vec(),
        data_type,
    })
}

fn validate_permutation(raw: &[i64]) -> Result<Vec<usize>, String> {
    let rank = raw.len();
    let mut seen = vec![false; rank];
    let mut perm = Vec::with_capacity(rank);
    for &axis in raw {
        if axis < 0 || axis as usize >= rank {
            return Err(format!("axis {} out of range for rank {}", axis, rank));
        }
        let axis = axis as usize;
        if seen[axis] {
            return Err(format!("axis {} appears more than once", axis));
        }
        seen[axis] = true;
        perm.push(axis);
    }
    Ok(perm)
}
