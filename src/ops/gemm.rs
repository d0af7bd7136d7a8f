use crate::error::ImportError;
use crate::ir::{GemmAttrs, Op, Operator};
use crate::ops::NodeContext;

/// Builds `Y = alpha * op(A) * op(B) + beta * C` from inputs `[A, B, C]`.
///
/// The exporter marks exactly one operand as pre-transposed, so the flags are
/// complements. `transB` decides when present; `transA` is only read when
/// `transB` is absent.
pub fn build(ctx: &NodeContext<'_>) -> Result<Operator, ImportError> {
    ctx.expect_arity(3, 1)?;
    let data_type = ctx.expect_supported_type("Gemm")?;

    let mut attrs = ctx.attributes();
    let alpha = attrs.float("alpha")?.unwrap_or(1.0);
    let beta = attrs.float("beta")?.unwrap_or(1.0);
    let (trans_a, trans_b) = match (attrs.flag("transA")?, attrs.flag("transB")?) {
        (_, Some(b)) => (!b, b),
        (Some(a), None) => (a, !a),
        (None, None) => {
            return Err(ImportError::MissingAttribute {
                node: ctx.name.to_string(),
                attribute: "transA/transB".to_string(),
            })
        }
    };
    attrs.finish()?;

    Ok(Operator {
        name: ctx.name.to_string(),
        op: Op::Gemm(GemmAttrs {
            alpha,
            beta,
            trans_a,
            trans_b,
        }),
        inputs: ctx.inputs.to_vec(),
        outputs: ctx.outputs.to_vec(),
        data_type,
    })
}
