use crate::error::ImportError;
use crate::ir::{Op, Operator};
use crate::ops::NodeContext;

pub fn build(ctx: &NodeContext<'_>) -> Result<Operator, ImportError> {
    ctx.expect_arity(1, 1)?;
    let data_type = ctx.expect_supported_type("Relu")?;
    ctx.attributes().finish()?;

    Ok(Operator {
        name: ctx.name.to_string(),
        op: Op::Relu,
        inputs: ctx.inputs.to_vec(),
        outputs: ctx.outputs.to_vec(),
        data_type,
    })
}
