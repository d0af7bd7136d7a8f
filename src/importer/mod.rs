//! Compiles external node records, weights and input/output declarations
//! into a [`ModelIR`]. The pass is sequential: every node may only refer to
//! inputs, weights and outputs of earlier nodes. Any failure aborts the whole
//! import.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, info_span};

use crate::config::ImportOptions;
use crate::error::ImportError;
use crate::ir::{DataType, ModelIR, Op, Operator, TensorKind};
use crate::loader::{GraphSource, InputDeclaration, NodeRecord, WeightEntry};
use crate::ops::NodeContext;

pub mod dispatch;

#[derive(Debug, Clone, Default)]
pub struct Importer {
    options: ImportOptions,
}

/// Imports with default options. `inputs` must already exclude any
/// extractor placeholders.
pub fn import(
    nodes: &[NodeRecord],
    weights: &[WeightEntry],
    inputs: &[InputDeclaration],
    outputs: &[String],
) -> Result<ModelIR, ImportError> {
    Importer::default().import(nodes, weights, inputs, outputs)
}

impl Importer {
    pub fn new(options: ImportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn import(
        &self,
        nodes: &[NodeRecord],
        weights: &[WeightEntry],
        inputs: &[InputDeclaration],
        outputs: &[String],
    ) -> Result<ModelIR, ImportError> {
        self.run("model", nodes, weights, inputs, outputs)
    }

    /// Imports from a source, first dropping its leading placeholder inputs.
    pub fn import_source<S: GraphSource + ?Sized>(&self, source: &S) -> Result<ModelIR, ImportError> {
        let skip = self
            .options
            .placeholder_inputs
            .unwrap_or_else(|| source.placeholder_inputs());
        let inputs = source.inputs().get(skip..).unwrap_or(&[]);
        if skip > 0 {
            debug!(skipped = skip.min(source.inputs().len()), "dropping placeholder inputs");
        }
        self.run(
            source.model_name(),
            source.nodes(),
            source.weights(),
            inputs,
            source.outputs(),
        )
    }

    fn run(
        &self,
        model_name: &str,
        nodes: &[NodeRecord],
        weights: &[WeightEntry],
        inputs: &[InputDeclaration],
        outputs: &[String],
    ) -> Result<ModelIR, ImportError> {
        let _span = info_span!("import", model = model_name).entered();
        let mut model = ModelIR::new(model_name);

        for input in inputs {
            let data_type = DataType::parse_supported(&input.dtype, format!("input '{}'", input.name))?;
            model.tensors_mut().declare(
                &input.name,
                data_type,
                Some(input.shape.clone()),
                TensorKind::Input,
            )?;
            debug!(name = %input.name, shape = ?input.shape, "registered input");
        }

        // Weights are materialized after the nodes, but nodes may already
        // consume them.
        let pending: HashMap<&str, &WeightEntry> =
            weights.iter().map(|w| (w.name.as_str(), w)).collect();

        for (index, record) in nodes.iter().enumerate() {
            let op = self.build_node(index, record, &model, &pending)?;
            for output in &op.outputs {
                model
                    .tensors_mut()
                    .declare(output, op.data_type, None, TensorKind::Intermediate)?;
            }
            debug!(
                name = %op.name,
                kind = %op.kind(),
                inputs = ?op.inputs,
                outputs = ?op.outputs,
                "appended operator"
            );
            model.push_operator(op);
        }

        for weight in weights {
            let data_type = DataType::parse_supported(&weight.dtype, format!("weight '{}'", weight.name))?;
            model
                .tensors_mut()
                .materialize(&weight.name, data_type, &weight.shape, &weight.data)?;
            debug!(name = %weight.name, shape = ?weight.shape, "materialized weight");
        }

        let mut seen = HashSet::new();
        for name in outputs {
            if !model.tensors().contains(name) {
                return Err(ImportError::UnknownTensor {
                    name: name.clone(),
                    referenced_by: "graph outputs".to_string(),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(ImportError::DuplicateName { name: name.clone() });
            }
        }
        model.set_outputs(outputs.to_vec());

        info!(
            operators = model.operators().len(),
            tensors = model.tensors().len(),
            outputs = model.outputs().len(),
            "import complete"
        );
        Ok(model)
    }

    fn build_node(
        &self,
        index: usize,
        record: &NodeRecord,
        model: &ModelIR,
        pending: &HashMap<&str, &WeightEntry>,
    ) -> Result<Operator, ImportError> {
        let kind = dispatch::resolve_kind(&record.kind)?;
        let name = record
            .name
            .clone()
            .unwrap_or_else(|| format!("{}_{}", kind, index));

        let label = record
            .output_types
            .first()
            .ok_or_else(|| ImportError::InvalidNode {
                node: name.clone(),
                reason: "no element type declared for its outputs".to_string(),
            })?;
        let data_type = DataType::from_label(label).ok_or_else(|| ImportError::UnsupportedType {
            dtype: label.clone(),
            context: format!("operator {} ({})", name, kind),
        })?;

        for input in &record.inputs {
            if !model.tensors().contains(input) && !pending.contains_key(input.as_str()) {
                return Err(ImportError::UnknownTensor {
                    name: input.clone(),
                    referenced_by: format!("operator {}", name),
                });
            }
        }

        let ctx = NodeContext {
            name: &name,
            attributes: &record.attributes,
            inputs: &record.inputs,
            outputs: &record.outputs,
            data_type,
        };
        let op = dispatch::builder_for(kind)(&ctx)?;

        if self.options.check_permutation_rank {
            check_permutation_rank(&op, model, pending)?;
        }
        Ok(op)
    }
}

fn check_permutation_rank(
    op: &Operator,
    model: &ModelIR,
    pending: &HashMap<&str, &WeightEntry>,
) -> Result<(), ImportError> {
    let Op::Transpose(attrs) = &op.op else {
        return Ok(());
    };
    let input = &op.inputs[0];
    let rank = match model.tensors().get(input) {
        Some(t) => t.shape.as_ref().map(Vec::len),
        None => pending.get(input.as_str()).map(|w| w.shape.len()),
    };
    match rank {
        Some(rank) if rank != attrs.perm.len() => Err(ImportError::InvalidAttribute {
            node: op.name.clone(),
            attribute: "perm".to_string(),
            reason: format!(
                "permutation of length {} applied to '{}' of rank {}",
                attrs.perm.len(),
                input,
                rank
            ),
        }),
        _ => Ok(()),
    }
}
