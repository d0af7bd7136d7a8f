use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;

use tempfile::tempdir;
use torchir::ir::shape_inference::ShapeInference;
use torchir::ir::{Attribute, GemmAttrs};
use torchir::loader::json::JsonGraphLoader;
use torchir::loader::ModelLoader;
use torchir::{
    import, ImportError, Importer, InputDeclaration, ModelIR, NodeRecord, Op, OpKind, TensorKind,
    WeightEntry,
};

fn names(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

struct Graph {
    nodes: Vec<NodeRecord>,
    weights: Vec<WeightEntry>,
    inputs: Vec<InputDeclaration>,
    outputs: Vec<String>,
}

impl Graph {
    fn import(&self) -> Result<ModelIR, ImportError> {
        import(&self.nodes, &self.weights, &self.inputs, &self.outputs)
    }
}

/// Linear(4, 3) -> ReLU -> Linear(3, 2) -> transpose
fn mlp() -> Graph {
    Graph {
        nodes: vec![
            NodeRecord::new("onnx::Gemm", &["x", "fc1.weight", "fc1.bias"], &["h1"])
                .with_attr("alpha", Attribute::Float(1.0))
                .with_attr("beta", Attribute::Float(1.0))
                .with_attr("transB", Attribute::Int(1)),
            NodeRecord::new("onnx::Relu", &["h1"], &["h2"]),
            NodeRecord::new("onnx::Gemm", &["h2", "fc2.weight", "fc2.bias"], &["h3"])
                .with_attr("transB", Attribute::Int(1)),
            NodeRecord::new("onnx::Transpose", &["h3"], &["y"])
                .with_attr("perm", Attribute::Ints(vec![1, 0])),
        ],
        weights: vec![
            WeightEntry::from_f32("fc1.weight", &[3, 4], &[0.1; 12]),
            WeightEntry::from_f32("fc1.bias", &[3], &[0.0, 0.5, 1.0]),
            WeightEntry::from_f32("fc2.weight", &[2, 3], &[0.2; 6]),
            WeightEntry::from_f32("fc2.bias", &[2], &[1.0, -1.0]),
        ],
        inputs: vec![InputDeclaration::new("x", "Float", &[5, 4])],
        outputs: names(&["y"]),
    }
}

#[test]
fn registry_holds_exactly_inputs_weights_and_outputs() {
    let graph = mlp();
    let model = graph.import().unwrap();

    assert_eq!(model.operators().len(), graph.nodes.len());

    let mut expected: BTreeSet<String> = graph.inputs.iter().map(|i| i.name.clone()).collect();
    expected.extend(graph.weights.iter().map(|w| w.name.clone()));
    expected.extend(graph.nodes.iter().flat_map(|n| n.outputs.clone()));
    let actual: BTreeSet<String> = model.tensors().names().map(str::to_string).collect();
    assert_eq!(actual, expected);

    assert_eq!(model.inputs().count(), 1);
    assert_eq!(model.initializers().count(), 4);
    assert_eq!(
        model.tensors().iter_kind(TensorKind::Intermediate).count(),
        4
    );
    assert_eq!(
        model.operators().iter().map(|o| o.kind()).collect::<Vec<_>>(),
        vec![OpKind::Gemm, OpKind::Relu, OpKind::Gemm, OpKind::Transpose]
    );
}

#[test]
fn reimport_is_structurally_identical_with_independent_buffers() {
    let graph = mlp();
    let first = graph.import().unwrap();
    let second = graph.import().unwrap();

    assert_eq!(first.operators(), second.operators());
    assert_eq!(first.outputs(), second.outputs());
    assert_eq!(
        first.tensors().iter().collect::<Vec<_>>(),
        second.tensors().iter().collect::<Vec<_>>()
    );

    let a = first.tensors().lookup("fc1.weight").unwrap().data().unwrap();
    let b = second.tensors().lookup("fc1.weight").unwrap().data().unwrap();
    let src = &graph.weights[0].data;
    assert_eq!(a, b);
    assert_ne!(a.as_ptr(), b.as_ptr());
    assert_ne!(a.as_ptr(), src.as_ptr());
}

#[test]
fn model_outlives_its_source() {
    let model = {
        let graph = mlp();
        graph.import().unwrap()
    };
    let bias = model.tensors().lookup("fc1.bias").unwrap();
    assert_eq!(bias.to_f32_vec().unwrap(), vec![0.0, 0.5, 1.0]);
}

#[test]
fn model_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ModelIR>();

    let model = std::sync::Arc::new(mlp().import().unwrap());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let model = model.clone();
            std::thread::spawn(move || model.operators().len())
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), 4);
    }
}

#[test]
fn scenario_affine_with_matching_weights() {
    let graph = Graph {
        nodes: vec![NodeRecord::new("affine", &["x", "w", "b"], &["z"])
            .with_attr("alpha", Attribute::Float(1.0))
            .with_attr("beta", Attribute::Float(1.0))
            .with_attr("transB", Attribute::Int(1))],
        weights: vec![
            WeightEntry::from_f32("w", &[2, 4], &[1.0; 8]),
            WeightEntry::from_f32("b", &[2], &[0.0; 2]),
        ],
        inputs: vec![InputDeclaration::new("x", "float32", &[1, 4])],
        outputs: names(&["z"]),
    };
    let model = graph.import().unwrap();
    assert_eq!(
        model.operators()[0].op,
        Op::Gemm(GemmAttrs {
            alpha: 1.0,
            beta: 1.0,
            trans_a: false,
            trans_b: true,
        })
    );
    assert_eq!(ShapeInference::infer(&model).unwrap()["z"], vec![1, 2]);
}

#[test]
fn failures_return_no_model() {
    let mut graph = mlp();
    graph.nodes.swap(0, 1);
    let err = graph.import().unwrap_err();
    assert!(matches!(err, ImportError::UnknownTensor { name, .. } if name == "h1"));

    let mut graph = mlp();
    graph.weights[2] = WeightEntry::from_f32("fc2.weight", &[2, 3], &[0.0; 5]);
    assert!(matches!(
        graph.import(),
        Err(ImportError::ShapeMismatch { expected: 6, actual: 5, .. })
    ));

    let mut graph = mlp();
    graph.nodes.push(NodeRecord::new("unknown_op", &["y"], &["q"]));
    assert!(matches!(
        graph.import(),
        Err(ImportError::UnknownNodeKind { kind }) if kind == "unknown_op"
    ));
}

#[test]
fn imports_json_description_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sequential.json");
    let mut file = File::create(&path).unwrap();
    file.write_all(
        br#"{
            "name": "sequential",
            "placeholder_inputs": 1,
            "inputs": [{"name": "self.1"}, {"name": "input.1", "shape": [12, 1]}],
            "nodes": [
                {"kind": "'onnx::Gemm'", "attributes": {"alpha": 1.0, "beta": 1.0, "transB": 1},
                 "inputs": ["input.1", "0.weight", "0.bias"], "outputs": ["3"], "output_types": ["'Float'"]},
                {"kind": "'onnx::Relu'", "inputs": ["3"], "outputs": ["4"], "output_types": ["'Float'"]}
            ],
            "weights": [
                {"name": "0.weight", "dtype": "Float", "shape": [12, 1], "values": [1,1,1,1,1,1,1,1,1,1,1,1]},
                {"name": "0.bias", "dtype": "Float", "shape": [12], "values": [0,0,0,0,0,0,0,0,0,0,0,0]}
            ],
            "outputs": ["4"]
        }"#,
    )
    .unwrap();

    let desc = JsonGraphLoader::load(&path).unwrap();
    let model = Importer::default().import_source(&desc).unwrap();

    assert_eq!(model.name(), "sequential");
    assert_eq!(model.operators().len(), 2);
    assert!(!model.tensors().contains("self.1"));
    assert_eq!(model.outputs(), ["4".to_string()].as_slice());

    let shapes = ShapeInference::infer(&model).unwrap();
    assert_eq!(shapes["4"], vec![12, 12]);
}
