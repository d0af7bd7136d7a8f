mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

use torchir::importer::dispatch;
use torchir::ir::shape_inference::ShapeInference;
use torchir::ir::{ModelIR, Op};
use torchir::loader::json::JsonGraphLoader;
use torchir::loader::ModelLoader;
use torchir::{ImportOptions, Importer};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log).context("invalid --log filter")?)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Import {
            graph,
            config,
            shapes,
        } => {
            let options = match config {
                Some(path) => ImportOptions::from_file(&path)
                    .with_context(|| format!("failed to read options from {}", path.display()))?,
                None => ImportOptions::default(),
            };
            let desc = JsonGraphLoader::load(&graph)
                .with_context(|| format!("failed to load graph {}", graph.display()))?;
            let model = Importer::new(options)
                .import_source(&desc)
                .with_context(|| format!("failed to import {}", graph.display()))?;
            print_model(&model, shapes)
        }
        Command::Kinds => {
            for (label, kind) in dispatch::supported_kinds() {
                println!("{:<18} {}", label, kind);
            }
            Ok(())
        }
    }
}

fn print_model(model: &ModelIR, shapes: bool) -> Result<()> {
    println!("model {}", model.name());

    println!("tensors:");
    for t in model.tensors().iter() {
        let shape = t
            .shape
            .as_ref()
            .map(|s| format!("{:?}", s))
            .unwrap_or_else(|| "?".to_string());
        let kind = format!("{:?}", t.kind());
        println!("  {:<20} {:<12} {} {}", t.name, kind, t.data_type, shape);
    }

    println!("operators:");
    for op in model.operators() {
        let attrs = match &op.op {
            Op::Gemm(a) => format!(
                " alpha={} beta={} transA={} transB={}",
                a.alpha, a.beta, a.trans_a as u8, a.trans_b as u8
            ),
            Op::Transpose(a) => format!(" perm={:?}", a.perm),
            Op::Relu => String::new(),
        };
        println!(
            "  {} = {}({}){}",
            op.outputs.join(", "),
            op.kind(),
            op.inputs.join(", "),
            attrs
        );
    }

    println!("outputs: {}", model.outputs().join(", "));

    if shapes {
        let inferred = ShapeInference::infer(model).context("shape inference failed")?;
        println!("shapes:");
        for t in model.tensors().iter() {
            if let Some(s) = inferred.get(&t.name) {
                println!("  {:<20} {:?}", t.name, s);
            }
        }
    }
    Ok(())
}
