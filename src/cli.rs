use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "torchir", version, about = "Compile exported PyTorch graphs into torchir IR")]
pub struct Cli {
    /// Log level filter (RUST_LOG syntax)
    #[arg(long, global = true, default_value = "warn")]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import a graph description and print the resulting IR
    Import {
        /// Path to the JSON graph description
        graph: std::path::PathBuf,

        /// Optional JSON file with import options
        #[arg(long)]
        config: Option<std::path::PathBuf>,

        /// Resolve and print intermediate tensor shapes
        #[arg(long)]
        shapes: bool,
    },
    /// List the node kind labels the importer understands
    Kinds,
}
