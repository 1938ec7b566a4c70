//! Render a parsed R program as Graphviz.
//!
//! Usage:
//!
//! ```ignore
//! <input.R r_to_graphviz | dot -T png >output.png
//! ```

use std::io::{stdout, Read, Write};

use littler::{data::Storage, parse_str, render_tree};
use tracing_subscriber::EnvFilter;

/// Reads an R program on input, renders its tree as Graphviz.
pub fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let store = Storage::default();
    let program = parse_str(&store, &input).map_err(|e| e.annotate("<stdin>"))?;
    let out = render_tree(program);
    stdout().write_all(&out)
}
