//! Read an R program on stdin and dump it:
//! - the debug S-expression of each top-level expression on stdout,
//! - the node holding each expression on stderr.
//!
//! With `--tokens`, dump the token stream instead: position, kind, lexeme.
//!
//! ```ignore
//! <input.R r_to_debug
//! RUST_LOG=littler=trace r_to_debug --tokens <input.R
//! ```

use std::io::Read;

use littler::{data::Storage, reader::Tokenizer};
use tracing_subscriber::EnvFilter;

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let store = Storage::default();

    if std::env::args().skip(1).any(|arg| arg == "--tokens") {
        for token in Tokenizer::new(&store, input.chars()) {
            let token = token.map_err(|e| e.annotate("<stdin>"))?;
            println!(
                "{}:{}\t{}\t{:?}",
                token.line, token.column, token.kind, token.lexeme
            );
        }
        return Ok(());
    }

    let program = littler::parse_str(&store, &input).map_err(|e| e.annotate("<stdin>"))?;
    for cell in program.iter() {
        println!("{}", cell.head.sexpr());
        eprintln!("{}", cell.head);
    }
    let stats = store.current_stats();
    tracing::info!(
        nodes = stats.nodes,
        data_bytes = stats.data_bytes,
        "storage used"
    );
    Ok(())
}
