//! Demo CLI: build an index over synthetic random vectors and report
//! per-layer occupancy, grounded on `print_index_stats`/`main` in
//! `examples/original_source/main.cpp`. Single-threaded, matching the
//! crate itself — there is no async runtime to report.

use arena_hnsw::distance::SquaredEuclidean;
use arena_hnsw::params::{DEFAULT_BLOCK_SIZE, IndexParams};
use arena_hnsw::Index;
use clap::Parser;
use rand::Rng;

#[derive(Parser, Debug)]
#[command(version, about = "Report HNSW layer statistics for synthetic data")]
struct Cli {
    /// Vector dimension.
    #[arg(long, default_value_t = 128)]
    dimension: u32,

    /// Upper bound on live elements; sizes the arena.
    #[arg(long, default_value_t = 10_000)]
    max_elements: u32,

    /// Target out-degree on layers above 0.
    #[arg(long, default_value_t = 16)]
    m: u32,

    /// How many synthetic vectors to insert before reporting stats.
    #[arg(long, default_value_t = 1_000)]
    insert: u32,

    /// Arena block size in bytes.
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let params = IndexParams::new(cli.dimension, cli.max_elements, cli.m);

    println!(
        "Index: {} elements, dim = {}, M = {}, M0 = {}",
        cli.max_elements, cli.dimension, cli.m, params.m0
    );

    let mut index = match Index::create(params, SquaredEuclidean, cli.block_size) {
        Ok(index) => index,
        Err(err) => {
            eprintln!("failed to create index: {err}");
            std::process::exit(1);
        }
    };

    println!("max layers: {}", index.params_layout_count());
    println!("Layers:");
    for stats in index.layer_stats() {
        println!(
            "probability: {:.6} bytes_per_element: {} estimated_n_elements: {} estimated_total_gb: {:.6}",
            stats.probability,
            stats.bytes_per_element,
            stats.estimated_elements,
            stats.estimated_total_bytes as f64 / 1024.0 / 1024.0 / 1024.0
        );
    }
    println!();

    let mut rng = rand::thread_rng();
    let mut inserted = 0u32;
    for i in 0..cli.insert {
        let payload: Vec<f32> = (0..cli.dimension).map(|_| rng.gen_range(-1.0..1.0)).collect();
        match index.insert(&payload, i) {
            Ok(_) => inserted += 1,
            Err(err) => {
                eprintln!("stopped after {inserted} inserts: {err}");
                break;
            }
        }
    }

    println!("inserted {inserted} vectors, live_count = {}", index.live_count());
    println!(
        "entrypoint external_id = {:?}",
        index.external_id_of(index.entrypoint()).ok()
    );
}
