use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_derive::Serialize;

use name_fib::fib::config::{BackendKind, FibConfig};
use name_fib::fib::{Fib, PatriciaFib};
use name_fib::stats::FibStats;
use name_fib::{Bitmap, Name};

// The port capacity for backends without a fixed number of ports.
const DEFAULT_PORTS: usize = 128;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// File with the names to insert, one per line
    load_file: PathBuf,

    /// File with the names to look up, one per line. Defaults to the
    /// inserted names.
    test_file: Option<PathBuf>,

    /// The FIB backend to measure
    #[arg(short, long, default_value_t = BackendKind::Tbf)]
    backend: BackendKind,

    /// JSON file with the backend configuration. Overrides --backend.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the hash keys and the random egress ports
    #[arg(short, long)]
    seed: Option<u64>,

    /// Replace every segment by its SHA-256 digest before inserting or
    /// looking up
    #[arg(long, default_value_t = false)]
    hashed: bool,

    /// Skip the comparison against an exact FIB
    #[arg(long, default_value_t = false)]
    no_verify: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    config: FibConfig,
    hashed: bool,
    loaded: usize,
    load_millis: u128,
    tested: usize,
    lookup_millis: u128,
    nanos_per_lookup: f64,
    // lookups whose answer is not the exact one, if verified
    false_positives: Option<usize>,
    stats: FibStats,
}

fn load_names(path: &Path, hashed: bool) -> Result<Vec<Name>, Box<dyn Error>> {
    let t0 = Instant::now();
    let mut names = vec![];
    for line in BufReader::new(File::open(path)?).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let name = line.parse::<Name>()?;
        names.push(if hashed { name.hashed() } else { name });
    }
    eprintln!(
        "loaded {} names from {} in {}ms",
        names.len(),
        path.display(),
        t0.elapsed().as_millis()
    );
    Ok(names)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => serde_json::from_reader(File::open(path)?)?,
        None => FibConfig::default_for(args.backend),
    };
    if let Some(seed) = args.seed {
        config.set_seed(seed);
    }
    let ports = config.ports().unwrap_or(DEFAULT_PORTS);
    let mut fib = config.build()?;
    let mut reference = PatriciaFib::new();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    let load = load_names(&args.load_file, args.hashed)?;
    let test = match &args.test_file {
        Some(path) => load_names(path, args.hashed)?,
        None => load.clone(),
    };

    let t0 = Instant::now();
    for name in &load {
        let egress = Bitmap::from_indices(ports, [rng.random_range(0..ports)]);
        fib.insert(name, &egress);
        if !args.no_verify {
            reference.insert(name, &egress);
        }
    }
    let load_millis = t0.elapsed().as_millis();
    eprintln!("inserted {} names in {}ms", load.len(), load_millis);

    let t0 = Instant::now();
    let mut found = 0;
    for name in &test {
        if fib.lpm(name).is_some() {
            found += 1;
        }
    }
    let lookup_time = t0.elapsed();
    eprintln!(
        "looked up {} names ({} found) in {}ms",
        test.len(),
        found,
        lookup_time.as_millis()
    );

    let false_positives = (!args.no_verify).then(|| {
        test.iter()
            .filter(|name| {
                let expected = reference.lpm(name);
                match (fib.lpm(name), expected) {
                    (None, None) => false,
                    (Some(got), Some(expected)) => {
                        got.iter().collect::<Vec<_>>()
                            != expected.iter().collect::<Vec<_>>()
                    }
                    _ => true,
                }
            })
            .count()
    });

    let report = Report {
        config,
        hashed: args.hashed,
        loaded: load.len(),
        load_millis,
        tested: test.len(),
        lookup_millis: lookup_time.as_millis(),
        nanos_per_lookup: if test.is_empty() {
            0.0
        } else {
            lookup_time.as_nanos() as f64 / test.len() as f64
        },
        false_positives,
        stats: fib.stats(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
