#![cfg(feature = "cli")]

use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use ansi_term::Colour;
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use name_fib::errors::FibError;
use name_fib::fib::config::{BackendKind, FibConfig};
use name_fib::fib::{Fib, FibBackend};
use name_fib::{Bitmap, Name};

const HISTORY_FILE: &str = "/tmp/name-fib-history.txt";

// The port capacity for backends without a fixed number of ports.
const DEFAULT_PORTS: usize = 128;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// CSV file with a `name,ports` header and one route per line. Ports
    /// are separated by spaces.
    routes: PathBuf,

    /// The FIB backend to load the routes into
    #[arg(short, long, default_value_t = BackendKind::Patricia)]
    backend: BackendKind,

    /// JSON file with the backend configuration. Overrides --backend.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the hash keys of the bloom filter backends
    #[arg(short, long)]
    seed: Option<u64>,

    /// Look up hashed names
    #[arg(long, default_value_t = false)]
    hashed: bool,
}

fn load_config(args: &Cli) -> Result<FibConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => serde_json::from_reader(File::open(path)?)?,
        None => FibConfig::default_for(args.backend),
    };
    if let Some(seed) = args.seed {
        config.set_seed(seed);
    }
    config.validate()?;
    Ok(config)
}

fn parse_ports(field: &str, ports: usize) -> Result<Bitmap, FibError> {
    let mut egress = Bitmap::new(ports);
    for port in field.split_whitespace() {
        let port = port.parse::<usize>().map_err(|_| {
            FibError::InvalidConfig("ports must be decimal numbers")
        })?;
        if port >= ports {
            return Err(FibError::PortOutOfRange { port, ports });
        }
        egress.set(port);
    }
    Ok(egress)
}

fn parse_name(s: &str, hashed: bool) -> Result<Name, FibError> {
    let name = s.parse::<Name>()?;
    Ok(if hashed { name.hashed() } else { name })
}

fn load_routes(
    args: &Cli,
    ports: usize,
) -> Result<Vec<(Name, Bitmap)>, Box<dyn Error>> {
    let mut routes = vec![];
    let file = File::open(&args.routes)?;
    let mut rdr = csv::Reader::from_reader(file);
    for result in rdr.records() {
        let record = result?;
        let (Some(name), Some(egress)) = (record.get(0), record.get(1)) else {
            return Err(From::from(format!(
                "expected two fields in {:?}",
                record
            )));
        };
        routes.push((
            parse_name(name.trim(), args.hashed)?,
            parse_ports(egress, ports)?,
        ));
    }
    Ok(routes)
}

fn lookup(fib: &FibBackend, line: &str, hashed: bool) {
    let name = match parse_name(line, hashed) {
        Ok(name) => name,
        Err(err) => {
            println!("{}", Colour::Red.paint(err.to_string()));
            return;
        }
    };

    let start = Instant::now();
    let found = fib.lpm(&name);
    let elapsed = start.elapsed();
    match found {
        Some(egress) => println!(
            "{} {} ({} ns)",
            Colour::Green.paint("match:"),
            egress,
            elapsed.as_nanos()
        ),
        None => println!(
            "{} ({} ns)",
            Colour::Yellow.paint("no match"),
            elapsed.as_nanos()
        ),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    let config = load_config(&args)?;
    let ports = config.ports().unwrap_or(DEFAULT_PORTS);
    let mut fib = config.build()?;

    let routes = load_routes(&args, ports)?;
    println!("finished loading {} routes...", routes.len());

    let start = Instant::now();
    for (name, egress) in &routes {
        if !fib.insert(name, egress) {
            println!(
                "{}",
                Colour::Yellow.paint(format!("Warning: {} has no ports", name))
            );
        }
    }
    println!(
        "finished building {} FIB in {} msecs...",
        fib.kind(),
        start.elapsed().as_millis()
    );

    let mut rl = DefaultEditor::new()?;
    if rl.load_history(HISTORY_FILE).is_err() {
        println!("No previous history.");
    }
    loop {
        let readline = rl.readline("(name-fib)> ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;
                match line {
                    "s" => println!("{}", serde_json::to_string_pretty(&fib.stats())?),
                    "c" => println!("{}", serde_json::to_string_pretty(&config)?),
                    "q" => break,
                    _ => lookup(&fib, line, args.hashed),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(_err) => {
                println!("Error: Can't parse the command");
                continue;
            }
        }
    }
    rl.save_history(HISTORY_FILE)?;
    Ok(())
}
