//! Simple command that prints one or '-n count' snowflake IDs

use std::{io, io::Write, process::ExitCode};

use clap::Parser;
use snowflake::{Generator, Id};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "snowflake", about = "Prints snowflake IDs")]
struct Args {
    /// Number of IDs to print
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Worker ID to bind; derived from the network interfaces when omitted
    #[arg(short, long, allow_negative_numbers = true)]
    worker_id: Option<i64>,

    /// Use a standalone generator instead of the process-wide default
    #[arg(long, requires = "worker_id")]
    standalone: bool,

    /// Print the timestamp, worker ID and sequence of each ID
    #[arg(short, long)]
    decode: bool,
}

fn main() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let generator = match args.worker_id {
        Some(worker_id) if args.standalone => std::sync::Arc::new(Generator::new(worker_id)),
        Some(worker_id) => {
            snowflake::init(worker_id);
            snowflake::default_generator()
        }
        None => snowflake::default_generator(),
    };

    let mut buf = io::BufWriter::new(io::stdout());
    for _ in 0..args.count {
        let id = match generator.next() {
            Ok(id) => id,
            Err(err) => {
                buf.flush()?;
                eprintln!("Error: {}", err);
                return Ok(ExitCode::FAILURE);
            }
        };

        if args.decode {
            let e = Id::from(id);
            writeln!(
                buf,
                "{}\ttimestamp={}ms\tworker_id={}\tsequence={}",
                id,
                generator.time_of(id),
                e.worker_id(),
                e.sequence()
            )?;
        } else {
            writeln!(buf, "{}", id)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
