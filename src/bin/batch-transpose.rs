use clap::Parser;
use std::{path::PathBuf, process};
use tracing_subscriber::EnvFilter;
use transposer_core::{
    batch::{parse_batch_file, BatchLine},
    AppConfig, Pipeline, Progress, TransformRequest,
};

#[derive(Parser)]
#[command(name = "batch-transpose")]
#[command(about = "Run one transpose job per `<url> <semitones>` line of a file", long_about = None)]
#[command(version)]
struct Cli {
    /// Batch file
    #[arg(default_value = "urls.txt")]
    file: PathBuf,

    /// Output directory (defaults to the remembered one, then Downloads)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep going after a failed job instead of stopping the batch
    #[arg(short, long)]
    keep_going: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match handle_batch(cli) {
        Ok(0) => process::exit(0),
        Ok(_) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Returns the number of failed jobs.
fn handle_batch(cli: Cli) -> Result<usize, Box<dyn std::error::Error>> {
    let lines = parse_batch_file(&cli.file)?;
    let output_dir = cli.output.or(AppConfig::load().output_dir);
    let pipeline = Pipeline::system();

    let sink = |p: Progress| eprintln!("  [{:>3}%] {}", p.percent, p.message);

    let (mut done, mut failed, mut skipped) = (0usize, 0usize, 0usize);
    for (line_no, line) in lines {
        let entry = match line {
            BatchLine::Job(entry) => entry,
            BatchLine::Malformed { line, reason } => {
                skipped += 1;
                eprintln!("Skipping invalid line {line_no}: {line} ({reason})");
                continue;
            }
            BatchLine::Blank => continue,
        };

        eprintln!();
        eprintln!("Processing: {} ({:+} semitones)", entry.url, entry.semitones);

        let mut request = TransformRequest::new(entry.url, f64::from(entry.semitones));
        request.output_dir = output_dir.clone();

        match pipeline.run(&request, &sink) {
            Ok(path) => {
                done += 1;
                println!("{}", path.display());
            }
            Err(e) if cli.keep_going => {
                failed += 1;
                eprintln!("❌ line {line_no} failed: {e}");
            }
            Err(e) => return Err(format!("line {line_no}: {e}").into()),
        }
    }

    eprintln!();
    eprintln!("Done: {done} completed, {failed} failed, {skipped} skipped");
    Ok(failed)
}
