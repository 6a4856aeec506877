use clap::{error::ErrorKind as ClapErrorKind, Parser};
use std::{path::PathBuf, process};
use tracing_subscriber::EnvFilter;
use transposer_core::{
    tools::locate::install_guidance, AppConfig, Pipeline, Progress, ResolvedToolSet, ToolKind,
    TransformRequest,
};

#[derive(Parser)]
#[command(name = "transposer")]
#[command(about = "Download audio and transpose, time-stretch or re-tempo it", long_about = None)]
#[command(version)]
struct Cli {
    /// Source URL (anything yt-dlp understands)
    #[arg(required_unless_present = "check_tools")]
    url: Option<String>,

    /// Pitch shift in semitones, e.g. -2 or 3
    #[arg(allow_negative_numbers = true, required_unless_present = "check_tools")]
    semitones: Option<i32>,

    /// Output directory (defaults to the remembered one, then Downloads)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Tempo change in percent, pitch preserved
    #[arg(long, allow_negative_numbers = true)]
    tempo: Option<f64>,

    /// Rate change in percent, pitch follows
    #[arg(long, allow_negative_numbers = true)]
    rate: Option<f64>,

    /// Absolute target BPM
    #[arg(long)]
    bpm: Option<f64>,

    /// Save --output as the default output directory
    #[arg(long, requires = "output")]
    remember_output: bool,

    /// Report where each external tool was found and exit
    #[arg(long)]
    check_tools: bool,

    /// Only print the resulting path
    #[arg(short, long)]
    quiet: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            eprintln!("Example: transposer https://youtu.be/xxxx -2");
            process::exit(1);
        }
    };

    init_tracing(cli.verbose);

    let result = if cli.check_tools {
        handle_check_tools()
    } else {
        handle_run(cli)
    };

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let (Some(url), Some(semitones)) = (cli.url, cli.semitones) else {
        return Err("usage: transposer <url> <semitones>".into());
    };

    let mut config = AppConfig::load();
    if cli.remember_output {
        config.output_dir = cli.output.clone();
        config.save()?;
    }

    let request = TransformRequest {
        source_url: url,
        semitones: f64::from(semitones),
        tempo_percent: cli.tempo,
        rate_percent: cli.rate,
        target_bpm: cli.bpm,
        output_dir: cli.output.or(config.output_dir),
    };

    if !cli.quiet {
        eprintln!("🎵 Transposer");
        eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        eprintln!("Source:    {}", request.source_url);
        eprintln!("Semitones: {:+}", semitones);
        eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let quiet = cli.quiet;
    let sink = move |p: Progress| {
        if !quiet {
            eprintln!("[{:>3}%] {}", p.percent, p.message);
        }
    };

    let path = Pipeline::system().run(&request, &sink)?;

    if quiet {
        println!("{}", path.display());
    } else {
        eprintln!();
        eprintln!("✅ Completed: {}", path.display());
    }
    Ok(())
}

fn handle_check_tools() -> Result<(), Box<dyn std::error::Error>> {
    let tools = ResolvedToolSet::resolve();
    let mut missing = false;

    eprintln!("🔧 External tools");
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for tool in ToolKind::ALL {
        match tools.get(tool) {
            Some(p) => eprintln!("  [OK]      {:<13} {}", tool.to_string(), p.display()),
            None => {
                missing = true;
                eprintln!("  [MISSING] {}", tool);
                for line in install_guidance(tool).lines() {
                    eprintln!("            {}", line);
                }
            }
        }
    }

    if missing {
        return Err("some tools are missing".into());
    }
    Ok(())
}
