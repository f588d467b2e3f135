use clap::error::ErrorKind;
use clap::Parser;
use peak_alloc::PeakAlloc;
use rmsk2gtf::options::{ParseOptions, SummaryOptions};
use rmsk2gtf::TeAnnotations;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

#[global_allocator]
static PEAK_ALLOC: PeakAlloc = PeakAlloc;

/// Convert RepeatMasker TE annotations into a Telescope-compatible GTF file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The RepeatMasker .out report, e.g. genome.fa.out
    input: PathBuf,

    /// The GTF file to write
    output: PathBuf,

    /// Also write the parsed loci as a tab-separated table to this path
    #[arg(long, value_name = "PATH")]
    table: Option<PathBuf>,

    /// The number of most frequent families to report
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// The tag prepended to each synthesized gene_id
    #[arg(long, default_value = "TE")]
    id_prefix: String,

    /// The text placed between the repeat name and its ordinal in locus_id
    #[arg(long, default_value = "{}")]
    locus_sep: String,

    /// Log more details to stderr (-v: info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            println!("{}", e);
            println!("Usage: rmsk2gtf genome.fa.out output.gtf");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = parse_cli();
    init_tracing(cli.verbose);

    let po = ParseOptions::new(cli.id_prefix.as_str(), cli.locus_sep.as_str());
    let so = SummaryOptions::new(cli.top);

    println!("Parsing RepeatMasker output: {}", cli.input.display());
    let start = Instant::now();
    let tes = TeAnnotations::from_rmsk_out(&cli.input, &po)?;
    info!("parsed RepeatMasker output in {:?}", start.elapsed());

    let summary = tes.summary(&so);
    println!("Found {} TE annotations", summary.n_records);
    println!("Found {} unique TE families", summary.n_families);
    println!("\nTop {} families:", so.top_n);
    for (family, count) in summary.top.iter() {
        println!("  {}: {}", family, count);
    }

    println!("\nWriting GTF to: {}", cli.output.display());
    let start = Instant::now();
    tes.write_gtf(&cli.output)?;
    info!("wrote GTF in {:?}", start.elapsed());

    if let Some(table) = &cli.table {
        println!("Writing locus table to: {}", table.display());
        tes.write_table(table)?;
    }

    println!("Done!");

    info!(
        "Peak memory usage was {:.3} MB",
        PEAK_ALLOC.peak_usage_as_mb()
    );
    Ok(())
}
