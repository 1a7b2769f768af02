// Clippy allows
#![allow(clippy::too_many_arguments)]

//! catzoom: multi-category density summaries
//!
//! Usage: catzoom <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use catzoom::buffers::{input_buffer_size, sink_buffer_size};
use catzoom::config::{PyramidConfig, DEFAULT_OTHER_CATEGORY};
use catzoom::encoder::{BlockEncoder, MultiCatCountEncoder, RawCountEncoder, DEFAULT_ENCODER_LEN};
use catzoom::error::{Result, SummaryError};
use catzoom::manifest::{property_id, Manifest, MANIFEST_FILE_NAME};
use catzoom::output::{read_summary_file, CountTableWriter};
use catzoom::parallel::{build_partitioned, partition_by_chromosome};
use catzoom::pyramid::PyramidDriver;
use catzoom::reader::RecordReader;
use catzoom::sink::{prepare_output_dir, DirectorySinkFactory, SUMMARY_FILE_PREFIX};

#[derive(Parser)]
#[command(name = "catzoom")]
#[command(version)]
#[command(about = "Multi-category density summary pyramids for sorted genomic records", long_about = None)]
struct Cli {
    /// Number of threads to use (default: number of CPUs)
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build summary pyramids from a chromosome\tposition\tvalue file
    Build {
        /// Input data file (no header, chromosome-grouped, position-sorted)
        input: PathBuf,

        /// Width of the finest zoom level
        block_size_start: u64,

        /// Multiplier between consecutive zoom levels (> 1)
        block_size_incr_factor: u64,

        /// Largest zoom level width
        block_size_max: u64,

        /// Categories, ';' separated (output order)
        categories: String,

        /// Base directory for the manifest and the summary directory
        #[arg(long, default_value = ".")]
        base_dir: PathBuf,

        /// Summary directory (default: <base-dir>/Summaries)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Category label that collects unmatched values
        #[arg(long, default_value = DEFAULT_OTHER_CATEGORY)]
        other: String,

        /// Drop unmatched values even if the catch-all label is listed
        #[arg(long)]
        no_other: bool,

        /// Base-64 digits per category count
        #[arg(long, default_value_t = DEFAULT_ENCODER_LEN as u64, value_parser = clap::value_parser!(u64).range(1..=10))]
        encoder_len: u64,

        /// Keep existing summary files in the output directory
        #[arg(long)]
        keep_existing: bool,

        /// Do not write the Summ.cnf manifest
        #[arg(long)]
        no_manifest: bool,

        /// Load the input, split it by chromosome and build in parallel
        #[arg(long)]
        partitioned: bool,

        /// Use smaller I/O buffers
        #[arg(long)]
        low_memory: bool,

        /// Print build statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Print a summary file as a table of block counts
    Decode {
        /// Summary file (Summ_<chrom>_<width>)
        #[arg(short, long)]
        summary: PathBuf,

        /// Categories, ';' separated, as used for the build
        #[arg(short, long)]
        categories: String,

        /// Base-64 digits per category count
        #[arg(long, default_value_t = DEFAULT_ENCODER_LEN as u64, value_parser = clap::value_parser!(u64).range(1..=10))]
        encoder_len: u64,

        /// Blocks hold little-endian u32 counts instead of base-64 digits
        #[arg(long)]
        raw: bool,

        /// Chromosome name (default: taken from the file name)
        #[arg(long)]
        chrom: Option<String>,

        /// Block width (default: taken from the file name)
        #[arg(short = 'w', long)]
        block_width: Option<u64>,

        /// Omit blocks with no counts
        #[arg(long)]
        skip_empty: bool,
    },

    /// Print the zoom level widths of a configuration
    Levels {
        block_size_start: u64,
        block_size_incr_factor: u64,
        block_size_max: u64,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Configure thread pool if --threads specified
    if let Some(n) = cli.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
        {
            eprintln!("Error: failed to initialize thread pool: {}", e);
            process::exit(1);
        }
    }

    let result = match cli.command {
        Commands::Build {
            input,
            block_size_start,
            block_size_incr_factor,
            block_size_max,
            categories,
            base_dir,
            output_dir,
            other,
            no_other,
            encoder_len,
            keep_existing,
            no_manifest,
            partitioned,
            low_memory,
            stats,
        } => run_build(
            input,
            PyramidConfig::new(block_size_start, block_size_incr_factor, block_size_max)
                .with_category_list(&categories)
                .with_other_category(if no_other { None } else { Some(other) }),
            base_dir,
            output_dir,
            encoder_len as usize,
            keep_existing,
            no_manifest,
            partitioned,
            low_memory,
            stats,
        ),

        Commands::Decode {
            summary,
            categories,
            encoder_len,
            raw,
            chrom,
            block_width,
            skip_empty,
        } => run_decode(
            summary,
            categories,
            encoder_len as usize,
            raw,
            chrom,
            block_width,
            skip_empty,
        ),

        Commands::Levels {
            block_size_start,
            block_size_incr_factor,
            block_size_max,
        } => run_levels(block_size_start, block_size_incr_factor, block_size_max),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_build(
    input: PathBuf,
    config: PyramidConfig,
    base_dir: PathBuf,
    output_dir: Option<PathBuf>,
    encoder_len: usize,
    keep_existing: bool,
    no_manifest: bool,
    partitioned: bool,
    low_memory: bool,
    stats: bool,
) -> Result<()> {
    config.validate()?;
    log::info!("Categories: {:?}", config.categories);

    let output_dir = output_dir.unwrap_or_else(|| base_dir.join("Summaries"));
    if keep_existing {
        std::fs::create_dir_all(&output_dir)?;
    } else {
        prepare_output_dir(&output_dir)?;
    }

    if !no_manifest {
        std::fs::create_dir_all(&base_dir)?;
        let manifest = Manifest::multi_cat_count(&config, &property_id(&input), encoder_len);
        manifest.write_file(base_dir.join(MANIFEST_FILE_NAME))?;
    }

    let encoder = MultiCatCountEncoder::new(config.categories.len(), encoder_len);
    let factory =
        DirectorySinkFactory::new(&output_dir).with_buffer_size(sink_buffer_size(low_memory));
    let file = std::fs::File::open(&input)?;
    let reader = RecordReader::with_capacity(file, input_buffer_size(low_memory));

    let result = if partitioned {
        let runs = partition_by_chromosome(reader.records())?;
        build_partitioned(&config, &runs, &factory, &encoder)?
    } else {
        PyramidDriver::new(&config, factory, encoder)?.run(reader)?
    };

    if stats {
        eprintln!("Summary build stats: {}", result);
    }

    Ok(())
}

/// Split `Summ_<chrom>_<width>` into its chromosome and width.
fn parse_summary_name(path: &Path) -> Option<(String, u64)> {
    let name = path.file_name()?.to_str()?;
    let rest = name.strip_prefix(SUMMARY_FILE_PREFIX)?;
    let (chrom, width) = rest.rsplit_once('_')?;
    Some((chrom.to_string(), width.parse().ok()?))
}

fn run_decode(
    summary: PathBuf,
    categories: String,
    encoder_len: usize,
    raw: bool,
    chrom: Option<String>,
    block_width: Option<u64>,
    skip_empty: bool,
) -> Result<()> {
    let labels: Vec<String> = categories.split(';').map(str::to_string).collect();
    let from_name = parse_summary_name(&summary);

    let chrom = chrom
        .or_else(|| from_name.as_ref().map(|(c, _)| c.clone()))
        .ok_or_else(|| {
            SummaryError::InvalidConfig(format!(
                "cannot infer chromosome from '{}'; pass --chrom",
                summary.display()
            ))
        })?;
    let block_width = block_width
        .or_else(|| from_name.as_ref().map(|(_, w)| *w))
        .ok_or_else(|| {
            SummaryError::InvalidConfig(format!(
                "cannot infer block width from '{}'; pass --block-width",
                summary.display()
            ))
        })?;

    let blocks = if raw {
        let decoder = RawCountEncoder::new(labels.len());
        read_summary_file(&summary, decoder.block_len(), &decoder)?
    } else {
        let decoder = MultiCatCountEncoder::new(labels.len(), encoder_len);
        read_summary_file(&summary, decoder.block_len(), &decoder)?
    };

    let stdout = io::stdout();
    let mut writer = CountTableWriter::new(stdout.lock());
    writer.write_header(&labels)?;
    writer.write_level(&chrom, block_width, &blocks, skip_empty)?;
    writer.flush()
}

fn run_levels(start: u64, factor: u64, max: u64) -> Result<()> {
    let config = PyramidConfig::new(start, factor, max).with_categories(["levels"]);
    config.validate()?;
    for width in config.level_widths() {
        println!("{}", width);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_summary_name() {
        assert_eq!(
            parse_summary_name(Path::new("out/Summ_chr1_20")),
            Some(("chr1".to_string(), 20))
        );
        assert_eq!(
            parse_summary_name(Path::new("Summ_Pf3D7_01_v3_640")),
            Some(("Pf3D7_01_v3".to_string(), 640))
        );
        assert_eq!(parse_summary_name(Path::new("other_file")), None);
        assert_eq!(parse_summary_name(Path::new("Summ_chr1_x")), None);
    }

    #[test]
    fn test_cli_parses_build() {
        let cli = Cli::parse_from([
            "catzoom", "build", "data.txt", "20", "2", "50000", "A;B;_other_", "--stats",
        ]);
        match cli.command {
            Commands::Build {
                block_size_start,
                categories,
                encoder_len,
                stats,
                ..
            } => {
                assert_eq!(block_size_start, 20);
                assert_eq!(categories, "A;B;_other_");
                assert_eq!(encoder_len, DEFAULT_ENCODER_LEN as u64);
                assert!(stats);
            }
            _ => panic!("expected build"),
        }
    }
}
