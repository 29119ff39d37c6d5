use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use alnx_core::formats::read_alignment_file;
use alnx_core::{
    to_cfa, to_fasta, to_fasta_ungapped, to_xma, AlignmentArray, Background, ColumnNumber,
    AMINO_GAP,
};

#[derive(Parser)]
#[command(name = "alnx")]
#[command(about = "AlnX - alignment array toolkit for protein MSAs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show alignment dimensions and column composition
    Info {
        /// Input alignment (FASTA/A2M/CFA, optionally gzipped)
        input: PathBuf,
    },

    /// Convert between FASTA, CFA and XMA encodings
    Convert {
        /// Input alignment
        #[arg(short, long)]
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Output format (fasta, cfa, xma); inferred from the extension when omitted
        #[arg(short, long)]
        format: Option<String>,

        /// Drop gaps and emit full-length upper-case sequences (fasta only)
        #[arg(long)]
        ungapped: bool,
    },

    /// Redefine high-gap column runs as insertions
    Trim {
        /// Input alignment
        #[arg(short, long)]
        input: PathBuf,

        /// Output CFA file
        #[arg(short, long)]
        output: PathBuf,

        /// Gap fraction above which a column becomes insertion material
        #[arg(short, long, default_value = "0.5")]
        gap: f64,
    },

    /// Per-position statistics over the position columns
    Stats {
        /// Input alignment
        input: PathBuf,

        /// Statistic to compute (gaps, entropy, nats, bits, kl, js, consensus)
        #[arg(short, long, default_value = "entropy")]
        what: String,

        /// Pseudocount added to every frequency cell
        #[arg(short, long, default_value = "0")]
        pseudocount: f64,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Info { input } => info(&input),
        Commands::Convert {
            input,
            output,
            format,
            ungapped,
        } => convert(&input, &output, format.as_deref(), ungapped),
        Commands::Trim { input, output, gap } => trim(&input, &output, gap),
        Commands::Stats {
            input,
            what,
            pseudocount,
            json,
        } => stats(&input, &what, pseudocount, json),
    }
}

fn load(input: &Path) -> Result<(Vec<String>, AlignmentArray)> {
    read_alignment_file(input).with_context(|| format!("reading {}", input.display()))
}

fn info(input: &Path) -> Result<()> {
    let (names, array) = load(input)?;
    let mask = array.is_position_column();
    let positions = mask.iter().filter(|&&p| p).count();

    println!("sequences : {}", names.len());
    println!("columns   : {}", array.n_columns());
    println!("positions : {}", positions);
    println!("insertions: {}", array.n_columns() - positions);
    if array.is_featurized() {
        println!("features  : {}", array.n_features());
    }
    Ok(())
}

fn convert(input: &Path, output: &Path, format: Option<&str>, ungapped: bool) -> Result<()> {
    let (names, array) = load(input)?;
    let format = match format {
        Some(f) => f.to_lowercase(),
        None => output
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "cfa".to_string()),
    };

    let file = File::create(output).with_context(|| format!("creating {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    match format.as_str() {
        "fasta" | "fa" if ungapped => to_fasta_ungapped(&names, &array, &mut writer)?,
        "fasta" | "fa" => to_fasta(&names, &array, &mut writer)?,
        "cfa" => to_cfa(&names, &array, &mut writer)?,
        "xma" | "cma" | "mma" => {
            let head = input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "alnx".to_string());
            to_xma(&names, &array, &head, &mut writer)?;
        }
        other => bail!("unrecognized output format '{}'", other),
    }
    writer.flush()?;
    log::info!("wrote {} sequences to {}", names.len(), output.display());
    Ok(())
}

fn trim(input: &Path, output: &Path, gap: f64) -> Result<()> {
    let (names, array) = load(input)?;
    let before = array.is_position_column().iter().filter(|&&p| p).count();
    let edited = array.define_insertions(gap)?;
    let after = edited.is_position_column().iter().filter(|&&p| p).count();
    log::info!("{} -> {} positions at gap threshold {}", before, after, gap);

    let file = File::create(output).with_context(|| format!("creating {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    to_cfa(&names, &edited, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn stats(input: &Path, what: &str, pseudocount: f64, json: bool) -> Result<()> {
    let (_, array) = load(input)?;
    let positions = array.to_position_array()?;
    let background = Background::blosum62();

    let values: Vec<f64> = match what {
        "gaps" => positions.gaps(),
        "entropy" => positions.entropy(AMINO_GAP, pseudocount),
        "nats" => positions.nats(AMINO_GAP, pseudocount),
        "bits" => positions.bits(AMINO_GAP, pseudocount),
        "kl" => positions.kldivergence(None, &background)?,
        "js" => positions.jsdivergence(None, &background)?,
        "consensus" => {
            let consensus = positions.consensus(false, &background);
            if json {
                println!("{}", serde_json::json!({ "consensus": consensus }));
            } else {
                println!("{}", consensus);
            }
            return Ok(());
        }
        other => bail!("unrecognized statistic '{}'", other),
    };

    let numbers: Vec<u32> = array
        .column_numbers()
        .into_iter()
        .filter_map(|n| match n {
            ColumnNumber::Position(k) => Some(k),
            ColumnNumber::Insertion(_) => None,
        })
        .collect();

    if json {
        let rows: Vec<serde_json::Value> = numbers
            .iter()
            .zip(&values)
            .map(|(position, value)| serde_json::json!({ "position": position, "value": value }))
            .collect();
        println!("{}", serde_json::Value::Array(rows));
    } else {
        for (position, value) in numbers.iter().zip(&values) {
            println!("{}\t{:.6}", position, value);
        }
    }
    Ok(())
}
