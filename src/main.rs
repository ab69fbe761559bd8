//! Presburger Command Line Interface
//!
//! Usage:
//!   presburger [OPTIONS] <COMMAND>
//!   presburger --help
//!
//! Examples:
//!   presburger dump rel.json                  # Print the constraint tableaux
//!   presburger sample rel.json                # Find an integer point
//!   presburger intersect a.json b.json -o c.json
//!   presburger --max-steps 10000 equal a.json b.json

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use presburger::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Presburger - integer relations over affine constraints
#[derive(Parser, Debug)]
#[command(name = "presburger")]
#[command(author = "Presburger Contributors")]
#[command(version)]
#[command(about = "Inspect, sample, intersect and compare integer relations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Limit the integer sampler to this many search steps
    #[arg(long, global = true, value_name = "N")]
    max_steps: Option<u64>,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress warnings)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a relation's space and constraints
    Dump {
        /// Relation file (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
    /// Find an integer point of a relation, or report that it is empty
    Sample {
        /// Relation file (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
    /// Intersect two relations
    Intersect {
        /// First relation file (JSON)
        #[arg(value_name = "A")]
        lhs: PathBuf,
        /// Second relation file (JSON)
        #[arg(value_name = "B")]
        rhs: PathBuf,
        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Check whether two relations contain the same integer points
    Equal {
        /// First relation file (JSON)
        #[arg(value_name = "A")]
        lhs: PathBuf,
        /// Second relation file (JSON)
        #[arg(value_name = "B")]
        rhs: PathBuf,
    },
}

/// On-disk form of a relation: coefficient rows over
/// `[domain | range | symbols | locals | const]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RelationFile {
    domain: usize,
    range: usize,
    #[serde(default)]
    symbols: usize,
    #[serde(default)]
    locals: usize,
    #[serde(default)]
    inequalities: Vec<Vec<i64>>,
    #[serde(default)]
    equalities: Vec<Vec<i64>>,
}

impl RelationFile {
    fn to_relation(&self) -> PresburgerResult<IntegerRelation> {
        if self.symbols == 0 && self.locals == 0 {
            return IntegerRelation::from_coefficients::<i64, _>(&self.inequalities[..], &self.equalities[..], self.domain, self.range);
        }
        let space = PresburgerSpace::new(self.domain, self.range, self.symbols, self.locals);
        let mut relation = IntegerRelation::new(
            self.inequalities.len(),
            self.equalities.len(),
            space.num_cols(),
            space,
        );
        for row in &self.inequalities {
            relation.add_inequality(row)?;
        }
        for row in &self.equalities {
            relation.add_equality(row)?;
        }
        Ok(relation)
    }

    fn from_relation(relation: &IntegerRelation) -> PresburgerResult<Self> {
        let space = relation.space();
        Ok(Self {
            domain: space.num_domain_vars(),
            range: space.num_range_vars(),
            symbols: space.num_symbol_vars(),
            locals: space.num_local_vars(),
            inequalities: (0..relation.num_inequalities())
                .map(|r| relation.inequality64(r))
                .collect::<PresburgerResult<_>>()?,
            equalities: (0..relation.num_equalities())
                .map(|r| relation.equality64(r))
                .collect::<PresburgerResult<_>>()?,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    info!("Presburger v{}", presburger::VERSION);

    let mut config = SamplerConfig::default();
    if let Some(steps) = cli.max_steps {
        config = config.with_max_steps(steps);
    }
    let sampler = OmegaSampler::new(config);
    debug!("Sampler config: {:?}", sampler.config());

    match &cli.command {
        Command::Dump { input } => {
            let relation = read_relation(input)?;
            print!("{}", relation);
        }
        Command::Sample { input } => {
            let relation = read_relation(input)?;
            let outcome = sampler
                .sample(&relation)
                .with_context(|| format!("Failed to sample relation from {:?}", input))?;
            match outcome.point() {
                Some(point) => {
                    let values: Vec<String> = point.iter().map(|v| v.to_string()).collect();
                    println!("[{}]", values.join(", "));
                }
                None => println!("empty"),
            }
        }
        Command::Intersect { lhs, rhs, output } => {
            let a = read_relation(lhs)?;
            let b = read_relation(rhs)?;
            let result = a
                .intersect(&b)
                .with_context(|| format!("Failed to intersect {:?} with {:?}", lhs, rhs))?;
            let file = RelationFile::from_relation(&result).context("Intersection does not fit in 64-bit coefficients")?;
            let json = serde_json::to_string_pretty(&file)?;
            write_output(output, &json)?;
        }
        Command::Equal { lhs, rhs } => {
            let a = read_relation(lhs)?;
            let b = read_relation(rhs)?;
            let equal = a
                .is_equal_with(&b, &sampler)
                .with_context(|| format!("Failed to compare {:?} with {:?}", lhs, rhs))?;
            println!("{}", equal);
        }
    }

    Ok(())
}

fn read_relation(path: &Path) -> Result<IntegerRelation> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {:?}", path))?;
    let file: RelationFile = serde_json::from_str(&source)
        .with_context(|| format!("Failed to parse relation file: {:?}", path))?;
    debug!("Loaded {:?}", file);
    file.to_relation()
        .with_context(|| format!("Invalid relation in {:?}", path))
}

fn write_output(path: &Option<PathBuf>, content: &str) -> Result<()> {
    match path {
        Some(p) => {
            fs::write(p, content)
                .with_context(|| format!("Failed to write output file: {:?}", p))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
