use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use sliderule_common::{Record, RecordAccessor, Value};
use sliderule_executor::{Analytic, GroupBy};
use sliderule_functions::default_registry;

#[derive(Parser)]
#[command(name = "sliderule")]
#[command(about = "sliderule - analytic window functions over JSON rows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run analytic functions and print every row with its results
    Analyze {
        /// JSON array of objects; read from stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Aggregator spec, e.g. "sum(v) partitionBy(cat) orderBy(v) rows(1, 0)"
        #[arg(short, long = "function", required = true)]
        functions: Vec<String>,
        /// Record fields to print before the results (default: all)
        #[arg(long)]
        show: Vec<String>,
    },
    /// Group rows and print one line per group
    GroupBy {
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Property to group by
        #[arg(short, long = "by", required = true)]
        by: Vec<String>,
        /// Aggregator spec without clauses, e.g. "Sum(v)"
        #[arg(short, long = "aggregate", required = true)]
        aggregates: Vec<String>,
        /// Add subtotal rows for each prefix of the group-by properties
        #[arg(long, conflicts_with = "cube")]
        rollup: bool,
        /// Add subtotal rows for every subset of the group-by properties
        #[arg(long)]
        cube: bool,
    },
    /// List the built-in function names
    Functions,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            functions,
            show,
        } => {
            let records = read_records(input.as_ref())?;
            analyze(&records, &functions, show)?;
        }
        Commands::GroupBy {
            input,
            by,
            aggregates,
            rollup,
            cube,
        } => {
            let records = read_records(input.as_ref())?;
            group_by(&records, by, aggregates, rollup, cube)?;
        }
        Commands::Functions => {
            for name in default_registry().names() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

fn read_records(input: Option<&PathBuf>) -> Result<Vec<serde_json::Value>> {
    let text = match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            text
        }
    };
    let parsed: serde_json::Value = serde_json::from_str(&text).context("Input is not valid JSON")?;
    match parsed {
        serde_json::Value::Array(records) => Ok(records),
        _ => bail!("Input must be a JSON array of objects"),
    }
}

fn field_names(records: &[serde_json::Value], show: Vec<String>) -> Vec<String> {
    if !show.is_empty() {
        return show;
    }
    records
        .first()
        .and_then(|r| r.as_object())
        .map(|object| object.keys().cloned().collect())
        .unwrap_or_default()
}

fn analyze(records: &[serde_json::Value], functions: &[String], show: Vec<String>) -> Result<()> {
    let specs: Vec<&str> = functions.iter().map(String::as_str).collect();
    let results = Analytic::from_env()
        .analyze_specs(records, &RecordAccessor, &specs)
        .context("Failed to run analytic functions")?;

    if results.is_empty() {
        println!("(0 rows)");
        return Ok(());
    }

    let fields = field_names(records, show);
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    let headers: Vec<&str> = fields.iter().chain(functions).map(String::as_str).collect();
    table.set_header(headers);

    for result in &results {
        let mut cells: Vec<String> = fields
            .iter()
            .map(|f| result.record().field(f).unwrap_or(Value::Null).to_string())
            .collect();
        cells.extend(result.values().iter().map(|v| v.to_string()));
        table.add_row(cells);
    }

    println!("{table}");
    println!("({} rows)", results.len());

    Ok(())
}

fn group_by(
    records: &[serde_json::Value],
    by: Vec<String>,
    aggregates: Vec<String>,
    rollup: bool,
    cube: bool,
) -> Result<()> {
    let mut builder = GroupBy::builder()
        .properties(by.iter().cloned())
        .aggregators(aggregates.iter().cloned());
    if rollup {
        builder = builder.rollup(by.iter().cloned());
    } else if cube {
        builder = builder.cube(by.iter().cloned());
    }
    let rows = builder
        .build()
        .context("Invalid group-by")?
        .group_by(records, &RecordAccessor)
        .context("Failed to group rows")?;

    if rows.is_empty() {
        println!("(0 rows)");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    let headers: Vec<&str> = by.iter().chain(&aggregates).map(String::as_str).collect();
    table.set_header(headers);

    for row in &rows {
        let mut cells: Vec<String> = (0..by.len())
            .map(|i| {
                if row.is_grouped_out(i) {
                    "(all)".to_string()
                } else {
                    row.property(i).map(ToString::to_string).unwrap_or_default()
                }
            })
            .collect();
        cells.extend(row.values().iter().map(|v| v.to_string()));
        table.add_row(cells);
    }

    println!("{table}");
    println!("({} rows)", rows.len());

    Ok(())
}
