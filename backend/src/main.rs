//! couponstats CLI - Coupon redemption reports from CSV or Excel extracts
//!
//! # Commands
//!
//! ```bash
//! couponstats inspect extract.csv                      # Stores, coupons, date range
//! couponstats report extract.csv --keywords "tm, dormant" --output-dir out/
//! couponstats serve --port 3000                        # Start HTTP server
//! couponstats example-config                           # Print the default config
//! ```

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use couponstats::{
    build_report, export, load_dataset_file, parse_keywords, port_from_env, FilterCriteria,
    ReportConfig,
};
use std::fs;
use std::path::{Path, PathBuf};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "couponstats")]
#[command(about = "Filter, cross-tab and chart coupon redemption extracts", long_about = None)]
struct Cli {
    /// JSON config file (default: $COUPONSTATS_CONFIG, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what an extract contains
    Inspect {
        /// Input extract (CSV, XLSX or XLS)
        input: PathBuf,
    },

    /// Filter an extract and produce the report tables
    Report {
        /// Input extract (CSV, XLSX or XLS)
        input: PathBuf,

        /// Store names to keep, comma-separated (default: all)
        #[arg(short, long)]
        stores: Option<String>,

        /// Keep coupons containing any of these comma-separated keywords
        #[arg(short, long, conflicts_with = "coupons")]
        keywords: Option<String>,

        /// Keep exactly these comma-separated coupon names
        #[arg(long)]
        coupons: Option<String>,

        /// First sale date, YYYY-MM-DD (default: earliest in the extract)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last sale date, YYYY-MM-DD (default: latest in the extract)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Write the CSV tables and layout.json here instead of printing JSON
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: $COUPONSTATS_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the default configuration as JSON
    ExampleConfig,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Inspect { input } => cmd_inspect(&input, cli.config.as_deref()),

        Commands::Report {
            input,
            stores,
            keywords,
            coupons,
            from,
            to,
            output_dir,
        } => cmd_report(
            &input,
            cli.config.as_deref(),
            ReportArgs { stores, keywords, coupons, from, to },
            output_dir.as_deref(),
        ),

        Commands::Serve { port } => cmd_serve(port, cli.config.as_deref()).await,

        Commands::ExampleConfig => cmd_example_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<ReportConfig, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(p) => ReportConfig::from_file(p)?,
        None => ReportConfig::from_env()?,
    })
}

fn cmd_inspect(input: &Path, config: Option<&Path>) -> CliResult {
    let config = load_config(config)?;
    let table = load_dataset_file(input, &config)?;
    let records = &table.records;

    println!("Format:    {}", table.format);
    if let Some(encoding) = &table.encoding {
        println!("Encoding:  {}", encoding);
    }
    if let Some(delimiter) = table.delimiter {
        println!("Delimiter: '{}'", format_delimiter(delimiter));
    }
    println!("Columns:   {}", table.headers.join(", "));
    println!("Records:   {}", records.len());
    println!("Quantity:  {}", records.total_quantity());
    match records.date_bounds() {
        Some((start, end)) => println!("Dates:     {} .. {}", start, end),
        None => println!("Dates:     -"),
    }
    println!("Stores ({}):", records.stores().len());
    for store in records.stores() {
        println!("   {}", store);
    }
    println!("Coupons ({}):", records.coupons().len());
    for coupon in records.coupons() {
        println!("   {}", coupon);
    }
    Ok(())
}

struct ReportArgs {
    stores: Option<String>,
    keywords: Option<String>,
    coupons: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl ReportArgs {
    fn criteria(self, covering: FilterCriteria, config: &ReportConfig) -> FilterCriteria {
        let mut criteria = covering;
        if let Some(from) = self.from {
            criteria.date_start = from;
        }
        if let Some(to) = self.to {
            criteria.date_end = to;
        }
        if let Some(stores) = self.stores {
            criteria = criteria.with_stores(split_list(&stores));
        }
        match (self.coupons, self.keywords) {
            (Some(coupons), _) => criteria.with_coupons(split_list(&coupons)),
            (None, Some(keywords)) => criteria.with_keywords(parse_keywords(&keywords)),
            (None, None) => criteria.with_keywords(&config.default_keywords),
        }
    }
}

fn cmd_report(
    input: &Path,
    config: Option<&Path>,
    args: ReportArgs,
    output_dir: Option<&Path>,
) -> CliResult {
    let config = load_config(config)?;
    let table = load_dataset_file(input, &config)?;
    let criteria = args.criteria(FilterCriteria::covering(&table.records), &config);

    let report = build_report(&table.records, &criteria, &config)?;
    if report.is_empty() {
        eprintln!("No records match the selected filters");
    }

    match output_dir {
        Some(dir) => {
            let tables = export::report_tables(&report, &config.columns);
            for path in export::write_all(&tables, dir)? {
                eprintln!("   Saved: {}", path.display());
            }
            let layout_path = dir.join("layout.json");
            fs::write(&layout_path, serde_json::to_string_pretty(&report.layout)?)?;
            eprintln!("   Saved: {}", layout_path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

async fn cmd_serve(port: Option<u16>, config: Option<&Path>) -> CliResult {
    let config = load_config(config)?;
    let port = port.unwrap_or_else(port_from_env);
    couponstats::server::start_server(port, config).await?;
    Ok(())
}

fn cmd_example_config() -> CliResult {
    println!("{}", ReportConfig::default().to_json()?);
    Ok(())
}

/// Comma-separated names, trimmed, blanks dropped.
fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
