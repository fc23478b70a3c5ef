//! db2-dialect: inspect how the DB2 dialect renders things.
//!
//! # Usage
//!
//! ```bash
//! # Render a catalog type
//! db2-dialect type VARCHAR --length 40
//!
//! # Quote identifiers
//! db2-dialect quote user Order my_table
//!
//! # Driver connect arguments for a URL
//! db2-dialect connect-args 'db2://db2inst1:pw@dbhost:50000/SAMPLE'
//!
//! # CREATE statements from a JSON schema file
//! db2-dialect ddl schema.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use db2_dialect::prelude::*;
use db2_dialect::reserved;
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "db2-dialect")]
#[command(version)]
#[command(about = "Render DB2 SQL fragments, types and connect strings", long_about = None)]
#[command(after_help = "EXAMPLES:
    db2-dialect type DECIMAL --length 12 --scale 2
    db2-dialect select users -c id -c email --limit 10
    db2-dialect connect-args --resolve 'db2:///SAMPLE?UID=db2inst1'")]
struct Cli {
    /// Config file (defaults to <config dir>/db2-dialect/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use the base flag preset instead of the ibm_db driver preset
    #[arg(long, global = true)]
    base: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a catalog type name as column DDL
    Type {
        /// Catalog type name, e.g. VARCHAR or "LONG VARGRAPHIC"
        name: String,
        #[arg(short, long)]
        length: Option<u32>,
        #[arg(short, long)]
        scale: Option<u32>,
    },
    /// Quote identifiers the way DDL would
    Quote {
        #[arg(required = true)]
        identifiers: Vec<String>,
    },
    /// Check words against the reserved list
    Reserved { words: Vec<String> },
    /// Show driver connect arguments for a URL
    ConnectArgs {
        #[arg(env = "DB2_DIALECT_URL")]
        url: Option<String>,
        /// Expand catalog aliases through the config's data sources
        #[arg(short, long)]
        resolve: bool,
    },
    /// Print CREATE statements for a JSON schema file
    Ddl {
        file: PathBuf,
        /// Emit DROP statements instead
        #[arg(long)]
        drop: bool,
    },
    /// Render a simple SELECT
    Select {
        table: String,
        #[arg(short, long)]
        columns: Vec<String>,
        #[arg(short, long)]
        limit: Option<u64>,
        #[arg(long)]
        distinct: bool,
    },
    /// Print the dialect's capability flags
    Flags,
}

/// Objects read by the `ddl` command.
#[derive(Deserialize)]
struct SchemaFile {
    #[serde(default)]
    tables: Vec<Table>,
    #[serde(default)]
    indexes: Vec<Index>,
    #[serde(default)]
    sequences: Vec<Sequence>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => Config::load()?,
    };
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let driver = if cli.base {
        DriverVariant::Base
    } else {
        config.driver
    };
    let dialect = Db2Dialect::new(config.flags_for(driver), config.flavor);

    match &cli.command {
        Commands::Type {
            name,
            length,
            scale,
        } => {
            let ty = db2_dialect::types::from_catalog(name, *length, *scale);
            let rendered = dialect.type_compiler().process(&ty);
            match cli.format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({ "descriptor": ty, "ddl": rendered })
                ),
                OutputFormat::Text => println!("{}", rendered.green()),
            }
        }
        Commands::Quote { identifiers } => {
            let preparer = dialect.preparer();
            for ident in identifiers {
                let quoted = preparer.quote(ident);
                if preparer.requires_quotes(ident) {
                    println!("{} {}", ident.dimmed(), quoted.yellow());
                } else {
                    println!("{} {}", ident.dimmed(), quoted.white());
                }
            }
        }
        Commands::Reserved { words } => {
            if words.is_empty() {
                println!("{} reserved words", reserved::RESERVED_WORDS.len());
            }
            for w in words {
                if reserved::is_reserved(w) {
                    println!("{} {}", w.yellow(), "reserved".red());
                } else {
                    println!("{} {}", w.white(), "ok".green());
                }
            }
        }
        Commands::ConnectArgs { url, resolve } => {
            let url = url
                .clone()
                .or_else(|| config.default_url.clone())
                .context("no URL given; pass one, set DB2_DIALECT_URL or default_url")?;
            let args = if *resolve {
                config.resolve_connect_args(&url)?
            } else {
                dialect.create_connect_args(&url)?
            };
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&args)?),
                OutputFormat::Text => {
                    println!("{} {}", "dsn:".cyan(), args.dsn);
                    println!("{} {}", "uid:".cyan(), args.uid);
                    println!("{} {}", "pwd:".cyan(), "*".repeat(args.pwd.len()));
                }
            }
        }
        Commands::Ddl { file, drop } => {
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("reading {}", file.display()))?;
            let schema: SchemaFile = serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", file.display()))?;
            let ddl = dialect.ddl_compiler();
            if *drop {
                for ix in &schema.indexes {
                    println!("{};", ddl.drop_index(ix).trim_start());
                }
                for t in &schema.tables {
                    println!("{};", ddl.drop_table(t).trim_start());
                }
                for s in &schema.sequences {
                    println!("{};", ddl.drop_sequence(s));
                }
            } else {
                for s in &schema.sequences {
                    println!("{};", ddl.create_sequence(s));
                }
                for t in &schema.tables {
                    println!("{};", ddl.create_table(t).trim());
                }
                for ix in &schema.indexes {
                    println!("{};", ddl.create_index(ix));
                }
            }
        }
        Commands::Select {
            table,
            columns,
            limit,
            distinct,
        } => {
            let mut select = Select::new().from(FromItem::table(table.as_str()));
            for c in columns {
                select = select.column(Expr::column(c.as_str()));
            }
            if let Some(n) = limit {
                select = select.limit(*n);
            }
            if *distinct {
                select = select.distinct();
            }
            let sql = dialect.statement_compiler().select(&select);
            println!("{}", sql.white());
        }
        Commands::Flags => match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(dialect.flags())?),
            OutputFormat::Text => {
                let value = serde_json::to_value(dialect.flags())?;
                if let serde_json::Value::Object(map) = value {
                    for (k, v) in map {
                        println!("{:32} {}", k.cyan(), v);
                    }
                }
            }
        },
    }
    Ok(())
}
