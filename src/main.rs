use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use jsonrel::{
    ConversionConfig, Database, ExecutionOptions, JsonSource, PostgresExecutor, SchemaBuilder,
    execute_database,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "jsonrel", version)]
#[command(about = "Convert a JSON document into relational tables and rows")]
struct Cli {
    /// JSON file to convert, `-` reads stdin
    #[arg(default_value = "-")]
    input: String,

    /// Name of the top-level table (defaults to the input file stem)
    #[arg(long)]
    root: Option<String>,

    /// SQL schema every table is created in
    #[arg(long, default_value = "public")]
    schema: String,

    /// JSON file with conversion settings
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Sql)]
    format: OutputFormat,

    /// Fail when a column mixes numbers, booleans and strings
    #[arg(long)]
    strict_types: bool,

    /// Omit REFERENCES constraints on foreign key columns
    #[arg(long)]
    no_foreign_keys: bool,

    /// Longest VARCHAR before a column becomes TEXT
    #[arg(long)]
    max_varchar: Option<u32>,

    /// Name of the generated primary key column
    #[arg(long)]
    primary_key: Option<String>,

    /// Run the statements instead of printing them
    #[arg(long)]
    execute: bool,

    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Drop the target schema (CASCADE) before creating tables
    #[arg(long)]
    drop_schema: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// CREATE TABLE statements followed by literal INSERTs
    Sql,
    /// The converted tables and records as JSON
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;

    let source = JsonSource::from_arg(&cli.input);
    let root_name = cli
        .root
        .clone()
        .or_else(|| source.name_hint())
        .unwrap_or_else(|| "root".to_string());

    let value = source
        .load()
        .with_context(|| format!("Failed to load JSON from '{}'", cli.input))?;
    let db = SchemaBuilder::with_config(config)
        .convert(&root_name, &value, &cli.schema)
        .context("Conversion failed")?;

    for widening in db.widenings() {
        eprintln!(
            "warning: {}.{} mixes {} and {}, stored as {}",
            widening.table, widening.column, widening.from, widening.with, widening.to
        );
    }

    if cli.execute {
        run(&cli, &db).await
    } else {
        print_database(&db, cli.format)
    }
}

fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ConversionConfig::default(),
    };

    if cli.strict_types {
        config = config.strict_types(true);
    }
    if cli.no_foreign_keys {
        config = config.foreign_key_constraints(false);
    }
    if let Some(max) = cli.max_varchar {
        config = config.max_varchar_length(max);
    }
    if let Some(pk) = &cli.primary_key {
        config = config.primary_key(pk);
    }

    Ok(config)
}

fn load_config(path: &Path) -> Result<ConversionConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config '{}'", path.display()))?;
    ConversionConfig::from_json(&text)
        .with_context(|| format!("Invalid config '{}'", path.display()))
}

fn print_database(db: &Database, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Sql => println!("{}", db.diagnostic_script()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(db)?),
    }
    Ok(())
}

async fn run(cli: &Cli, db: &Database) -> Result<()> {
    let url = cli
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow!("--execute needs --database-url or DATABASE_URL"))?;

    let mut executor = PostgresExecutor::connect(url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    let options = ExecutionOptions {
        drop_schema: cli.drop_schema,
        create_schema: true,
    };
    let report = execute_database(db, &mut executor, &options).await;

    for failure in report.failures() {
        eprintln!(
            "error: {} ({})",
            failure.sql,
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!(
        "Executed {} statements, inserted {} rows",
        report.statements.len(),
        report.rows_inserted()
    );

    if !report.is_success() {
        bail!("{} statements failed", report.failures().count());
    }
    Ok(())
}
