//! sparql-select: build and check SPARQL SELECT queries from the shell.
//!
//! # Usage
//!
//! ```bash
//! # Render a query document
//! sparql-select build friends.toml
//!
//! # Pretty print it
//! sparql-select build friends.toml --pretty
//!
//! # Classify a single token
//! sparql-select check "COUNT(?x) AS ?n" --accept variable,function-as
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use serde::Serialize;
use sparql_select::prelude::*;
use sparql_select::validator::BUILTIN_FUNCTIONS;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sparql-select")]
#[command(version)]
#[command(about = "Build SPARQL SELECT queries that are checked before they are printed", long_about = None)]
#[command(after_help = "EXAMPLES:
    sparql-select build query.toml --pretty
    sparql-select check 'foaf:name'
    sparql-select check 'COUNT' --accept prefix,function")]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a query from a TOML document and print it
    Build {
        /// Query document
        file: String,

        /// Pretty print the query
        #[arg(short, long)]
        pretty: bool,

        /// Leave out the PREFIX header
        #[arg(long)]
        no_prefixes: bool,

        /// Prefix file merged before the document's own prefixes
        /// [default: $SPARQL_SELECT_PREFIXES, else <config dir>/sparql-select/prefixes.toml]
        #[arg(long)]
        prefix_file: Option<String>,
    },
    /// Classify one expression token
    Check {
        /// The token to classify
        token: String,

        /// Accepted categories, comma separated
        #[arg(short, long, default_value = "variable,iri,prefixed-iri")]
        accept: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Show the category reference
    Categories,
}

#[derive(Serialize)]
struct CheckReport<'a> {
    token: &'a str,
    category: Category,
    variables: Vec<&'a str>,
    prefixes: Vec<&'a str>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Build {
            file,
            pretty,
            no_prefixes,
            prefix_file,
        } => build(file, *pretty, *no_prefixes, prefix_file.as_deref()),
        Commands::Check {
            token,
            accept,
            format,
        } => check(token, accept, *format),
        Commands::Categories => {
            show_categories();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "sparql_select=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build(file: &str, pretty: bool, no_prefixes: bool, prefix_file: Option<&str>) -> Result<()> {
    let defaults = match prefix_file {
        Some(path) => PrefixFile::load(path).with_context(|| format!("Failed to read prefix file '{}'", path))?,
        None => PrefixFile::discover()?,
    };

    let document = QueryDocument::load(file).with_context(|| format!("Failed to read '{}'", file))?;
    let query = document.build_with_prefixes(&defaults.prefixes)?;

    let sparql = query.render(!no_prefixes)?;
    if pretty {
        println!("{}", Formatter::new().format(&sparql));
    } else {
        println!("{}", sparql);
    }
    Ok(())
}

fn check(token: &str, accept: &str, format: OutputFormat) -> Result<()> {
    let accept: Accept = accept.parse()?;
    let mut validator = ExpressionValidator::new();
    let category = validator.classify(token, accept)?;

    let report = CheckReport {
        token,
        category,
        variables: validator.variables().iter().map(String::as_str).collect(),
        prefixes: validator.prefixes().iter().map(String::as_str).collect(),
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            println!("{} {}", "Token:".dimmed(), report.token.yellow());
            println!("{} {}", "Category:".dimmed(), report.category.to_string().cyan().bold());
            if !report.variables.is_empty() {
                println!("{} {}", "Variables:".dimmed(), report.variables.join(", ").white());
            }
            if !report.prefixes.is_empty() {
                println!("{} {}", "Prefixes:".dimmed(), report.prefixes.join(", ").white());
            }
        }
    }
    Ok(())
}

fn show_categories() {
    println!("{}", "Expression categories, in precedence order".cyan().bold());
    println!();

    let rows = [
        (Category::Variable, "?name  $name", "the variable"),
        (Category::Iri, "<http://example.org/>  a", "-"),
        (Category::PrefixedIri, "foaf:name", "the prefix"),
        (Category::Prefix, "foaf", "-"),
        (Category::Function, "STRLEN(?name) > 3", "variables, prefixes"),
        (Category::FunctionAs, "COUNT(?x) AS ?n", "variables except the target, prefixes"),
    ];

    println!(
        "{:14} {:28} {}",
        "Category".white().bold(),
        "Example".white().bold(),
        "Records".white().bold()
    );
    println!("{}", "─".repeat(80).dimmed());

    for (category, example, records) in rows {
        println!(
            "{:14} {:28} {}",
            category.to_string().cyan().bold(),
            example.yellow(),
            records.dimmed()
        );
    }

    println!();
    println!("{}", "Built-in function names:".white().bold());
    println!("{}", BUILTIN_FUNCTIONS.join(" ").dimmed());
}
