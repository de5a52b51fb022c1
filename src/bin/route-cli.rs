use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use segment_router::config::load_config;
use segment_router::lifecycle::startup::compile_table;
use segment_router::routing::cache::{read_cache_file, write_cache_file};
use segment_router::routing::{RouteMatch, RouteTable, TableOptions};

#[derive(Parser)]
#[command(name = "route-cli")]
#[command(about = "Compile, inspect and query segment-router route tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile route definitions and write the cache file
    Compile {
        #[arg(short, long)]
        config: PathBuf,
        /// Output path (defaults to router.cache_path)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Resolve request paths and print the matches
    Resolve {
        #[arg(short, long, conflicts_with = "cache", required_unless_present = "cache")]
        config: Option<PathBuf>,
        #[arg(long)]
        cache: Option<PathBuf>,
        /// Base URL to strip when resolving from a cache file
        #[arg(long)]
        base_url: Option<String>,
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// List the buckets and entries of a cache file
    Inspect {
        #[arg(long)]
        cache: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { config, out } => {
            let config = load_config(&config)?;
            let table = compile_table(&config.router, &config.routes)?;
            let out = out
                .or_else(|| config.router.cache_path.as_ref().map(PathBuf::from))
                .ok_or("no --out given and router.cache_path is not set")?;
            write_cache_file(&out, &table.export_full_cache()?)?;
            println!("compiled {} routes into {}", table.len(), out.display());
        }
        Commands::Resolve {
            config,
            cache,
            base_url,
            paths,
        } => {
            let table = match (config, cache) {
                (Some(config), _) => {
                    let config = load_config(&config)?;
                    compile_table(&config.router, &config.routes)?
                }
                (None, Some(cache)) => load_cache(&cache, base_url)?,
                (None, None) => return Err("either --config or --cache is required".into()),
            };

            let results = paths
                .iter()
                .map(|path| Ok(describe(path, &table.resolve(path)?)))
                .collect::<Result<Vec<Value>, segment_router::routing::RouteError>>()?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::Inspect { cache } => {
            let table = load_cache(&cache, None)?;
            let mut buckets: Vec<_> = table.buckets().collect();
            buckets.sort_by_key(|(base, _)| *base);

            println!("home  -> {}", table.home_route()?.callback());
            println!("error -> {}", table.error_route()?.callback());
            for (base, entries) in buckets {
                println!("[{}]", base);
                for entry in entries {
                    println!("  {:<40} -> {}", entry.template(), entry.callback());
                }
            }
        }
    }

    Ok(())
}

fn load_cache(path: &Path, base_url: Option<String>) -> Result<RouteTable, Box<dyn std::error::Error>> {
    let blob = read_cache_file(path)?.ok_or_else(|| format!("cache file {} not found", path.display()))?;
    let options = TableOptions {
        base_url,
        ..TableOptions::default()
    };
    Ok(RouteTable::from_cache(&blob, options)?)
}

fn describe(path: &str, m: &RouteMatch<'_>) -> Value {
    json!({
        "path": path,
        "outcome": m.outcome().as_str(),
        "route": m.entry().template(),
        "callback": m.entry().callback().to_string(),
        "params": m
            .params()
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect::<serde_json::Map<String, Value>>(),
    })
}
