use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sling::config::{self, Config};
use sling::index::Index;
use sling::model::Item;
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Read configuration from this file (JSON, or TOML by extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ignore configuration files and use the built-in defaults
    #[arg(long, conflicts_with = "config")]
    no_config: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the launchable items matching a query
    Search {
        /// Do not cap the output at `visible_items`
        #[arg(short, long)]
        all: bool,
        query: Vec<String>,
    },
    /// Launch a matching item in the background
    Launch {
        /// Which of the matches to launch, starting at 1
        #[arg(short, long, default_value_t = 1)]
        nth: usize,
        query: Vec<String>,
    },
    /// Print every indexed item
    List,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = resolve_config(&args);
    let index = sling::build_index(&config);

    match args.command {
        Command::Search { all, query } => {
            let query = query.join(" ");
            let limit = if all { usize::MAX } else { config.visible_items };
            for item in visible(&index, &query).take(limit) {
                print_item(item);
            }
        }
        Command::Launch { nth, query } => {
            let query = query.join(" ");
            if query.trim().is_empty() {
                bail!("nothing to launch for an empty query");
            }

            let item = visible(&index, &query)
                .nth(nth.saturating_sub(1))
                .with_context(|| format!("no match #{} for {:?}", nth, query))?;
            index
                .launch(item)
                .with_context(|| format!("could not launch {}", item.name))?;
            println!("{}", item.name);
        }
        Command::List => {
            for item in index.items() {
                print_item(item);
            }
        }
    }

    Ok(())
}

fn resolve_config(args: &Args) -> Config {
    if args.no_config {
        return Config::default();
    }

    match &args.config {
        Some(path) => config::load_file(path).unwrap_or_else(|e| {
            config::report_unloadable(&mut io::stderr(), path, &e);
            Config::default()
        }),
        None => config::load_config(),
    }
}

/// Search results the UI would list: matches whose provider still accepts them.
fn visible<'a>(index: &'a Index, query: &str) -> impl Iterator<Item = &'a Item> + 'a {
    index
        .search(query)
        .into_iter()
        .filter(move |item| index.launchable(item))
}

fn print_item(item: &Item) {
    if item.description.is_empty() {
        println!("{}", item.name);
    } else {
        println!("{}\t{}", item.name, item.description);
    }
}
