//! tspider CLI - Torrent magnet search across multiple index sites.

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use tspider::{
    display,
    progress::ProgressOutput,
    ConfigStore, Language, SearchOutcome, Spider,
};

/// tspider - Torrent magnet search CLI
#[derive(Parser)]
#[command(name = "tspider")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Keyword to search for (shorthand for `tspider search <keyword>`)
    keyword: Option<String>,

    /// Language of the sites to search with the bare keyword form
    #[arg(short, long, default_value = "jp")]
    language: LanguageArg,

    /// Path to the config file (defaults to $TSPIDER_CONFIG or ~/.tspider.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search torrent sites for a keyword
    #[command(visible_alias = "s")]
    Search(SearchArgs),

    /// Check which sites are reachable
    #[command(visible_alias = "d")]
    Doctor {
        /// Only check sites of this language
        #[arg(short, long)]
        language: Option<LanguageArg>,
    },

    /// Show or edit the site configuration
    #[command(visible_alias = "c", subcommand)]
    Config(ConfigCommand),
}

#[derive(Parser)]
struct SearchArgs {
    /// Search keyword
    keyword: String,

    /// Language of the sites to search
    #[arg(short, long, default_value = "jp")]
    language: LanguageArg,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// List configured sites
    List,
    /// Change the URL of a site
    SetUrl { site: String, url: String },
    /// Add a new site
    Add {
        site: String,
        url: String,
        #[arg(short, long, default_value = "kr")]
        language: LanguageArg,
    },
    /// Remove a site
    Remove { site: String },
    /// Enable a site
    Enable { site: String },
    /// Disable a site
    Disable { site: String },
    /// Print the config file location
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LanguageArg {
    /// Korean sites
    Kr,
    /// Japanese sites
    Jp,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::Kr => Language::Kr,
            LanguageArg::Jp => Language::Jp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable table output
    Text,
    /// JSON output
    Json,
    /// Compact `title<TAB>magnet` lines
    Compact,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("tspider=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let store = match &cli.config {
        Some(path) => ConfigStore::open(path)?,
        None => ConfigStore::open_default()?,
    };

    match (cli.command, cli.keyword) {
        (Some(Commands::Search(args)), _) => run_search(store, args).await,
        (Some(Commands::Doctor { language }), _) => run_doctor(store, language).await,
        (Some(Commands::Config(command)), _) => run_config(store, command),
        (None, Some(keyword)) => {
            let args = SearchArgs {
                keyword,
                language: cli.language,
                format: OutputFormat::Text,
            };
            run_search(store, args).await
        }
        (None, None) => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

async fn run_search(store: ConfigStore, args: SearchArgs) -> Result<()> {
    let output = match args.format {
        OutputFormat::Text => ProgressOutput::Stderr,
        OutputFormat::Json | OutputFormat::Compact => ProgressOutput::Hidden,
    };
    let spider = Spider::new(store.into_config())?.with_progress_output(output);

    let collected = match spider.search(&args.keyword, args.language.into()).await? {
        SearchOutcome::Found(collected) => collected,
        SearchOutcome::NoAvailableSources => {
            eprintln!("[!] No available sites. Use 'tspider doctor' to check status.");
            return Ok(());
        }
    };

    match args.format {
        OutputFormat::Text => {
            if collected.results.is_empty() {
                println!("No results for \"{}\"", args.keyword);
            } else {
                print!("{}", display::results_table(&collected.results));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&collected)?);
        }
        OutputFormat::Compact => {
            print!("{}", display::results_compact(&collected.results));
        }
    }

    Ok(())
}

async fn run_doctor(store: ConfigStore, language: Option<LanguageArg>) -> Result<()> {
    let spider = Spider::new(store.into_config())?;
    println!("Checking site availability...");
    let report = spider.doctor(language.map(Language::from)).await;
    print!("{}", display::doctor_table(&report));
    Ok(())
}

fn run_config(mut store: ConfigStore, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::List => {
            print!("{}", display::sites_table(store.config(), store.path()));
        }
        ConfigCommand::SetUrl { site, url } => {
            store.set_site_url(&site, &url)?;
            println!("[+] Updated {} URL to {}", site, url);
        }
        ConfigCommand::Add {
            site,
            url,
            language,
        } => {
            let language = Language::from(language);
            store.add_site(&site, &url, language)?;
            println!("[+] Added {} ({}) at {}", site, language, url);
        }
        ConfigCommand::Remove { site } => {
            store.remove_site(&site)?;
            println!("[+] Removed {}", site);
        }
        ConfigCommand::Enable { site } => {
            store.enable_site(&site, true)?;
            println!("[+] Enabled {}", site);
        }
        ConfigCommand::Disable { site } => {
            store.enable_site(&site, false)?;
            println!("[+] Disabled {}", site);
        }
        ConfigCommand::Path => {
            println!("{}", store.path().display());
        }
    }
    Ok(())
}
