// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pokedex::{connect, Config, FilterState, Pokemon, PokemonId, PokemonType};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pokedex", version, about = "Browse the first 151 Pokémon from PokéAPI")]
struct Cli {
    /// JSON config file (falls back to $POKEDEX_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Interactive viewer (default)
    Tui,
    /// Load the catalog and print the rows that pass the filters
    List {
        #[arg(short, long, default_value = "")]
        query: String,
        #[arg(short = 't', long = "type")]
        category: Option<PokemonType>,
    },
    /// Fetch one Pokemon by number or name
    Show { id: PokemonId },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?.with_api_url(cli.api_url);

    match cli.command.unwrap_or(Mode::Tui) {
        Mode::Tui => {
            let _guard = init_logging(Some(&config.log_dir))?;
            run_ui_mode(config).await
        }
        Mode::List { query, category } => {
            let _guard = init_logging(None)?;
            run_list(&config, FilterState::new(query, category)).await
        }
        Mode::Show { id } => {
            let _guard = init_logging(None)?;
            run_show(&config, &id).await
        }
    }
}

/// Log to `<dir>/pokedex.log` when a dir is given (TUI owns the terminal), else stderr
fn init_logging(dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match dir {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix("pokedex.log")
                .build(dir)
                .context("Failed to open log file")?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!(e))
                .context("Failed to set tracing subscriber")?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow::anyhow!(e))
                .context("Failed to set tracing subscriber")?;
            Ok(None)
        }
    }
}

async fn run_list(config: &Config, filter: FilterState) -> Result<()> {
    println!("📚 Loading {} Pokémon from {}...", config.listing_limit, config.api_base_url);

    let (_, aggregator) = connect(config).context("Failed to build HTTP client")?;
    let snapshot = aggregator
        .fetch_all()
        .await
        .context("Failed to load the catalog")?;

    let rows = filter.apply(&snapshot.entries);
    for pokemon in &rows {
        println!("{:>4}  {:<14} {}", format!("#{}", pokemon.id), pokemon.name, pokemon.types.join(" / "));
    }
    println!("\n✓ {} of {} shown", rows.len(), snapshot.len());

    Ok(())
}

async fn run_show(config: &Config, id: &PokemonId) -> Result<()> {
    let (fetcher, _) = connect(config).context("Failed to build HTTP client")?;
    let pokemon = fetcher
        .fetch(id)
        .await
        .with_context(|| format!("Failed to fetch {}", id))?;

    print_detail(&pokemon);
    Ok(())
}

fn print_detail(pokemon: &Pokemon) {
    println!("{}  (#{})", pokemon.name, pokemon.id);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Types:     {}", pokemon.types.join(", "));
    println!("Height:    {} m", pokemon.height);
    println!("Weight:    {} kg", pokemon.weight);
    println!("Abilities: {}", pokemon.abilities_line());
    println!(
        "Sprite:    {}",
        pokemon.image.as_deref().unwrap_or("(none)")
    );
}

#[cfg(feature = "tui")]
async fn run_ui_mode(config: Config) -> Result<()> {
    println!("🖥️  Starting Pokédex... (Press 'q' to quit)\n");

    ui::run_ui(config).await?;

    println!("\n✅ UI closed successfully");
    Ok(())
}

#[cfg(not(feature = "tui"))]
async fn run_ui_mode(_config: Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: pokedex list / pokedex show <id>");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_list_filters() {
        let cli = Cli::parse_from(["pokedex", "list", "--query", "char", "--type", "Fire"]);

        match cli.command {
            Some(Mode::List { query, category }) => {
                assert_eq!(query, "char");
                assert_eq!(category, Some(PokemonType::Fire));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_type() {
        assert!(Cli::try_parse_from(["pokedex", "list", "--type", "stellar"]).is_err());
    }

    #[test]
    fn test_cli_show_accepts_name_or_number() {
        let by_name = Cli::parse_from(["pokedex", "show", "Pikachu"]);
        let by_number = Cli::parse_from(["pokedex", "--api-url", "http://x", "show", "25"]);

        assert!(matches!(by_name.command, Some(Mode::Show { id: PokemonId::Name(ref n) }) if n == "pikachu"));
        assert!(matches!(by_number.command, Some(Mode::Show { id: PokemonId::Number(25) })));
        assert_eq!(by_number.api_url.as_deref(), Some("http://x"));
    }

    #[test]
    fn test_init_logging_bad_dir_is_error() {
        let result = init_logging(Some(Path::new("/proc/no/such/dir")));

        let err = result.err().expect("expected an error");
        assert!(err.to_string().contains("Failed to open log file"));
    }

    #[test]
    fn test_default_mode_is_tui() {
        let cli = Cli::parse_from(["pokedex"]);

        assert!(cli.command.is_none());
    }
}
