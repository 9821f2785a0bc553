//! eavbase CLI - inspect and exercise a dual-mode object store

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use eavbase::config::{self, EavbaseConfig};
use eavbase::namespace::{self, ClassIdentity, TableNamespace};
use eavbase::ui::{self, Icons};
use eavbase::{guard, BaseObject, EntityFactory, PersistenceGate, PredicateSet};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "eavbase")]
#[command(version)]
#[command(about = "Dual-mode property-bag objects with optional SQLite EAV persistence")]
#[command(long_about = r#"
eavbase stores simple property-bag objects either in memory or, when the
configured persistence mode is "sqlite", in a shared EAV store under
<base_dir>/var/db/.

Example usage:
  eavbase init --base-dir .
  eavbase create shop::Widget name=foo version='"1.0"'
  eavbase find shop::Widget name=foo
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file enabling the sqlite backend
    Init {
        /// Base directory holding var/db/
        #[arg(short, long, default_value = ".")]
        base_dir: String,

        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Show persistence mode, store location and version check
    Status,

    /// Create an entity and set its parameters
    Create {
        /// Class as namespace::Type
        class: String,

        /// Parameters as key=value (values parsed as JSON when possible)
        params: Vec<String>,
    },

    /// Find entities whose parameters match every key=value pair
    Find {
        /// Class as namespace::Type
        class: String,

        /// Predicates as key=value (values parsed as JSON when possible)
        predicates: Vec<String>,
    },

    /// Print the table names derived for a class
    Tables {
        /// Class as namespace::Type
        class: String,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    if let Err(e) = run(cli) {
        ui::failure(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);

    if let Commands::Init { base_dir, force } = &cli.command {
        let cfg = EavbaseConfig::relational(base_dir.clone());
        config::write_config(&config_path, &cfg, *force)?;
        ui::persisted(&format!("Wrote {}", config_path.display()));
        return Ok(());
    }

    let cfg = config::load_config(Some(&config_path))?.unwrap_or_else(|| {
        tracing::debug!("No config at {}, using in-memory mode", config_path.display());
        EavbaseConfig::default()
    });
    let gate = PersistenceGate::new(cfg);

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),

        Commands::Status => {
            ui::banner("eavbase status");
            let mode = gate.config().persistence.as_deref().unwrap_or("(unset)");
            ui::field("mode", mode);
            ui::field("store", &gate.database_path().display().to_string());

            if !gate.is_persistence_enabled() {
                ui::fallback("Persistence disabled, objects live in memory");
                return Ok(());
            }

            match gate.database_handle() {
                None => ui::fallback("Store unreachable, objects live in memory"),
                Some(store) => {
                    if guard::is_compatible(&store) {
                        ui::persisted(&format!("Schema version {} compatible", guard::SCHEMA_VERSION));
                    } else {
                        ui::fallback("Schema version incompatible, objects live in memory");
                    }
                    println!();
                    print!("{}", store.stats()?);
                }
            }
        }

        Commands::Create { class, params } => {
            let class = ClassIdentity::parse(&class)?;
            let factory = EntityFactory::new(&gate);
            let mut entity = factory.construct_uninitialized(&class)?;
            for raw in &params {
                let (key, value) = parse_pair(raw)?;
                entity.set_param(&key, value)?;
            }

            match entity.id() {
                Some(id) => ui::persisted(&format!("{} #{}", class, id)),
                None => ui::fallback(&format!("{} created in memory (not persisted)", class)),
            }
        }

        Commands::Find { class, predicates } => {
            let class = ClassIdentity::parse(&class)?;
            let set: PredicateSet = predicates
                .iter()
                .map(|raw| parse_pair(raw))
                .collect::<anyhow::Result<Vec<_>>>()?
                .into_iter()
                .collect();

            println!("{} Finding {} ({} predicates)...", Icons::SEARCH, class, set.len());
            let factory = EntityFactory::new(&gate);
            match factory.select_by_params(&class, &set)? {
                None => ui::fallback("No persistence layer to query"),
                Some(found) if found.is_empty() => println!("∅ No matches."),
                Some(found) => {
                    for entity in found {
                        let id = entity.id().map(|id| id.to_string()).unwrap_or_default();
                        ui::record_heading(&class.to_string(), &id);
                        let mut params: Vec<_> = entity.params()?.into_iter().collect();
                        params.sort_by(|a, b| a.0.cmp(&b.0));
                        let table = ui::params_table(
                            params.iter().map(|(k, v)| (k.as_str(), v.to_string())),
                        );
                        if table.is_empty() {
                            println!("  {}", ui::faint("(no parameters)"));
                        } else {
                            println!("{}", table);
                        }
                    }
                }
            }
        }

        Commands::Tables { class } => {
            let class = ClassIdentity::parse(&class)?;
            let base = namespace::table_base(&class);
            let tables = TableNamespace::for_class(&class);
            ui::banner(&format!("{} ({} / {})", class, base.core, base.class));
            ui::ident_field("records", &tables.records);
            ui::ident_field("properties", &tables.properties);
        }
    }

    Ok(())
}

/// Split `key=value`; the value is JSON if it parses, a string otherwise
fn parse_pair(raw: &str) -> anyhow::Result<(String, serde_json::Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("expected key=value, got {:?}", raw))?;
    if key.is_empty() {
        anyhow::bail!("empty key in {:?}", raw);
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
