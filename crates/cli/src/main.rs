//! Rigbay CLI - Build evaluation and catalog management tools.
//!
//! # Usage
//!
//! ```bash
//! # Evaluate a PC build file
//! rigbay build evaluate my-build.yaml --rules extended --strict
//!
//! # Print the compatibility rule table
//! rigbay build rules
//!
//! # List catalog products
//! rigbay catalog products --search ryzen --sort price-asc
//!
//! # Seed products from YAML
//! rigbay catalog seed seed/products.yaml
//! ```
//!
//! # Commands
//!
//! - `build evaluate` - Score a build and report compatibility issues
//! - `build rules` - Show the rules a profile runs
//! - `catalog products` - List products from the commerce API
//! - `catalog seed` - Create products from a seed file

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rigbay_core::CurrencyCode;
use rigbay_core::build::RuleProfile;
use rigbay_core::catalog::ProductSort;

mod commands;
mod error;

use commands::catalog::ListOptions;
use error::CliError;

#[derive(Parser)]
#[command(name = "rigbay")]
#[command(author, version, about = "Rigbay CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// PC Builder tools
    Build {
        #[command(subcommand)]
        action: BuildAction,
    },
    /// Catalog tools (needs COMMERCE_API_URL and ADMIN_API_TOKEN)
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum BuildAction {
    /// Evaluate a YAML or JSON build file
    Evaluate {
        /// Build file: a list of components
        file: PathBuf,

        /// Rule profile (`standard`, `extended`)
        #[arg(short, long, env = "PC_BUILDER_RULES", default_value = "extended")]
        rules: RuleProfile,

        /// Currency for prices (defaults to the file's, then LKR)
        #[arg(short, long)]
        currency: Option<CurrencyCode>,

        /// Exit non-zero when the build has blocking issues
        #[arg(long)]
        strict: bool,
    },
    /// Print the rule table
    Rules {
        /// Rule profile (`standard`, `extended`)
        #[arg(short, long, env = "PC_BUILDER_RULES", default_value = "extended")]
        rules: RuleProfile,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products
    Products {
        /// Search name, category and brand
        #[arg(short, long)]
        search: Option<String>,

        /// Category name
        #[arg(short, long)]
        category: Option<String>,

        /// Brand name
        #[arg(short, long)]
        brand: Option<String>,

        /// Sort order (`featured`, `price-asc`, `price-desc`, `name`, `rating`, `newest`)
        #[arg(long, default_value = "name")]
        sort: ProductSort,

        /// Page number
        #[arg(short, long)]
        page: Option<u32>,

        /// Currency for prices
        #[arg(long, env = "CURRENCY", default_value = "LKR")]
        currency: CurrencyCode,
    },
    /// Create products from a YAML seed file
    Seed {
        /// Seed file path
        file: PathBuf,

        /// Validate only; create nothing
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Build { action } => match action {
            BuildAction::Evaluate {
                file,
                rules,
                currency,
                strict,
            } => commands::build::evaluate(&file, rules, currency, strict).await?,
            BuildAction::Rules { rules } => commands::build::rules(rules),
        },
        Commands::Catalog { action } => match action {
            CatalogAction::Products {
                search,
                category,
                brand,
                sort,
                page,
                currency,
            } => {
                let options = ListOptions {
                    search,
                    category,
                    brand,
                    sort,
                    page,
                };
                commands::catalog::products(options, currency).await?;
            }
            CatalogAction::Seed { file, dry_run } => {
                commands::catalog::seed(&file, dry_run).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_build_evaluate() {
        let cli = Cli::try_parse_from([
            "rigbay", "build", "evaluate", "b.yaml", "--rules", "standard", "--strict",
        ])
        .map_err(|e| e.to_string());
        assert!(matches!(
            cli,
            Ok(Cli {
                command: Commands::Build {
                    action: BuildAction::Evaluate {
                        rules: RuleProfile::Standard,
                        strict: true,
                        ..
                    }
                }
            })
        ));
    }

    #[test]
    fn test_rejects_unknown_sort() {
        assert!(
            Cli::try_parse_from(["rigbay", "catalog", "products", "--sort", "cheapest"]).is_err()
        );
    }
}
