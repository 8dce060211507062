//! Placement CLI
//!
//! Usage:
//!   placement [OPTIONS] <COMMAND>
//!
//! Commands:
//!   map              Map a delimitation onto a rendered mockup
//!   clamp            Clamp a design offset inside its zone
//!   resolve-product  Resolve a product reference to a vendor product ID
//!   resolve-design   Resolve a design reference to a vendor design ID
//!   migrate          Migrate legacy position records in a storage file
//!   inspect          List the records in a storage file
//!   diagnose         Check a product/design pair against the vendor's lists
//!
//! Options:
//!   -c, --config <FILE>  Configuration file (TOML format)
//!   -v, --verbose        Debug logging (overridden by RUST_LOG)

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

use mockup_placement::migration::{diagnose, scan_legacy, LegacyMigrator};
use mockup_placement::remote::HttpBackend;
use mockup_placement::resolver::{VendorDesign, VendorProduct};
use mockup_placement::storage::{FileLocalStore, LocalStore};
use mockup_placement::{
    constrain_transform, map_delimitation, open_store, Delimitation, DesignRef, IdResolver,
    PlacementConfig, PlacementError, PlacementKey, ProductRef, Size, Transform,
};

#[derive(Parser)]
#[command(name = "placement")]
#[command(about = "Position vendor designs inside product mockups")]
struct Cli {
    /// Configuration file (TOML format)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Map a delimitation onto a rendered mockup
    Map {
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
        #[arg(long)]
        width: f64,
        #[arg(long)]
        height: f64,
        /// Delimitation is in natural-image pixels rather than percent
        #[arg(long)]
        absolute: bool,
        /// Natural mockup size, e.g. 1200x1200
        #[arg(long, value_parser = parse_size)]
        natural: Size,
        /// Rendered container size, e.g. 800x600
        #[arg(long, value_parser = parse_size)]
        container: Size,
    },

    /// Clamp a design offset inside its zone
    Clamp {
        /// Zone size on screen, e.g. 300x300
        #[arg(long, value_parser = parse_size)]
        zone: Size,
        /// Natural design image size
        #[arg(long, value_parser = parse_size)]
        design: Option<Size>,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        y: f64,
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        rotation: f64,
    },

    /// Resolve a product reference to a vendor product ID
    ResolveProduct {
        id: u64,
        #[arg(long)]
        base: Option<u64>,
        /// JSON file with the vendor's products
        #[arg(long)]
        products: Option<PathBuf>,
    },

    /// Resolve a design reference to a vendor design ID
    ResolveDesign {
        #[arg(long)]
        id: Option<u64>,
        #[arg(long)]
        url: Option<String>,
        /// JSON file with the vendor's designs
        #[arg(long)]
        designs: Option<PathBuf>,
    },

    /// Migrate legacy position records in a storage file
    Migrate {
        /// Storage file (defaults to storage_path from the config)
        #[arg(long)]
        storage: Option<PathBuf>,
        #[arg(long)]
        vendor: u64,
        /// Clear the done flag before running
        #[arg(long)]
        reset: bool,
    },

    /// List the records in a storage file
    Inspect {
        #[arg(long)]
        storage: Option<PathBuf>,
    },

    /// Check a product/design pair against the vendor's lists
    Diagnose {
        #[arg(long)]
        vendor_product: Option<u64>,
        #[arg(long)]
        base_product: Option<u64>,
        #[arg(long)]
        design: Option<u64>,
        #[arg(long)]
        url: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => match PlacementConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => PlacementConfig::default(),
    };

    if let Err(e) = run(cli.command, config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command, config: PlacementConfig) -> Result<(), PlacementError> {
    let resolver = IdResolver::new(config.vendor_id_threshold);

    match command {
        Command::Map {
            x,
            y,
            width,
            height,
            absolute,
            natural,
            container,
        } => {
            let delimitation = if absolute {
                Delimitation::absolute(x, y, width, height)
            } else {
                Delimitation::percentage(x, y, width, height)
            };
            let rect = map_delimitation(&delimitation, natural, container);
            println!("{}", serde_json::to_string_pretty(&rect)?);
            if !rect.is_renderable() {
                eprintln!("warning: zone is not renderable at this size");
            }
        }

        Command::Clamp {
            zone,
            design,
            x,
            y,
            scale,
            rotation,
        } => {
            let transform = Transform {
                x,
                y,
                scale,
                rotation,
                ..Transform::default()
            };
            let clamped = constrain_transform(&transform, zone, design);
            println!("{}", serde_json::to_string_pretty(&clamped)?);
        }

        Command::ResolveProduct { id, base, products } => {
            let products: Vec<VendorProduct> = read_list(products.as_deref())?;
            let product = match base {
                Some(base) => ProductRef::Ref {
                    id,
                    base_product_id: Some(base),
                },
                None => ProductRef::Id(id),
            };
            match resolver.resolve_vendor_product_id(&product, &products) {
                Some(vp) => println!("{vp}"),
                None => {
                    eprintln!("no vendor product for {id}");
                    std::process::exit(2);
                }
            }
        }

        Command::ResolveDesign { id, url, designs } => {
            let designs: Vec<VendorDesign> = read_list(designs.as_deref())?;
            let design = DesignRef { id, image_url: url };
            match resolver.resolve_vendor_design_id(&design, &designs) {
                Some(d) => println!("{d}"),
                None => {
                    eprintln!("no vendor design for this reference");
                    std::process::exit(2);
                }
            }
        }

        Command::Migrate {
            storage,
            vendor,
            reset,
        } => {
            let config = with_storage(config, storage);
            let mut store = open_store(config)?;
            if reset {
                LegacyMigrator::reset(store.local_mut())?;
            }
            let report = LegacyMigrator::new(vendor).run(&mut store)?;
            if report.skipped {
                println!("migration already done (use --reset to run again)");
            }
            for key in &report.keys {
                println!(
                    "{}: {} migrated, {} failed{}",
                    key.key,
                    key.migrated,
                    key.failed,
                    if key.removed { ", removed" } else { "" }
                );
            }
        }

        Command::Inspect { storage } => {
            let path = storage
                .or(config.storage_path)
                .ok_or(PlacementError::MissingStoragePath)?;
            let local = FileLocalStore::open(&path)?;
            for key in local.keys() {
                let value = local.get(&key).unwrap_or_default();
                match serde_json::from_str::<serde_json::Value>(&value) {
                    Ok(json) => println!("{key} = {json}"),
                    Err(_) => println!("{key} = {value:?} (not JSON)"),
                }
            }
            for (key, count) in scan_legacy(&local) {
                println!("legacy {key}: {count} entries");
            }
        }

        Command::Diagnose {
            vendor_product,
            base_product,
            design,
            url,
        } => {
            let backend = HttpBackend::new(&config)?;
            let key = PlacementKey {
                vendor_id: None,
                base_product_id: base_product,
                vendor_product_id: vendor_product,
                design_id: design,
                design_url: url,
            };
            let report = diagnose(&backend, &resolver, &key)?;
            if let Some(profile) = report.profile_id {
                println!("profile: {profile}");
            }
            println!("vendor products: {}", report.vendor_products.len());
            println!("vendor designs: {}", report.vendor_designs.len());
            println!("product owned: {}", report.product_owned);
            println!("design owned: {}", report.design_owned);
            match report.suggested {
                Some(pair) => println!("suggested pair: {pair}"),
                None => println!("suggested pair: none"),
            }
        }
    }

    Ok(())
}

fn with_storage(config: PlacementConfig, storage: Option<PathBuf>) -> PlacementConfig {
    match storage {
        Some(path) => config.with_storage_path(path),
        None => config,
    }
}

fn read_list<T: DeserializeOwned>(path: Option<&Path>) -> Result<Vec<T>, PlacementError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let content = fs::read_to_string(path).map_err(|source| PlacementError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

fn parse_size(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once(|c| c == 'x' || c == 'X')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let width = w.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let height = h.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(Size::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_list_file_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("products.json");
        let result = read_list::<VendorProduct>(Some(&missing));
        assert!(matches!(result, Err(PlacementError::Input { path, .. }) if path == missing));
    }

    #[test]
    fn test_list_file_is_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("designs.json");
        fs::write(&path, r#"[{"id":3,"imageUrl":"https://cdn/a.png"}]"#).unwrap();
        let designs = read_list::<VendorDesign>(Some(&path)).unwrap();
        assert_eq!(designs, vec![VendorDesign::new(3, "https://cdn/a.png")]);
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("800x600"), Ok(Size::new(800.0, 600.0)));
        assert!(parse_size("800").is_err());
    }
}
