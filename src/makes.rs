// Reference list of vehicle makes, loaded once at startup and read-only after.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;

static MAKES: OnceCell<Vec<String>> = OnceCell::new();

const BUILTIN_MAKES: &[&str] = &[
    "Acura", "Alfa Romeo", "Audi", "BMW", "Buick", "Cadillac", "Chevrolet", "Chrysler", "Dodge",
    "Fiat", "Ford", "Genesis", "GMC", "Honda", "Hyundai", "Infiniti", "Jaguar", "Jeep", "Kia",
    "Land Rover", "Lexus", "Lincoln", "Mazda", "Mercedes-Benz", "Mini", "Mitsubishi", "Nissan",
    "Polestar", "Porsche", "Ram", "Rivian", "Subaru", "Tesla", "Toyota", "Volkswagen", "Volvo",
];

/// Loads the make list from `path` (a JSON array of names) or falls back to
/// the built-in list. Only the first call has any effect.
pub fn init(path: Option<&Path>) -> Result<&'static [String]> {
    let mut loaded = false;
    let makes = MAKES.get_or_try_init(|| {
        loaded = true;
        match path {
            Some(path) => load_file(path),
            None => Ok(builtin()),
        }
    })?;
    if !loaded {
        if let Some(path) = path {
            tracing::warn!(
                path = %path.display(),
                "Make list already initialized; configured makes_file was not read"
            );
        }
    }
    tracing::info!(count = makes.len(), "Reference make list ready");
    Ok(makes)
}

// The loaded list, or the built-in one if `init` was never called
pub fn all() -> &'static [String] {
    MAKES.get_or_init(builtin)
}

fn builtin() -> Vec<String> {
    BUILTIN_MAKES.iter().map(|m| m.to_string()).collect()
}

fn load_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read make list {}", path.display()))?;
    let names: Vec<String> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse make list {}", path.display()))?;
    Ok(normalize(names))
}

// Trimmed, non-empty, de-duplicated, sorted case-insensitively
fn normalize(names: Vec<String>) -> Vec<String> {
    let mut makes: Vec<String> = names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    makes.sort_by_key(|name| name.to_lowercase());
    makes.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    makes
}
