//! CSV loader for the price-tagged listings dataset.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ListingsError {
    #[error("failed to read listings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed listings header: {0}")]
    Header(#[from] csv::Error),

    #[error("listings file is missing required column `{0}`")]
    MissingColumn(&'static str),
}

/// A validated listing: positive price at a non-zero coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Listing {
    pub price: f64,
    pub longitude: f64,
    pub latitude: f64,
}

/// One CSV row as it appears in the file. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawListing {
    price: String,
    latitude: f64,
    longitude: f64,
}

const REQUIRED_COLUMNS: [&str; 3] = ["price", "latitude", "longitude"];

/// Loads the listings CSV, keeping only rows that pass validation.
///
/// Rows with an unparseable or non-positive price, or with a missing,
/// non-finite, or exactly-zero coordinate (the dataset's "no location"
/// sentinel) are skipped, never raised. A missing file or unreadable header
/// is fatal.
pub fn load_listings(path: &Path) -> Result<Vec<Listing>, ListingsError> {
    let file = File::open(path).map_err(|source| ListingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ListingsError::MissingColumn(column));
        }
    }

    let mut listings = Vec::new();
    let mut skipped = 0usize;

    for row in reader.deserialize::<RawListing>() {
        let Ok(raw) = row else {
            skipped += 1;
            continue;
        };
        match validate(raw) {
            Some(listing) => listings.push(listing),
            None => skipped += 1,
        }
    }

    info!(accepted = listings.len(), skipped, "Listings loaded");
    Ok(listings)
}

fn validate(raw: RawListing) -> Option<Listing> {
    let price = parse_price(&raw.price)?;
    if price <= 0.0 {
        return None;
    }
    if !raw.latitude.is_finite() || !raw.longitude.is_finite() {
        return None;
    }
    if raw.latitude == 0.0 || raw.longitude == 0.0 {
        return None;
    }
    Some(Listing {
        price,
        longitude: raw.longitude,
        latitude: raw.latitude,
    })
}

/// Strips currency symbols and group separators before numeric parsing,
/// so "$1,250.00" and "1250" both come out as 1250.0.
fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',' | ' '))
        .collect();
    cleaned.parse().ok()
}
