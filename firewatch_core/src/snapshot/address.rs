// firewatch_core/src/snapshot/address.rs

//! Placeholder street addresses.
//!
//! There is no reverse geocoder behind this. The address is picked from a
//! fixed list by hashing the rounded coordinates, so the same spot always
//! gets the same text.

use serde::Deserialize;

use crate::types::LatLng;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AddressConfig {
    /// Decimal places kept before hashing; 4 places is roughly 11 m.
    pub precision: usize,
    pub streets: Vec<String>,
    pub districts: Vec<String>,
    pub locality: String,
}

impl Default for AddressConfig {
    fn default() -> Self {
        let to_strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            precision: 4,
            streets: to_strings(&[
                "P. Guevarra St.",
                "A. Regidor St.",
                "J. de Leon St.",
                "Calios Road",
                "National Highway",
                "Gatid Road",
                "Bubukal Road",
                "Quezon Avenue",
            ]),
            districts: to_strings(&[
                "Poblacion I",
                "Poblacion II",
                "Poblacion III",
                "Poblacion IV",
                "Bagumbayan",
                "Calios",
                "Duhat",
                "Gatid",
                "Pagsawitan",
                "Patimbao",
            ]),
            locality: "Santa Cruz, Laguna".to_string(),
        }
    }
}

/// 64-bit FNV-1a.
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

fn pick<'a>(items: &'a [String], hash: u64, fallback: &'a str) -> &'a str {
    if items.is_empty() {
        fallback
    } else {
        // The modulo result is below `items.len()`, so it fits in usize.
        &items[(hash % items.len() as u64) as usize]
    }
}

/// Deterministic placeholder address for `location`.
pub fn approximate_address(location: LatLng, config: &AddressConfig) -> String {
    let precision = config.precision.min(12);
    let key = format!("{:.*},{:.*}", precision, location.lat, precision, location.lng);
    let hash = fnv1a(key.as_bytes());

    let house_number = 1 + hash % 999;
    let street = pick(&config.streets, hash >> 16, "Unnamed Road");
    let district = pick(&config.districts, hash >> 32, "Unknown District");

    if config.locality.is_empty() {
        format!("{house_number} {street}, {district}")
    } else {
        format!("{house_number} {street}, {district}, {}", config.locality)
    }
}
