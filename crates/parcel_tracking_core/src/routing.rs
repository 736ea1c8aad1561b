//! Nearest-neighbour route sequencing over simulated stop coordinates.
//!
//! Distances are straight-line in raw coordinate units, not great-circle
//! distances, and the coordinates themselves come from [`SimulatedGeocoder`].
//! Treat the resulting totals as relative costs only.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

/// Multiplier applied to the summed coordinate distance to report "kilometres".
pub const DISTANCE_SCALE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub order_id: String,
    pub delivery_address: String,
    pub coordinates: Coordinates,
}

impl Stop {
    pub fn new(
        order_id: impl Into<String>,
        delivery_address: impl Into<String>,
        coordinates: Coordinates,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            delivery_address: delivery_address.into(),
            coordinates,
        }
    }

    pub fn geocoded(
        order_id: impl Into<String>,
        delivery_address: impl Into<String>,
        geocoder: &impl Geocoder,
    ) -> Self {
        let delivery_address = delivery_address.into();
        let coordinates = geocoder.locate(&delivery_address);
        Self::new(order_id, delivery_address, coordinates)
    }
}

/// Assigns coordinates to a delivery address.
pub trait Geocoder {
    fn locate(&self, address: &str) -> Coordinates;
}

/// Placeholder geocoder: folds a stable hash of the address into
/// `lat = (h mod 180) - 90` and `lng = (h mod 360) - 180`.
///
/// The mapping is deterministic across processes but has no relation to
/// where the address actually is.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedGeocoder;

impl SimulatedGeocoder {
    pub fn address_hash(address: &str) -> i64 {
        let digest = Sha256::digest(address.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        i64::from_be_bytes(prefix)
    }
}

impl Geocoder for SimulatedGeocoder {
    fn locate(&self, address: &str) -> Coordinates {
        let hash = Self::address_hash(address);
        Coordinates {
            lat: (hash.rem_euclid(180) - 90) as f64,
            lng: (hash.rem_euclid(360) - 180) as f64,
        }
    }
}

pub fn distance(a: Coordinates, b: Coordinates) -> f64 {
    ((b.lat - a.lat).powi(2) + (b.lng - a.lng).powi(2)).sqrt()
}

/// Orders stops by repeatedly visiting the closest unvisited stop.
///
/// The first input stop is always the start. Ties resolve to the stop that
/// appears first in input order. Runs in O(n²).
pub fn sequence_nearest_neighbor(stops: Vec<Stop>) -> Vec<Stop> {
    let mut remaining = stops;
    if remaining.is_empty() {
        return remaining;
    }

    let mut sequence = Vec::with_capacity(remaining.len());
    let mut current = remaining.remove(0);

    while !remaining.is_empty() {
        let mut nearest_index = 0usize;
        let mut nearest_distance = f64::INFINITY;
        for (index, candidate) in remaining.iter().enumerate() {
            let candidate_distance = distance(current.coordinates, candidate.coordinates);
            if candidate_distance < nearest_distance {
                nearest_index = index;
                nearest_distance = candidate_distance;
            }
        }

        let next = remaining.remove(nearest_index);
        sequence.push(std::mem::replace(&mut current, next));
    }

    sequence.push(current);
    sequence
}

/// Sum of consecutive leg distances, scaled by [`DISTANCE_SCALE`].
pub fn total_distance(sequence: &[Stop]) -> f64 {
    if sequence.len() < 2 {
        return 0.0;
    }

    let legs: f64 = sequence
        .windows(2)
        .map(|pair| distance(pair[0].coordinates, pair[1].coordinates))
        .sum();
    legs * DISTANCE_SCALE
}

/// Rounds a scaled distance to two decimals for storage and responses.
pub fn rounded_distance_km(total: f64) -> Decimal {
    Decimal::from_f64(total)
        .map(|value| value.round_dp(2))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRoute {
    pub sequence: Vec<Stop>,
    pub total_distance: f64,
}

impl PlannedRoute {
    pub fn order_sequence(&self) -> Vec<String> {
        self.sequence
            .iter()
            .map(|stop| stop.order_id.clone())
            .collect()
    }
}

pub fn plan_route(stops: Vec<Stop>) -> PlannedRoute {
    let sequence = sequence_nearest_neighbor(stops);
    let total_distance = total_distance(&sequence);
    PlannedRoute {
        sequence,
        total_distance,
    }
}
