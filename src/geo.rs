//! Distance orthodromique (haversine), en miles.
//!
//! Approximation à vol d'oiseau ; aucun calcul d'itinéraire routier.

use serde::{Deserialize, Serialize};

/// Rayon terrestre moyen en miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `None` dès qu'une des deux coordonnées manque.
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        Some(Self::new(lat?, lon?))
    }
}

pub fn haversine_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_MILES * c
}

/// Distance inconnue (`None`) si un point manque : ne jamais la traiter comme zéro.
pub fn distance_miles(a: Option<GeoPoint>, b: Option<GeoPoint>) -> Option<f64> {
    Some(haversine_miles(a?, b?))
}
