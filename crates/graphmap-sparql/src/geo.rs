//! Geo-query extension: one circular-radius spatial constraint bound to
//! the root identity variable, merged into the query's condition block
//! without altering anything else.

/// Jena spatial extension predicate.
pub const WITHIN_CIRCLE: &str = "http://jena.apache.org/spatial#withinCircle";

/// Circular-radius constraint: latitude, longitude, radius in kilometres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCircle {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: f64,
}

impl GeoCircle {
    pub fn new(lat: f64, lon: f64, radius_km: f64) -> Self {
        GeoCircle {
            lat,
            lon,
            radius_km,
        }
    }

    /// The single triple pattern this constraint contributes.
    pub fn pattern(&self, identity_var: &str) -> String {
        format!(
            "?{} <{}> ({} {} {}) .",
            identity_var,
            WITHIN_CIRCLE,
            coord(self.lat),
            coord(self.lon),
            coord(self.radius_km)
        )
    }
}

// Whole numbers keep one decimal place so coordinates read as doubles.
fn coord(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}
