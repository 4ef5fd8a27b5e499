//! Static locality resolution
//!
//! Maps a coordinate to the nearest known locality/district pair. The list
//! is small and fixed, so a linear nearest-point scan is enough. Resolution
//! happens once at report creation and the result is never recomputed.

use crate::models::Location;

/// A known locality with its district and reference point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Locality {
    pub name: &'static str,
    pub district: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

/// Reference points for the covered service area
pub const LOCALITIES: &[Locality] = &[
    Locality {
        name: "Dago",
        district: "Coblong",
        latitude: -6.8842,
        longitude: 107.6134,
    },
    Locality {
        name: "Sukawarna",
        district: "Sukajadi",
        latitude: -6.8880,
        longitude: 107.5838,
    },
    Locality {
        name: "Arjuna",
        district: "Cicendo",
        latitude: -6.9075,
        longitude: 107.5920,
    },
    Locality {
        name: "Ciroyom",
        district: "Andir",
        latitude: -6.9130,
        longitude: 107.5830,
    },
    Locality {
        name: "Ciateul",
        district: "Regol",
        latitude: -6.9330,
        longitude: 107.6070,
    },
    Locality {
        name: "Turangga",
        district: "Lengkong",
        latitude: -6.9320,
        longitude: 107.6270,
    },
    Locality {
        name: "Gumuruh",
        district: "Batununggal",
        latitude: -6.9290,
        longitude: 107.6390,
    },
    Locality {
        name: "Braga",
        district: "Sumur Bandung",
        latitude: -6.9175,
        longitude: 107.6098,
    },
];

/// Find the nearest locality to a coordinate
///
/// Squared-degree distance is fine at city scale; we only compare, never
/// measure.
#[must_use]
pub fn nearest_locality(latitude: f64, longitude: f64) -> &'static Locality {
    LOCALITIES
        .iter()
        .min_by(|a, b| {
            let da = squared_distance(latitude, longitude, a);
            let db = squared_distance(latitude, longitude, b);
            da.total_cmp(&db)
        })
        .unwrap_or(&LOCALITIES[0])
}

/// Fill in the locality/district pair if it has not been resolved yet
pub fn resolve(location: &mut Location) {
    if location.locality.is_some() {
        return;
    }
    let nearest = nearest_locality(location.latitude, location.longitude);
    location.locality = Some(nearest.name.to_string());
    location.district = Some(nearest.district.to_string());
}

fn squared_distance(latitude: f64, longitude: f64, locality: &Locality) -> f64 {
    let dlat = latitude - locality.latitude;
    let dlng = longitude - locality.longitude;
    dlat * dlat + dlng * dlng
}
