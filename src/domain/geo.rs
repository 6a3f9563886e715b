//! Postal-zone resolution and distance-based zone classification.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub const INSIDE_MAX_KM: f64 = 20.0;
pub const NEAR_MAX_KM: f64 = 50.0;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostalZoneRow {
    pub postal_code: String,
    pub district: String,
    pub thana: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_remote: bool,
}

/// Averaged coordinates for one postal code, plus whether any locality under
/// it is flagged remote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub is_remote: bool,
}

/// Collapses all postal-zone rows for one code into a single point.
///
/// Rows are grouped by district; latitude/longitude are averaged within the
/// group and a district is remote if any of its rows is. A postal code that
/// spans several districts resolves to the lexicographically smallest
/// district name, so repeated quotes for the same code always pick the same
/// point. Returns `None` when no rows match the code.
pub fn resolve_point(rows: &[PostalZoneRow]) -> Option<GeoPoint> {
    let mut districts: BTreeMap<&str, (f64, f64, u32, bool)> = BTreeMap::new();
    for row in rows {
        let entry = districts
            .entry(row.district.as_str())
            .or_insert((0.0, 0.0, 0, false));
        entry.0 += row.latitude;
        entry.1 += row.longitude;
        entry.2 += 1;
        entry.3 |= row.is_remote;
    }
    districts
        .into_values()
        .next()
        .map(|(lat_sum, lon_sum, count, is_remote)| GeoPoint {
            lat: lat_sum / count as f64,
            lon: lon_sum / count as f64,
            is_remote,
        })
}

/// Great-circle distance between two points in kilometers.
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    InsideArea,
    NearArea,
    OutsideArea,
    RemoteArea,
}

impl Zone {
    /// Tariff-table key and response label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::InsideArea => "Inside Area",
            Zone::NearArea => "Near Area",
            Zone::OutsideArea => "Outside Area",
            Zone::RemoteArea => "Remote Area",
        }
    }

    /// Flat per-zone charge used as the floor of the computed fee.
    pub fn flat_charge(&self) -> i64 {
        match self {
            Zone::InsideArea => 70,
            Zone::NearArea => 100,
            Zone::OutsideArea => 120,
            Zone::RemoteArea => 200,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remoteness of the buyer overrides proximity, even at zero distance.
pub fn classify_distance(distance_km: f64, buyer_remote: bool) -> Zone {
    if buyer_remote {
        Zone::RemoteArea
    } else if distance_km <= INSIDE_MAX_KM {
        Zone::InsideArea
    } else if distance_km <= NEAR_MAX_KM {
        Zone::NearArea
    } else {
        Zone::OutsideArea
    }
}

pub fn classify(seller: &GeoPoint, buyer: &GeoPoint) -> Zone {
    classify_distance(haversine_km(seller, buyer), buyer.is_remote)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(district: &str, lat: f64, lon: f64, remote: bool) -> PostalZoneRow {
        PostalZoneRow {
            postal_code: "1207".into(),
            district: district.into(),
            thana: "Mohammadpur".into(),
            latitude: lat,
            longitude: lon,
            is_remote: remote,
        }
    }

    #[test]
    fn resolve_averages_within_district() {
        let rows = vec![
            row("Dhaka", 23.75, 90.36, false),
            row("Dhaka", 23.77, 90.38, false),
        ];
        let p = resolve_point(&rows).unwrap();
        assert!((p.lat - 23.76).abs() < 1e-9);
        assert!((p.lon - 90.37).abs() < 1e-9);
        assert!(!p.is_remote);
    }

    #[test]
    fn resolve_any_remote_row_marks_point_remote() {
        let rows = vec![
            row("Dhaka", 23.75, 90.36, false),
            row("Dhaka", 23.77, 90.38, true),
        ];
        assert!(resolve_point(&rows).unwrap().is_remote);
    }

    #[test]
    fn resolve_multi_district_picks_smallest_name() {
        let rows = vec![
            row("Gazipur", 24.0, 90.4, true),
            row("Dhaka", 23.75, 90.36, false),
        ];
        let p = resolve_point(&rows).unwrap();
        assert!((p.lat - 23.75).abs() < 1e-9);
        assert!(!p.is_remote);
    }

    #[test]
    fn resolve_no_rows_is_none() {
        assert!(resolve_point(&[]).is_none());
    }

    #[test]
    fn haversine_known_distance() {
        // Dhaka to Chattogram, roughly 215 km.
        let dhaka = GeoPoint { lat: 23.8103, lon: 90.4125, is_remote: false };
        let ctg = GeoPoint { lat: 22.3569, lon: 91.7832, is_remote: false };
        let d = haversine_km(&dhaka, &ctg);
        assert!((200.0..230.0).contains(&d), "got {d}");
    }

    #[test]
    fn haversine_zero_for_same_point() {
        let p = GeoPoint { lat: 23.8, lon: 90.4, is_remote: false };
        assert_eq!(haversine_km(&p, &p), 0.0);
    }

    #[test]
    fn classify_boundaries() {
        assert_eq!(classify_distance(20.0, false), Zone::InsideArea);
        assert_eq!(classify_distance(20.0001, false), Zone::NearArea);
        assert_eq!(classify_distance(50.0, false), Zone::NearArea);
        assert_eq!(classify_distance(50.0001, false), Zone::OutsideArea);
    }

    #[test]
    fn classify_remote_overrides_proximity() {
        assert_eq!(classify_distance(5.0, true), Zone::RemoteArea);
        assert_eq!(classify_distance(0.0, true), Zone::RemoteArea);
    }
}
