//! GeoJSON payload for risk points.
//!
//! `serde_json` always writes `.` as the decimal separator and writes NaN
//! ("no data") as `null`, so formatting does not depend on process locale.

use serde::Serialize;

use crate::risk::RiskLevel;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub type_: &'static str,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            type_: "FeatureCollection",
            features,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub type_: &'static str,
    pub geometry: Point,
    pub properties: RiskProperties,
}

impl Feature {
    pub fn point(lon: f64, lat: f64, risk_level: RiskLevel, cape: f64, srh: f64) -> Self {
        Self {
            type_: "Feature",
            geometry: Point {
                type_: "Point",
                coordinates: [lon, lat],
            },
            properties: RiskProperties {
                risk_level,
                cape,
                srh,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Point {
    #[serde(rename = "type")]
    pub type_: &'static str,
    /// `[lon, lat]`
    pub coordinates: [f64; 2],
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RiskProperties {
    pub risk_level: RiskLevel,
    pub cape: f64,
    pub srh: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_serializes_as_geojson_point() {
        let collection = FeatureCollection::new(vec![Feature::point(
            -97.5,
            35.25,
            RiskLevel::Enhanced,
            2150.5,
            212.0,
        )]);
        let json = serde_json::to_value(&collection).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-97.5, 35.25] },
                    "properties": { "risk_level": "ENH", "cape": 2150.5, "srh": 212.0 }
                }]
            })
        );
    }

    #[test]
    fn empty_collection_has_empty_feature_list() {
        let json = serde_json::to_string(&FeatureCollection::new(Vec::new())).unwrap();
        assert_eq!(json, r#"{"type":"FeatureCollection","features":[]}"#);
    }

    #[test]
    fn missing_values_serialize_as_null() {
        let feature = Feature::point(0.0, 0.0, RiskLevel::Marginal, f64::NAN, 120.0);
        let json = serde_json::to_value(&feature).unwrap();
        assert!(json["properties"]["cape"].is_null());
        assert_eq!(json["properties"]["srh"], 120.0);
    }
}
