use serde::Serialize;

use crate::constants::{
    ENH_THRESHOLD, HIGH_THRESHOLD, MDT_THRESHOLD, MRGL_THRESHOLD, SLGT_THRESHOLD,
};
use crate::geojson::{Feature, FeatureCollection};
use crate::types::{BoundingBox, GridPair};

/// Severe weather risk category, ordered from no risk to high risk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RiskLevel {
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "MRGL")]
    Marginal,
    #[serde(rename = "SLGT")]
    Slight,
    #[serde(rename = "ENH")]
    Enhanced,
    #[serde(rename = "MDT")]
    Moderate,
    #[serde(rename = "HIGH")]
    High,
}

const RISK_TABLE: [((f64, f64), RiskLevel); 5] = [
    (HIGH_THRESHOLD, RiskLevel::High),
    (MDT_THRESHOLD, RiskLevel::Moderate),
    (ENH_THRESHOLD, RiskLevel::Enhanced),
    (SLGT_THRESHOLD, RiskLevel::Slight),
    (MRGL_THRESHOLD, RiskLevel::Marginal),
];

/// NaN compares false against every threshold, so missing data is `None`.
pub fn classify_risk(cape: f64, srh: f64) -> RiskLevel {
    RISK_TABLE
        .iter()
        .find(|((min_cape, min_srh), _)| cape >= *min_cape && srh >= *min_srh)
        .map(|(_, level)| *level)
        .unwrap_or(RiskLevel::None)
}

/// Walks the grids row-major and emits a point per cell with risk above
/// `None`. Coordinates come from the cell index, not the cell center, so the
/// last row and column stop one step short of the north and east bounds.
pub fn grid_to_features(grids: &GridPair, bbox: &BoundingBox) -> FeatureCollection {
    let (rows, cols) = grids.shape();
    let lat_step = (bbox.north - bbox.south) / rows as f64;
    let lon_step = (bbox.east - bbox.west) / cols as f64;

    let mut features = Vec::new();
    for row in 0..rows {
        let lat = bbox.south + row as f64 * lat_step;
        for col in 0..cols {
            let lon = bbox.west + col as f64 * lon_step;
            let cape = grids.cape().at(row, col);
            let srh = grids.srh().at(row, col);
            let risk_level = classify_risk(cape, srh);
            if risk_level != RiskLevel::None {
                features.push(Feature::point(lon, lat, risk_level, cape, srh));
            }
        }
    }

    FeatureCollection::new(features)
}
