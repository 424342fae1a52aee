use crate::types::BoundingBox;

pub const CONUS_BBOX: BoundingBox = BoundingBox {
    south: 24.396308,
    north: 49.384358,
    west: -125.0,
    east: -66.93457,
};

pub const DEFAULT_CATALOG_URL: &str =
    "https://thredds.ucar.edu/thredds/catalog/grib/NCEP/GFS/Global_0p25deg/catalog.xml";
pub const DEFAULT_DATASET_MARKER: &str = "GFS";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 60;

pub const CAPE_VARIABLE: &str = "Convective_available_potential_energy_surface";
pub const SRH_VARIABLE: &str = "Storm_relative_helicity_height_above_ground_layer";
pub const NCSS_ACCEPT_FORMAT: &str = "netcdf4";
pub const NCSS_SERVICE_TYPE: &str = "NetcdfSubset";

pub const DEFAULT_DAYS_PARAM: &str = "1";
pub const MODEL_CYCLE_HOURS: i64 = 12;
pub const INVALID_DAYS_MESSAGE: &str = "Invalid days parameter. Must be an integer";

// (min CAPE J/kg, min SRH m2/s2), highest category first.
pub const HIGH_THRESHOLD: (f64, f64) = (3000.0, 300.0);
pub const MDT_THRESHOLD: (f64, f64) = (2500.0, 250.0);
pub const ENH_THRESHOLD: (f64, f64) = (2000.0, 200.0);
pub const SLGT_THRESHOLD: (f64, f64) = (1500.0, 150.0);
pub const MRGL_THRESHOLD: (f64, f64) = (1000.0, 100.0);
