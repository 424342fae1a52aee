//! NetCDF subset payloads read through libnetcdf.
//!
//! libnetcdf only opens paths, so the payload is written to a temp file first.
//! On Linux that file lives in `/dev/shm` when it is writable.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use netcdf::AttributeValue;
use tempfile::NamedTempFile;

/// libnetcdf's default fill for float variables without `_FillValue`.
const NC_FILL_FLOAT: f64 = 9.969_209_968_386_869e36;

/// Fill sentinels and linear packing declared on a variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Packing {
    pub sentinels: Vec<f64>,
    pub scale: f64,
    pub offset: f64,
}

impl Default for Packing {
    fn default() -> Self {
        Self {
            sentinels: vec![NC_FILL_FLOAT],
            scale: 1.0,
            offset: 0.0,
        }
    }
}

impl Packing {
    /// Sentinel and NaN cells become NaN; everything else is unpacked.
    pub fn unpack(&self, raw: Vec<f64>) -> Vec<f64> {
        raw.into_iter()
            .map(|value| {
                let masked = self
                    .sentinels
                    .iter()
                    .any(|&sentinel| is_sentinel(value, sentinel));
                if value.is_nan() || masked {
                    f64::NAN
                } else {
                    value * self.scale + self.offset
                }
            })
            .collect()
    }
}

fn is_sentinel(value: f64, sentinel: f64) -> bool {
    if value == sentinel {
        return true;
    }
    // Float payloads widened to f64 only match the sentinel at f32 precision.
    (value as f32) == (sentinel as f32) && sentinel.abs() > 1e30
}

/// One variable as stored: full shape, raw values and their packing.
#[derive(Clone, Debug)]
pub struct RawVariable {
    pub name: String,
    pub shape: Vec<usize>,
    pub values: Vec<f64>,
    pub packing: Packing,
}

pub struct NetcdfPayload {
    file: netcdf::File,
    _temp: NamedTempFile,
}

impl NetcdfPayload {
    pub fn open(payload: &[u8]) -> Result<Self> {
        let mut temp = tempfile::Builder::new()
            .prefix("risk_subset_")
            .suffix(".nc")
            .tempfile_in(optimal_temp_dir())
            .context("Failed to create temp file for NetCDF payload")?;
        temp.write_all(payload)
            .context("Failed to write NetCDF payload")?;
        temp.flush().context("Failed to flush NetCDF payload")?;

        let file = netcdf::open(temp.path())
            .map_err(|error| anyhow!("Failed to open NetCDF payload: {error}"))?;
        Ok(Self { file, _temp: temp })
    }

    pub fn read_variable(&self, name: &str) -> Result<RawVariable> {
        let variable = self
            .file
            .variable(name)
            .ok_or_else(|| anyhow!("Variable {name} missing from NetCDF payload"))?;

        let shape: Vec<usize> = variable.dimensions().iter().map(|dim| dim.len()).collect();
        let values: Vec<f64> = variable
            .get_values(..)
            .map_err(|error| anyhow!("Failed to read {name}: {error}"))?;

        Ok(RawVariable {
            name: name.to_string(),
            shape,
            values,
            packing: read_packing(&variable),
        })
    }
}

fn read_packing(variable: &netcdf::Variable) -> Packing {
    let mut packing = Packing::default();
    let fill = numeric_attr(variable, "_FillValue");
    if !fill.is_empty() {
        packing.sentinels = fill.into_iter().take(1).collect();
    }
    packing
        .sentinels
        .extend(numeric_attr(variable, "missing_value"));
    if let Some(&scale) = numeric_attr(variable, "scale_factor").first() {
        packing.scale = scale;
    }
    if let Some(&offset) = numeric_attr(variable, "add_offset").first() {
        packing.offset = offset;
    }
    packing
}

/// Checking first keeps HDF5 from logging lookups of absent attributes.
fn has_attr(variable: &netcdf::Variable, name: &str) -> bool {
    variable.attributes().any(|attr| attr.name() == name)
}

fn numeric_attr(variable: &netcdf::Variable, name: &str) -> Vec<f64> {
    if !has_attr(variable, name) {
        return Vec::new();
    }
    let Some(Ok(value)) = variable.attribute_value(name) else {
        return Vec::new();
    };
    match value {
        AttributeValue::Doubles(values) => values,
        AttributeValue::Floats(values) => values.into_iter().map(f64::from).collect(),
        AttributeValue::Ints(values) => values.into_iter().map(f64::from).collect(),
        AttributeValue::Shorts(values) => values.into_iter().map(f64::from).collect(),
        AttributeValue::Schars(values) => values.into_iter().map(f64::from).collect(),
        AttributeValue::Uchars(values) => values.into_iter().map(f64::from).collect(),
        AttributeValue::Ushorts(values) => values.into_iter().map(f64::from).collect(),
        AttributeValue::Uints(values) => values.into_iter().map(f64::from).collect(),
        scalar => f64::try_from(scalar).ok().into_iter().collect(),
    }
}

fn optimal_temp_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let shm = std::path::Path::new("/dev/shm");
        if shm.is_dir()
            && tempfile::Builder::new()
                .prefix(".risk_write_check_")
                .tempfile_in(shm)
                .is_ok()
        {
            return shm.to_path_buf();
        }
    }
    std::env::temp_dir()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use netcdf::AttributeValue;

    pub(crate) struct TestVar {
        pub(crate) name: &'static str,
        pub(crate) dims: Vec<&'static str>,
        pub(crate) values: Vec<f32>,
        pub(crate) attributes: Vec<(&'static str, AttributeValue)>,
    }

    impl TestVar {
        pub(crate) fn float(name: &'static str, dims: Vec<&'static str>, values: Vec<f32>) -> Self {
            Self {
                name,
                dims,
                values,
                attributes: Vec::new(),
            }
        }

        pub(crate) fn with_attr(mut self, name: &'static str, value: impl Into<AttributeValue>) -> Self {
            self.attributes.push((name, value.into()));
            self
        }
    }

    /// Writes a NetCDF-4 file with the given dimensions and float variables and
    /// returns its bytes.
    pub(crate) fn encode(dims: &[(&str, usize)], vars: &[TestVar]) -> Vec<u8> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.nc");
        {
            let mut file = netcdf::create(&path).unwrap();
            for &(name, len) in dims {
                file.add_dimension(name, len).unwrap();
            }
            for var in vars {
                let mut variable = file.add_variable::<f32>(var.name, &var.dims).unwrap();
                for (name, value) in &var.attributes {
                    variable.put_attribute(name, value.clone()).unwrap();
                }
                variable.put_values(&var.values, ..).unwrap();
            }
        }
        std::fs::read(&path).unwrap()
    }
}
