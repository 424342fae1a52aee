use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::catalog::{build_subset_query_url, parse_catalog, subset_endpoint};
use crate::constants::{CAPE_VARIABLE, SRH_VARIABLE};
use crate::error::ProviderError;
use crate::http_client::{fetch_bytes, fetch_text};
use crate::decode::{NetcdfPayload, RawVariable};
use crate::types::{BoundingBox, Grid, GridPair};

/// Source of CAPE and SRH grids for a bounding box and valid time.
#[async_trait]
pub trait GridDataProvider: Send + Sync {
    async fn fetch(
        &self,
        bbox: &BoundingBox,
        valid_time: DateTime<Utc>,
    ) -> Result<GridPair, ProviderError>;
}

/// Fetches grids from a THREDDS server: catalog lookup, then a NetCDF subset
/// request for the two variables.
pub struct ThreddsProvider {
    http: Client,
    catalog_url: String,
    dataset_marker: String,
    timeout: Duration,
}

impl ThreddsProvider {
    pub fn new(http: Client, catalog_url: String, dataset_marker: String, timeout: Duration) -> Self {
        Self {
            http,
            catalog_url,
            dataset_marker,
            timeout,
        }
    }

    async fn fetch_grids(
        &self,
        bbox: &BoundingBox,
        valid_time: DateTime<Utc>,
    ) -> Result<GridPair, ProviderError> {
        let xml = fetch_text(&self.http, &self.catalog_url)
            .await
            .map_err(ProviderError::upstream)?;
        let catalog = parse_catalog(&xml).map_err(ProviderError::decode)?;
        debug!("Available datasets: {:?}", catalog.dataset_names());

        let dataset = catalog
            .select_dataset(&self.dataset_marker)
            .ok_or_else(|| ProviderError::DatasetNotFound(self.dataset_marker.clone()))?;
        info!("Using dataset: {}", dataset.name);

        let service_base = catalog.subset_service_base.as_deref().ok_or_else(|| {
            ProviderError::Decode(format!(
                "Catalog {} does not advertise a NetcdfSubset service",
                self.catalog_url
            ))
        })?;
        let url_path = dataset.url_path.as_deref().unwrap_or_default();
        let endpoint = subset_endpoint(&self.catalog_url, service_base, url_path)
            .map_err(ProviderError::decode)?;
        let query_url = build_subset_query_url(&endpoint, bbox, valid_time);
        debug!("Requesting subset {query_url}");

        let payload = fetch_bytes(&self.http, &query_url)
            .await
            .map_err(ProviderError::upstream)?;
        let (cape, srh) = tokio::task::spawn_blocking(move || decode_grids(&payload))
            .await
            .map_err(|error| ProviderError::Decode(format!("Grid decode task failed: {error}")))?
            .map_err(ProviderError::decode)?;

        GridPair::new(cape, srh)
    }
}

#[async_trait]
impl GridDataProvider for ThreddsProvider {
    async fn fetch(
        &self,
        bbox: &BoundingBox,
        valid_time: DateTime<Utc>,
    ) -> Result<GridPair, ProviderError> {
        let result = match tokio::time::timeout(self.timeout, self.fetch_grids(bbox, valid_time))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        };
        if let Err(error) = &result {
            warn!("Error fetching grid data: {error}");
        }
        result
    }
}

fn decode_grids(payload: &[u8]) -> anyhow::Result<(Grid, Grid)> {
    let file = NetcdfPayload::open(payload)?;
    let cape = squeeze_grid(file.read_variable(CAPE_VARIABLE)?)?;
    let srh = squeeze_grid(file.read_variable(SRH_VARIABLE)?)?;
    Ok((cape, srh))
}

/// Drops every length-1 dimension and masks fill values. Anything other than
/// a 2-D result is rejected.
fn squeeze_grid(variable: RawVariable) -> anyhow::Result<Grid> {
    let RawVariable {
        name,
        shape,
        values,
        packing,
    } = variable;
    let squeezed: Vec<usize> = shape.iter().copied().filter(|&len| len != 1).collect();
    let [rows, cols] = squeezed[..] else {
        anyhow::bail!("Variable {name} has shape {shape:?}; expected a 2-D grid after squeezing");
    };
    Grid::new(rows, cols, packing.unpack(values))
        .map_err(|error| error.context(format!("Variable {name}")))
}
