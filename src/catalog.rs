use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use url::Url;

use crate::constants::{CAPE_VARIABLE, NCSS_ACCEPT_FORMAT, NCSS_SERVICE_TYPE, SRH_VARIABLE};
use crate::types::BoundingBox;
use crate::utils::format_query_time;

#[derive(Clone, Debug, PartialEq)]
pub struct CatalogDataset {
    pub name: String,
    pub url_path: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    pub datasets: Vec<CatalogDataset>,
    pub subset_service_base: Option<String>,
}

impl Catalog {
    /// First dataset, in document order, whose name contains `marker`.
    pub fn select_dataset(&self, marker: &str) -> Option<&CatalogDataset> {
        self.datasets
            .iter()
            .filter(|dataset| dataset.url_path.is_some())
            .find(|dataset| dataset.name.contains(marker))
    }

    pub fn dataset_names(&self) -> Vec<&str> {
        self.datasets
            .iter()
            .map(|dataset| dataset.name.as_str())
            .collect()
    }
}

pub fn parse_catalog(xml: &str) -> Result<Catalog> {
    let datasets = parse_tag_attributes(xml, "dataset")?
        .into_iter()
        .filter_map(|mut attributes| {
            let name = attributes.remove("name")?;
            Some(CatalogDataset {
                name,
                url_path: attributes.remove("urlPath"),
            })
        })
        .collect();

    let subset_service_base = parse_tag_attributes(xml, "service")?
        .into_iter()
        .find(|attributes| {
            attributes
                .get("serviceType")
                .is_some_and(|kind| kind.eq_ignore_ascii_case(NCSS_SERVICE_TYPE))
        })
        .and_then(|mut attributes| attributes.remove("base"));

    Ok(Catalog {
        datasets,
        subset_service_base,
    })
}

/// Absolute subset endpoint for a dataset, resolved against the catalog URL
/// the same way THREDDS clients resolve service bases.
pub fn subset_endpoint(catalog_url: &str, service_base: &str, url_path: &str) -> Result<String> {
    let catalog = Url::parse(catalog_url)
        .with_context(|| format!("Invalid catalog URL {catalog_url}"))?;
    let mut base = catalog
        .join(service_base)
        .with_context(|| format!("Invalid subset service base {service_base}"))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let endpoint = base
        .join(url_path.trim_start_matches('/'))
        .with_context(|| format!("Invalid dataset path {url_path}"))?;
    Ok(endpoint.to_string())
}

pub fn build_subset_query_url(
    endpoint: &str,
    bbox: &BoundingBox,
    valid_time: DateTime<Utc>,
) -> String {
    format!(
        "{endpoint}?var={}&var={}&west={}&east={}&north={}&south={}&time={}&accept={}",
        urlencoding::encode(CAPE_VARIABLE),
        urlencoding::encode(SRH_VARIABLE),
        bbox.west,
        bbox.east,
        bbox.north,
        bbox.south,
        urlencoding::encode(&format_query_time(valid_time)),
        NCSS_ACCEPT_FORMAT,
    )
}

fn parse_tag_attributes(xml: &str, tag_name: &str) -> Result<Vec<HashMap<String, String>>> {
    let tag_regex = Regex::new(&format!(
        r"<(?:[\w-]+:)?{}\b([^>]*)>",
        regex::escape(tag_name)
    ))
    .with_context(|| format!("Failed to compile <{tag_name}> regex"))?;
    let attribute_regex = Regex::new(r#"([\w:.-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .context("Failed to compile attribute regex")?;
    let entity_regex = Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|lt|gt|quot|apos|amp);")
        .context("Failed to compile entity regex")?;

    Ok(tag_regex
        .captures_iter(xml)
        .filter_map(|captures| captures.get(1))
        .map(|body| {
            attribute_regex
                .captures_iter(body.as_str())
                .filter_map(|attribute| {
                    let key = attribute.get(1)?.as_str();
                    let value = attribute.get(2).or_else(|| attribute.get(3))?.as_str();
                    let key = key.rsplit(':').next().unwrap_or(key);
                    Some((key.to_string(), decode_xml_entities(&entity_regex, value)))
                })
                .collect()
        })
        .collect())
}

/// Single pass, so `&amp;lt;` stays `&lt;`. Unknown or invalid references are
/// kept verbatim.
fn decode_xml_entities(entity_regex: &Regex, value: &str) -> String {
    entity_regex
        .replace_all(value, |captures: &regex::Captures| {
            let entity = &captures[1];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                _ => {
                    let hex = entity
                        .strip_prefix("#x")
                        .or_else(|| entity.strip_prefix("#X"));
                    let code = match hex {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => entity.strip_prefix('#').and_then(|dec| dec.parse().ok()),
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded.map_or_else(|| captures[0].to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::constants::CONUS_BBOX;

    const SAMPLE_CATALOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog xmlns="http://www.unidata.ucar.edu/namespaces/thredds/InvCatalog/v1.0" xmlns:xlink="http://www.w3.org/1999/xlink" name="GFS-Global_0p25deg" version="1.0.6">
  <service name="GridServices" serviceType="Compound" base="">
    <service name="OPENDAP" serviceType="OpenDAP" base="/thredds/dodsC/" />
    <service name="ncss" serviceType="NetcdfSubset" base="/thredds/ncss/grid/" />
    <service name="wms" serviceType="WMS" base="/thredds/wms/" />
  </service>
  <dataset name="Full Collection (Reference / Forecast Time) Dataset" ID="grib/NCEP/GFS/Global_0p25deg/TwoD" urlPath="grib/NCEP/GFS/Global_0p25deg/TwoD">
    <serviceName>GridServices</serviceName>
  </dataset>
  <dataset name="Best GFS Quarter Degree Forecast Time Series" ID="grib/NCEP/GFS/Global_0p25deg/Best" urlPath="grib/NCEP/GFS/Global_0p25deg/Best">
    <serviceName>GridServices</serviceName>
  </dataset>
  <dataset name="Latest GFS &amp; friends" urlPath="grib/NCEP/GFS/Global_0p25deg/Latest" />
  <catalogRef xlink:href="/thredds/catalog/grib/NCEP/GFS/Global_0p25deg/files/catalog.xml" xlink:title="Files" name="" />
</catalog>"#;

    #[test]
    fn parses_datasets_in_document_order() {
        let catalog = parse_catalog(SAMPLE_CATALOG).unwrap();
        assert_eq!(
            catalog.dataset_names(),
            vec![
                "Full Collection (Reference / Forecast Time) Dataset",
                "Best GFS Quarter Degree Forecast Time Series",
                "Latest GFS & friends",
            ]
        );
        assert_eq!(
            catalog.subset_service_base.as_deref(),
            Some("/thredds/ncss/grid/")
        );
    }

    #[test]
    fn selects_first_dataset_containing_marker() {
        let catalog = parse_catalog(SAMPLE_CATALOG).unwrap();
        let dataset = catalog.select_dataset("GFS").unwrap();
        assert_eq!(dataset.name, "Best GFS Quarter Degree Forecast Time Series");
        assert_eq!(
            dataset.url_path.as_deref(),
            Some("grib/NCEP/GFS/Global_0p25deg/Best")
        );
    }

    #[test]
    fn marker_match_is_case_sensitive_and_has_no_fallback() {
        let catalog = parse_catalog(SAMPLE_CATALOG).unwrap();
        assert!(catalog.select_dataset("gfs").is_none());
        assert!(catalog.select_dataset("NAM").is_none());
    }

    #[test]
    fn numeric_character_references_are_decoded_before_matching() {
        let catalog = parse_catalog(
            r#"<catalog>
  <dataset name="Best &#71;FS&#x20;Series &#38;amp; more" urlPath="model/Best" />
  <dataset name="Bad &#xZZ; &#1114112; ref" urlPath="model/Bad" />
</catalog>"#,
        )
        .unwrap();
        assert_eq!(
            catalog.dataset_names(),
            vec!["Best GFS Series &amp; more", "Bad &#xZZ; &#1114112; ref"]
        );
        assert_eq!(
            catalog.select_dataset("GFS").map(|dataset| dataset.name.as_str()),
            Some("Best GFS Series &amp; more")
        );
    }

    #[test]
    fn empty_catalog_has_no_datasets() {
        let catalog = parse_catalog("<catalog></catalog>").unwrap();
        assert_eq!(catalog, Catalog::default());
    }

    #[test]
    fn subset_endpoint_resolves_against_catalog_host() {
        let endpoint = subset_endpoint(
            "https://thredds.ucar.edu/thredds/catalog/grib/NCEP/GFS/Global_0p25deg/catalog.xml",
            "/thredds/ncss/grid/",
            "grib/NCEP/GFS/Global_0p25deg/Best",
        )
        .unwrap();
        assert_eq!(
            endpoint,
            "https://thredds.ucar.edu/thredds/ncss/grid/grib/NCEP/GFS/Global_0p25deg/Best"
        );
    }

    #[test]
    fn subset_endpoint_tolerates_base_without_trailing_slash() {
        let endpoint =
            subset_endpoint("http://localhost:8080/thredds/catalog.xml", "/ncss", "/a/b").unwrap();
        assert_eq!(endpoint, "http://localhost:8080/ncss/a/b");
    }

    #[test]
    fn query_url_carries_variables_bbox_time_and_format() {
        let valid_time = Utc.with_ymd_and_hms(2024, 5, 20, 18, 0, 0).unwrap();
        let url = build_subset_query_url("https://host/ncss/Best", &CONUS_BBOX, valid_time);
        assert_eq!(
            url,
            "https://host/ncss/Best?var=Convective_available_potential_energy_surface\
             &var=Storm_relative_helicity_height_above_ground_layer\
             &west=-125&east=-66.93457&north=49.384358&south=24.396308\
             &time=2024-05-20T18%3A00%3A00Z&accept=netcdf4"
        );
    }
}
