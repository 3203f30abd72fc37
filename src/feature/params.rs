use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("missing parameter key {0}")]
    MissingKey(&'static str),
    #[error("invalid value {value:?} for parameter key {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("could not read parameter file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse parameter file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Column layout and tuning constants for the feature post-processing
/// pipelines.
///
/// Feature rows are stored as flat numeric vectors; every component reads
/// its fields through the indices collected here. The parameter set is
/// passed explicitly into each entry point, there is no process-wide
/// schema state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeatureParams {
    #[serde(rename = "ID_INDEX")]
    pub id_index: usize,
    #[serde(rename = "MZ_INDEX")]
    pub mz_index: usize,
    #[serde(rename = "RT_INDEX")]
    pub rt_index: usize,
    #[serde(rename = "Z_INDEX")]
    pub z_index: usize,
    #[serde(rename = "ISONUM_INDEX")]
    pub isonum_index: usize,
    #[serde(rename = "INT_SHAPE_INDEX")]
    pub int_shape_index: usize,
    #[serde(rename = "ISO_DISTR_INDEX")]
    pub iso_distr_index: usize,
    #[serde(rename = "INTENSITY_WINDOW_AVG_INDEX")]
    pub intensity_window_avg_index: usize,
    #[serde(rename = "INTENSITY_AREA_PERCENTAGE_INDEX")]
    pub intensity_area_percentage_index: usize,
    #[serde(rename = "RT_START_INDEX")]
    pub rt_start_index: usize,
    #[serde(rename = "RT_END_INDEX")]
    pub rt_end_index: usize,
    #[serde(rename = "SCAN_NUM_INDEX")]
    pub scan_num_index: usize,
    #[serde(rename = "INTENSITY_SUM_INDEX")]
    pub intensity_sum_index: usize,
    #[serde(rename = "SVR_INDEX")]
    pub svr_index: usize,
    #[serde(rename = "QUALITY_INDEX")]
    pub quality_index: usize,
    /// Model score value marking a row as excluded from consideration.
    #[serde(rename = "INVALID_VAL")]
    pub invalid_score: f64,
    /// Relative m/z tolerance for feature clustering.
    #[serde(rename = "MZ_ERROR")]
    pub mz_error: f64,
    /// Absolute retention time tolerance for feature clustering.
    #[serde(rename = "RT_ERROR")]
    pub rt_error: f64,
}

impl FeatureParams {
    /// Build the parameter set from a flat key/value map.
    ///
    /// Every key is required; a missing key or a non-numeric value fails
    /// before any row is processed.
    pub fn from_key_values(map: &HashMap<String, String>) -> Result<FeatureParams, ParamsError> {
        Ok(FeatureParams {
            id_index: index_value(map, "ID_INDEX")?,
            mz_index: index_value(map, "MZ_INDEX")?,
            rt_index: index_value(map, "RT_INDEX")?,
            z_index: index_value(map, "Z_INDEX")?,
            isonum_index: index_value(map, "ISONUM_INDEX")?,
            int_shape_index: index_value(map, "INT_SHAPE_INDEX")?,
            iso_distr_index: index_value(map, "ISO_DISTR_INDEX")?,
            intensity_window_avg_index: index_value(map, "INTENSITY_WINDOW_AVG_INDEX")?,
            intensity_area_percentage_index: index_value(map, "INTENSITY_AREA_PERCENTAGE_INDEX")?,
            rt_start_index: index_value(map, "RT_START_INDEX")?,
            rt_end_index: index_value(map, "RT_END_INDEX")?,
            scan_num_index: index_value(map, "SCAN_NUM_INDEX")?,
            intensity_sum_index: index_value(map, "INTENSITY_SUM_INDEX")?,
            svr_index: index_value(map, "SVR_INDEX")?,
            quality_index: index_value(map, "QUALITY_INDEX")?,
            invalid_score: float_value(map, "INVALID_VAL")?,
            mz_error: float_value(map, "MZ_ERROR")?,
            rt_error: float_value(map, "RT_ERROR")?,
        })
    }

    /// Load parameters from a properties file with one `KEY=VALUE` pair
    /// per line. Blank lines and lines starting with `#` are skipped.
    pub fn from_properties_file(path: &Path) -> Result<FeatureParams, ParamsError> {
        let text = fs::read_to_string(path)?;
        let mut map = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                map.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        FeatureParams::from_key_values(&map)
    }

    /// Load parameters from their JSON form, keyed like the properties
    /// surface.
    pub fn from_json_file(path: &Path) -> Result<FeatureParams, ParamsError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Number of columns a table row must have so that every referenced
    /// index is in bounds. The quality column only counts for tables
    /// produced by the second scoring stage.
    pub fn required_width(&self, with_quality: bool) -> usize {
        let mut widest = [
            self.id_index,
            self.mz_index,
            self.rt_index,
            self.z_index,
            self.isonum_index,
            self.int_shape_index,
            self.iso_distr_index,
            self.intensity_window_avg_index,
            self.intensity_area_percentage_index,
            self.rt_start_index,
            self.rt_end_index,
            self.scan_num_index,
            self.intensity_sum_index,
            self.svr_index,
        ]
        .into_iter()
        .max()
        .unwrap_or(0);
        if with_quality {
            widest = widest.max(self.quality_index);
        }
        widest + 1
    }
}

fn index_value(map: &HashMap<String, String>, key: &'static str) -> Result<usize, ParamsError> {
    let raw = map.get(key).ok_or(ParamsError::MissingKey(key))?;
    raw.parse::<usize>().map_err(|_| ParamsError::InvalidValue {
        key,
        value: raw.clone(),
    })
}

fn float_value(map: &HashMap<String, String>, key: &'static str) -> Result<f64, ParamsError> {
    let raw = map.get(key).ok_or(ParamsError::MissingKey(key))?;
    raw.parse::<f64>().map_err(|_| ParamsError::InvalidValue {
        key,
        value: raw.clone(),
    })
}
