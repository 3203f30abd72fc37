use serde::{Deserialize, Serialize};

use crate::feature::params::FeatureParams;

/// A fully resolved precursor feature as materialized by the finalize
/// pipeline, one per output row and in the same order, id included.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrecursorFeature {
    pub id: u32,
    pub mz: f64,
    pub rt: f64,
    pub charge: i32,
    pub isotope_num: u32,
    pub intensity_shape_score: f64,
    pub isotope_distribution_score: f64,
    pub intensity_window_avg: f64,
    pub intensity_area_percentage: f64,
    pub rt_start: f64,
    pub rt_end: f64,
    pub scan_num: f64,
    pub intensity_sum: f64,
    pub svr_score: f64,
    pub quality_score: f64,
}

impl PrecursorFeature {
    /// Build a record from a storage row, assigning the sequential
    /// output id.
    pub fn from_row(id: u32, row: &[f64], params: &FeatureParams) -> PrecursorFeature {
        PrecursorFeature {
            id,
            mz: row[params.mz_index],
            rt: row[params.rt_index],
            charge: row[params.z_index] as i32,
            isotope_num: row[params.isonum_index] as u32,
            intensity_shape_score: row[params.int_shape_index],
            isotope_distribution_score: row[params.iso_distr_index],
            intensity_window_avg: row[params.intensity_window_avg_index],
            intensity_area_percentage: row[params.intensity_area_percentage_index],
            rt_start: row[params.rt_start_index],
            rt_end: row[params.rt_end_index],
            scan_num: row[params.scan_num_index],
            intensity_sum: row[params.intensity_sum_index],
            svr_score: row[params.svr_index],
            quality_score: row[params.quality_index],
        }
    }
}
