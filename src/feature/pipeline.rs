//! The two post-processing pipelines.
//!
//! `select` takes the first-stage model scores and resolves one charge
//! state per precursor; `finalize` takes the second-stage quality scores
//! and produces the ranked, deduplicated feature list.

use std::cmp::Reverse;
use std::path::PathBuf;

use log::info;
use ordered_float::OrderedFloat;

use crate::feature::charge::select_charge_states;
use crate::feature::cluster::cluster_features;
use crate::feature::envelope::reduce_envelopes;
use crate::feature::params::FeatureParams;
use crate::feature::precursor::PrecursorFeature;
use crate::feature::table::{read_rows, write_rows, TableError};

pub const SVR_SCORE_SUFFIX: &str = "_svr_score";
pub const NN_SCORE_SUFFIX: &str = "_nn_score";
pub const ONE_CHARGE_FEATURE_SUFFIX: &str = "_feature_one_z";
pub const FEATURE_SUFFIX: &str = "_feature";

fn suffixed(stem: &str, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", stem, suffix))
}

/// Select one charge state per precursor and collapse the surviving
/// isotope envelopes.
///
/// Reads `<stem>_svr_score`, writes `<stem>_feature_one_z` without a
/// quality column. Any read or write failure aborts the pipeline with no
/// partial output.
pub fn select_features(stem: &str, params: &FeatureParams) -> Result<(), TableError> {
    let rows = read_rows(&suffixed(stem, SVR_SCORE_SUFFIX), params.required_width(false))?;
    info!("select: read {} scored isotope rows", rows.len());

    let selected = select_charge_states(rows, params);
    let reduced = reduce_envelopes(selected, params);

    info!("select: writing {} single charge features", reduced.len());
    write_rows(
        &suffixed(stem, ONE_CHARGE_FEATURE_SUFFIX),
        &reduced,
        params,
        false,
    )
}

/// Cluster near-duplicate features, rank them by quality score and
/// materialize the final feature list.
///
/// Reads `<stem>_nn_score`, writes `<stem>_feature` with a quality
/// column. The ranking is descending by quality score; ties keep their
/// relative order. The returned records mirror the written rows,
/// re-numbered ids included.
pub fn finalize_features(
    stem: &str,
    params: &FeatureParams,
) -> Result<Vec<PrecursorFeature>, TableError> {
    let rows = read_rows(&suffixed(stem, NN_SCORE_SUFFIX), params.required_width(true))?;
    info!("finalize: read {} feature rows", rows.len());

    let mut clustered = cluster_features(rows, params);
    clustered.sort_by_key(|row| Reverse(OrderedFloat(row[params.quality_index])));

    write_rows(&suffixed(stem, FEATURE_SUFFIX), &clustered, params, true)?;

    let features: Vec<PrecursorFeature> = clustered
        .iter()
        .enumerate()
        .map(|(index, row)| PrecursorFeature::from_row((index + 1) as u32, row, params))
        .collect();
    info!("finalize: materialized {} precursor features", features.len());
    Ok(features)
}
