//! Near-duplicate feature clustering.
//!
//! Resolved features of the same precursor can be detected more than
//! once at slightly shifted coordinates. This pass merges detections
//! that fall within the configured m/z and retention time tolerances at
//! identical charge, keeping the highest quality representative of each
//! cluster.

use ordered_float::OrderedFloat;

use crate::feature::params::FeatureParams;

/// Merge near-duplicate features within tolerance.
///
/// Rows are sorted by (mz, charge, rt) and swept once left to right over
/// a consumed-marker vector. Each unconsumed row anchors a cluster; later
/// rows inside the anchor's m/z band that also match in retention time
/// and charge are consumed into the cluster, and the member with the
/// highest quality score becomes its representative. Since m/z is the
/// primary sort key, the scan for an anchor stops as soon as a candidate
/// sits at or beyond the band edge.
///
/// Rows inside the band that differ in charge or retention time are
/// skipped, stay unconsumed and anchor their own clusters later. Two
/// duplicate features separated by such an interleaved row can therefore
/// stay unmerged; callers should treat the output as deduplicated per
/// anchor, not globally transitive.
pub fn cluster_features(mut rows: Vec<Vec<f64>>, params: &FeatureParams) -> Vec<Vec<f64>> {
    rows.sort_by_key(|row| {
        (
            OrderedFloat(row[params.mz_index]),
            OrderedFloat(row[params.z_index]),
            OrderedFloat(row[params.rt_index]),
        )
    });

    let total = rows.len();
    let mut consumed = vec![false; total];
    let mut representatives = Vec::new();

    for anchor in 0..total {
        if consumed[anchor] {
            continue;
        }
        consumed[anchor] = true;

        let mz = rows[anchor][params.mz_index];
        let rt = rows[anchor][params.rt_index];
        let z = rows[anchor][params.z_index];
        let mz_lo = mz * (1.0 - params.mz_error);
        let mz_hi = mz * (1.0 + params.mz_error);

        let mut representative = anchor;
        let mut best_score = rows[anchor][params.quality_index];

        for candidate in anchor + 1..total {
            if consumed[candidate] {
                continue;
            }
            let mz_c = rows[candidate][params.mz_index];
            let rt_c = rows[candidate][params.rt_index];
            let z_c = rows[candidate][params.z_index];

            if mz_c <= mz_hi
                && mz_c >= mz_lo
                && rt_c >= rt - params.rt_error
                && rt_c <= rt + params.rt_error
                && z_c == z
            {
                let score = rows[candidate][params.quality_index];
                if score > best_score {
                    best_score = score;
                    representative = candidate;
                }
                consumed[candidate] = true;
            } else if mz_c >= mz_hi || mz_c <= mz_lo {
                break;
            }
        }

        representatives.push(rows[representative].clone());
    }

    log::info!(
        "feature clustering kept {} of {} rows",
        representatives.len(),
        total
    );
    representatives
}
