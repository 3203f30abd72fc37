//! Charge state selection for scored isotope envelopes.
//!
//! The upstream model scores every isotope row of every charge state
//! hypothesis. This pass resolves coincident detections of the same
//! precursor under competing charge states and rejects hypotheses whose
//! surviving isotope series is too sparse or fragmented to be trusted.

use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::feature::params::FeatureParams;

/// A feature row with its validity tracked beside the score.
///
/// A row arriving with its model score equal to the configured invalid
/// value starts out excluded.
struct ScoredRow {
    row: Vec<f64>,
    valid: bool,
}

/// A grouped charge state hypothesis, members in id order.
struct ScoredEnvelope {
    members: Vec<ScoredRow>,
}

/// Resolve competing charge state hypotheses and prune incomplete
/// envelopes.
///
/// Two ordered passes: coincident detections sharing exactly equal
/// (mz, rt) are reduced to the highest scoring hypothesis, then every
/// envelope must keep a gap-free run of at least two valid isotopes or
/// it is dropped entirely. Surviving rows carry their isotope count
/// rewritten to the length of the kept run, in id-block order.
pub fn select_charge_states(rows: Vec<Vec<f64>>, params: &FeatureParams) -> Vec<Vec<f64>> {
    let total = rows.len();
    let mut entries: Vec<ScoredRow> = rows
        .into_iter()
        .map(|row| {
            let valid = row[params.svr_index] != params.invalid_score;
            ScoredRow { row, valid }
        })
        .collect();

    deduplicate_coordinates(&mut entries, params);

    let mut selected = Vec::new();
    let mut accepted = 0usize;
    for envelope in group_scored(entries, params) {
        if let Some(mut kept) = trim_valid_run(envelope, params) {
            accepted += 1;
            selected.append(&mut kept);
        }
    }

    log::info!(
        "charge state selection accepted {} envelopes, kept {} of {} isotope rows",
        accepted,
        selected.len(),
        total
    );
    selected
}

/// Reduce every maximal run of rows sharing exactly equal (mz, rt) to a
/// single valid hypothesis, the one with the highest model score. Ties
/// keep the first row encountered.
fn deduplicate_coordinates(entries: &mut [ScoredRow], params: &FeatureParams) {
    entries.sort_by_key(|entry| {
        (
            OrderedFloat(entry.row[params.mz_index]),
            OrderedFloat(entry.row[params.rt_index]),
        )
    });

    let mut start = 0;
    while start < entries.len() {
        let mz = entries[start].row[params.mz_index];
        let rt = entries[start].row[params.rt_index];
        let mut end = start + 1;
        while end < entries.len()
            && entries[end].row[params.mz_index] == mz
            && entries[end].row[params.rt_index] == rt
        {
            end += 1;
        }

        if end - start > 1 {
            let mut best = start;
            for candidate in start + 1..end {
                if entries[candidate].row[params.svr_index] > entries[best].row[params.svr_index] {
                    best = candidate;
                }
            }
            for loser in start..end {
                if loser != best {
                    entries[loser].valid = false;
                }
            }
        }
        start = end;
    }
}

/// Restore envelope contiguity and group rows into explicit hypothesis
/// aggregates by the id column.
fn group_scored(mut entries: Vec<ScoredRow>, params: &FeatureParams) -> Vec<ScoredEnvelope> {
    entries.sort_by_key(|entry| OrderedFloat(entry.row[params.id_index]));

    let grouped = entries
        .into_iter()
        .chunk_by(|entry| entry.row[params.id_index] as i64);

    let mut envelopes = Vec::new();
    for (_, members) in &grouped {
        envelopes.push(ScoredEnvelope {
            members: members.collect(),
        });
    }
    envelopes
}

/// Keep an envelope only if its valid rows form a gap-free run of at
/// least two isotopes. The kept rows get their isotope count rewritten
/// to the run length; everything else in the envelope is discarded.
fn trim_valid_run(envelope: ScoredEnvelope, params: &FeatureParams) -> Option<Vec<Vec<f64>>> {
    let members = envelope.members;
    let fst = members.iter().position(|entry| entry.valid)?;
    let last = members.iter().rposition(|entry| entry.valid)?;
    if fst >= last || !members[fst..=last].iter().all(|entry| entry.valid) {
        return None;
    }

    let count = (last - fst + 1) as f64;
    let mut kept: Vec<Vec<f64>> = members
        .into_iter()
        .skip(fst)
        .take(last - fst + 1)
        .map(|entry| entry.row)
        .collect();
    for row in &mut kept {
        row[params.isonum_index] = count;
    }
    Some(kept)
}
