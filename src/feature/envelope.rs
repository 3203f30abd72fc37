use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::feature::params::FeatureParams;

/// One isotope envelope: the ordered run of rows sharing a charge state
/// hypothesis id.
#[derive(Clone, Debug)]
pub struct Envelope {
    pub id: i64,
    pub rows: Vec<Vec<f64>>,
}

impl Envelope {
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Group feature rows into envelopes by their id column.
///
/// Rows are stable-sorted by id first, so isotope rows of one hypothesis
/// end up contiguous even when an earlier stage reordered them. Group
/// boundaries come from the id column alone, never from the isotope
/// count field.
pub fn group_envelopes(mut rows: Vec<Vec<f64>>, params: &FeatureParams) -> Vec<Envelope> {
    rows.sort_by_key(|row| OrderedFloat(row[params.id_index]));

    let grouped = rows
        .into_iter()
        .chunk_by(|row| row[params.id_index] as i64);

    let mut envelopes = Vec::new();
    for (id, members) in &grouped {
        envelopes.push(Envelope {
            id,
            rows: members.collect(),
        });
    }
    envelopes
}

/// Collapse every envelope to its first row.
///
/// The first row of a hypothesis is its monoisotopic peak, which stands
/// in for the whole envelope downstream. Applying the reduction to its
/// own output is a no-op since every envelope is then a singleton.
pub fn reduce_envelopes(rows: Vec<Vec<f64>>, params: &FeatureParams) -> Vec<Vec<f64>> {
    group_envelopes(rows, params)
        .into_iter()
        .filter_map(|envelope| envelope.rows.into_iter().next())
        .collect()
}
