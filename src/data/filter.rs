use std::collections::{BTreeMap, BTreeSet};

use super::model::{MetadataValue, SpectralDataset};

// ---------------------------------------------------------------------------
// Selection predicate: which values are accepted per metadata column
// ---------------------------------------------------------------------------

/// Per-column selection: maps column_name → set of accepted values.
/// A spectrum is selected when it matches every listed column.
pub type Selection = BTreeMap<String, BTreeSet<MetadataValue>>;

/// Selection accepting exactly one value in one column.
pub fn select_equal(column: &str, value: MetadataValue) -> Selection {
    BTreeMap::from([(column.to_string(), BTreeSet::from([value]))])
}

/// Return indices of spectra that pass every column of `selection`.
///
/// For each listed column:
/// * An empty value set accepts nothing
/// * A spectrum missing the column passes only if `Null` is accepted
/// * Otherwise the spectrum's value must be in the accepted set
pub fn selected_indices(dataset: &SpectralDataset, selection: &Selection) -> Vec<usize> {
    dataset
        .spectra
        .iter()
        .enumerate()
        .filter(|(_, sp)| {
            selection.iter().all(|(col, accepted)| match sp.metadata.get(col) {
                Some(value) => accepted.contains(value),
                None => accepted.contains(&MetadataValue::Null),
            })
        })
        .map(|(i, _)| i)
        .collect()
}
