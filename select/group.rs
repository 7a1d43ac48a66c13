use crate::error::SelectionError;
use ahash::AHashMap;
use std::hash::Hash;

/// Assignment of every observation to exactly one group.
///
/// Selectors move groups as a unit: whenever one member is picked, all of
/// its group is picked with it, so no group ever straddles the
/// calibration/test boundary.
#[derive(Clone, Debug)]
pub struct GroupPartition {
    group_of: Vec<usize>,
    members: Vec<Vec<usize>>,
}

impl GroupPartition {
    /// Builds a partition from per-observation labels. Groups are numbered in
    /// order of first appearance.
    pub fn from_labels<T: Hash + Eq>(labels: &[T]) -> Self {
        let mut ids: AHashMap<&T, usize> = AHashMap::with_capacity(labels.len());
        let mut group_of = Vec::with_capacity(labels.len());
        for label in labels {
            let next = ids.len();
            group_of.push(*ids.entry(label).or_insert(next));
        }
        Self::from_ids(group_of)
    }

    /// Builds a partition from dense group ids (any `usize` values).
    pub fn from_ids(ids: Vec<usize>) -> Self {
        let mut remap: AHashMap<usize, usize> = AHashMap::new();
        let mut members: Vec<Vec<usize>> = Vec::new();
        let mut group_of = Vec::with_capacity(ids.len());
        for (obs, id) in ids.into_iter().enumerate() {
            let group = *remap.entry(id).or_insert_with(|| {
                members.push(Vec::new());
                members.len() - 1
            });
            members[group].push(obs);
            group_of.push(group);
        }
        Self { group_of, members }
    }

    /// Every observation in its own group.
    pub fn singletons(n: usize) -> Self {
        Self::from_ids((0..n).collect())
    }

    pub fn len(&self) -> usize {
        self.group_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.group_of.is_empty()
    }

    pub fn n_groups(&self) -> usize {
        self.members.len()
    }

    pub fn group_of(&self, index: usize) -> usize {
        self.group_of[index]
    }

    /// All observations sharing `index`'s group, `index` included, ascending.
    pub fn expand(&self, index: usize) -> &[usize] {
        &self.members[self.group_of[index]]
    }

    pub fn check_rows(&self, n_rows: usize) -> Result<(), SelectionError> {
        if self.len() != n_rows {
            return Err(SelectionError::Configuration(format!(
                "group partition covers {} observations but the sample matrix has {} rows",
                self.len(),
                n_rows
            )));
        }
        Ok(())
    }
}

/// Expands `index` to its group when a partition is active.
pub(crate) fn expand_or_single(group: Option<&GroupPartition>, index: usize) -> Vec<usize> {
    match group {
        Some(partition) => partition.expand(index).to_vec(),
        None => vec![index],
    }
}
