use std::collections::HashSet;

use crate::config::{RowCount, UniqueField};
use crate::errors::SeedError;
use crate::seed::{reference_field, Ids, Record};

// Stride used to spread unique picks over the value list.
const UNIQUE_STRIDE: usize = 7919;

/// Builds the records of one node from the ids its dependencies published.
///
/// References are assigned in dependency order. With
/// [`RowCount::PerParent`] the first dependency is the parent: each of its
/// ids gets exactly `per_parent` consecutive records. Every other reference
/// cycles through the published ids.
///
/// Values of a unique field are never repeated within one factory. The set
/// of values already taken is owned by the factory, so two nodes never share
/// it.
#[derive(Debug)]
pub struct RecordFactory {
    kind: String,
    references: Vec<(String, Ids)>,
    unique: Option<UniquePicker>,
}

#[derive(Debug)]
struct UniquePicker {
    field: String,
    values: Vec<String>,
    taken: HashSet<usize>,
}

impl UniquePicker {
    /// Next free value, probing forward from a spread-out start index.
    fn pick(&mut self, sequence: usize) -> Option<String> {
        let len = self.values.len();
        if self.taken.len() >= len {
            return None;
        }

        let start = sequence.wrapping_mul(UNIQUE_STRIDE) % len;
        let index = (0..len)
            .map(|offset| (start + offset) % len)
            .find(|index| !self.taken.contains(index))?;
        self.taken.insert(index);
        Some(self.values[index].clone())
    }
}

impl RecordFactory {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            references: Vec::new(),
            unique: None,
        }
    }

    pub fn with_reference(mut self, dependency: impl Into<String>, ids: Ids) -> Self {
        self.references.push((dependency.into(), ids));
        self
    }

    pub fn with_unique_field(mut self, unique: &UniqueField) -> Self {
        self.unique = Some(UniquePicker {
            field: unique.name.clone(),
            values: unique.values.clone(),
            taken: HashSet::new(),
        });
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Number of records `rows` resolves to for the current references.
    pub fn row_count(&self, rows: RowCount) -> usize {
        let parents = self.references.first().map_or(0, |(_, ids)| ids.len());
        rows.resolve(parents)
    }

    pub fn build(&mut self, rows: RowCount) -> Result<Vec<Record>, SeedError> {
        let total = self.row_count(rows);
        if total == 0 {
            return Ok(Vec::new());
        }

        if let Some((dependency, _)) = self.references.iter().find(|(_, ids)| ids.is_empty()) {
            return Err(SeedError::NoReferences {
                kind: self.kind.clone(),
                dependency: dependency.clone(),
            });
        }

        if let Some(unique) = &self.unique {
            let available = unique.values.len() - unique.taken.len();
            if total > available {
                return Err(SeedError::UniqueValuesExhausted {
                    kind: self.kind.clone(),
                    field: unique.field.clone(),
                    wanted: total,
                    available,
                });
            }
        }

        let mut records = Vec::with_capacity(total);
        for sequence in 0..total {
            let mut record = Record::new(self.kind.as_str()).with_field("seq", sequence);

            for (position, (dependency, ids)) in self.references.iter().enumerate() {
                let index = match rows {
                    RowCount::PerParent(per_parent) if position == 0 => sequence / per_parent,
                    _ => sequence % ids.len(),
                };
                record.set(reference_field(dependency), ids[index]);
            }

            if let Some(unique) = self.unique.as_mut() {
                if let Some(value) = unique.pick(sequence) {
                    record.set(unique.field.clone(), value);
                }
            }

            records.push(record);
        }

        Ok(records)
    }
}
