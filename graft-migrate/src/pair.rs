//! Grouping of raw artifacts into migration units.

use std::collections::{BTreeMap, HashSet};

use tracing::trace;

use crate::error::{MigrateResult, MigrationError};
use crate::file::{ArtifactName, DEFAULT_EXTENSION, RawArtifact};
use crate::migration::{Direction, MigrationId, MigrationUnit};

/// Discovered migration units, ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSet {
    units: BTreeMap<MigrationId, MigrationUnit>,
}

impl MigrationSet {
    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the set holds no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Look up a unit by id.
    pub fn get(&self, id: &MigrationId) -> Option<&MigrationUnit> {
        self.units.get(id)
    }

    /// Units in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &MigrationUnit> {
        self.units.values()
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &MigrationId> {
        self.units.keys()
    }

    /// Units whose id is not in `applied`, ascending.
    pub fn pending<'a>(&'a self, applied: &HashSet<&MigrationId>) -> Vec<&'a MigrationUnit> {
        self.units
            .values()
            .filter(|unit| !applied.contains(&unit.id))
            .collect()
    }

    /// Units missing one of their halves.
    pub fn incomplete(&self) -> impl Iterator<Item = &MigrationUnit> {
        self.units.values().filter(|unit| !unit.is_complete())
    }

    /// Ids whose half for `direction` is missing.
    pub fn missing(&self, direction: Direction) -> Vec<&MigrationId> {
        self.units
            .values()
            .filter(|unit| !unit.has(direction))
            .map(|unit| &unit.id)
            .collect()
    }
}

impl<'a> IntoIterator for &'a MigrationSet {
    type Item = &'a MigrationUnit;
    type IntoIter = std::collections::btree_map::Values<'a, MigrationId, MigrationUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.values()
    }
}

/// Pair raw artifacts using the default `sql` extension.
pub fn pair(raw: impl IntoIterator<Item = RawArtifact>) -> MigrateResult<MigrationSet> {
    pair_with_extension(raw, DEFAULT_EXTENSION)
}

/// Pair raw artifacts into units keyed by id.
///
/// The up file fills `apply_sql`, the down file fills `rollback_sql`. Files
/// that are not artifacts are ignored. Two artifacts sharing an id are a
/// [`MigrationError::DuplicateId`] when their names differ or when both claim
/// the same direction. The result does not depend on input order.
pub fn pair_with_extension(
    raw: impl IntoIterator<Item = RawArtifact>,
    extension: &str,
) -> MigrateResult<MigrationSet> {
    let mut units: BTreeMap<MigrationId, MigrationUnit> = BTreeMap::new();
    let mut origins: BTreeMap<MigrationId, String> = BTreeMap::new();

    // Sorting first keeps the reported duplicate pair stable across listings.
    let mut raw: Vec<RawArtifact> = raw.into_iter().collect();
    raw.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    for artifact in raw {
        let Some(parsed) = ArtifactName::parse(&artifact.file_name, extension)? else {
            trace!(file = %artifact.file_name, "Ignoring non-migration file");
            continue;
        };

        let unit = units
            .entry(parsed.id.clone())
            .or_insert_with(|| MigrationUnit::empty(parsed.id.clone(), parsed.name.clone()));

        let conflict = unit.name != parsed.name || !unit.set(parsed.direction, artifact.content);
        if conflict {
            let first = origins.get(&parsed.id).cloned().unwrap_or_default();
            return Err(MigrationError::DuplicateId {
                id: parsed.id,
                first,
                second: artifact.file_name,
            });
        }
        origins.entry(parsed.id).or_insert(artifact.file_name);
    }

    Ok(MigrationSet { units })
}
