//! Applying a diff back onto its previous snapshot.

use crate::errors::{DiffError, Error, Result};
use crate::positions::{InstrumentId, Snapshot};

use super::{ChangeRecord, Diff};

/// Applies `diff` to `previous`: inserts added positions, deletes removed
/// ones and replaces each modified position with its stored current state.
///
/// Fails with `ReconstructionMismatch` when the diff does not apply cleanly,
/// i.e. it adds an instrument `previous` already holds, or removes or
/// modifies one it does not hold in the recorded state.
pub fn reconstruct(previous: &Snapshot, diff: &Diff) -> Result<Snapshot> {
    let profile_id = previous.profile_id.clone();
    let captured_at = previous.captured_at;
    let mut positions = previous.clone().into_positions();
    let mut conflicts: Vec<InstrumentId> = Vec::new();

    for removed in &diff.removed {
        let held_as_recorded = positions
            .get(&removed.instrument_id)
            .is_some_and(|held| held.is_same_holding(removed));
        if held_as_recorded {
            positions.remove(&removed.instrument_id);
        } else {
            conflicts.push(removed.instrument_id.clone());
        }
    }

    for modified in &diff.modified {
        match positions.get_mut(&modified.instrument_id) {
            Some(held) if held.is_same_holding(&modified.previous) => {
                *held = modified.current.clone();
            }
            _ => conflicts.push(modified.instrument_id.clone()),
        }
    }

    for added in &diff.added {
        if positions.contains_key(&added.instrument_id) {
            conflicts.push(added.instrument_id.clone());
        } else {
            positions.insert(added.instrument_id.clone(), added.clone());
        }
    }

    if !conflicts.is_empty() {
        return Err(mismatch(&profile_id, conflicts));
    }

    Ok(Snapshot::from_map(profile_id, captured_at, positions))
}

/// Self-check: reconstructs `current` from `previous` and `diff` and fails
/// with `ReconstructionMismatch` unless the result holds exactly what
/// `current` holds.
pub fn verify_reconstruction(previous: &Snapshot, diff: &Diff, current: &Snapshot) -> Result<()> {
    let rebuilt = reconstruct(previous, diff)?;
    let mismatched = rebuilt.mismatched_instruments(current);
    if mismatched.is_empty() {
        Ok(())
    } else {
        Err(mismatch(&current.profile_id, mismatched))
    }
}

impl ChangeRecord {
    /// Rebuilds the snapshot this record was derived from, stamped with the
    /// record's current timestamp.
    pub fn reconstruct(&self, previous: &Snapshot) -> Result<Snapshot> {
        let rebuilt = reconstruct(previous, &self.diff)?;
        Ok(Snapshot::from_map(
            self.profile_id.clone(),
            self.current_at,
            rebuilt.into_positions(),
        ))
    }
}

fn mismatch(profile_id: &str, mut instruments: Vec<InstrumentId>) -> Error {
    instruments.sort();
    instruments.dedup();
    DiffError::ReconstructionMismatch {
        profile_id: profile_id.to_string(),
        instruments: instruments.iter().map(|id| id.to_string()).collect(),
    }
    .into()
}
