use log::debug;

use super::{Diff, ModifiedPosition};
use crate::errors::{Result, ValidationError};
use crate::positions::Snapshot;

/// Classifies every instrument of two same-profile snapshots as added,
/// removed, modified, or unchanged (omitted).
///
/// A position is modified when its quantity differs or its average price
/// differs by more than `PRICE_TOLERANCE`. P&L fields never count.
/// Output lists follow snapshot key order, so equal inputs always produce
/// equal output.
pub fn compute_diff(previous: &Snapshot, current: &Snapshot) -> Result<Diff> {
    if previous.profile_id != current.profile_id {
        return Err(ValidationError::ProfileMismatch {
            previous: previous.profile_id.clone(),
            current: current.profile_id.clone(),
        }
        .into());
    }

    let mut diff = Diff::default();

    for (instrument_id, position) in current.positions() {
        match previous.get(instrument_id) {
            None => diff.added.push(position.clone()),
            Some(prior) if !prior.is_same_holding(position) => diff
                .modified
                .push(ModifiedPosition::new(prior.clone(), position.clone())),
            Some(_) => {}
        }
    }

    for (instrument_id, position) in previous.positions() {
        if !current.contains(instrument_id) {
            diff.removed.push(position.clone());
        }
    }

    debug!(
        "Diff for {} ({} -> {}): +{} -{} ~{}",
        current.profile_id,
        previous.captured_at,
        current.captured_at,
        diff.added.len(),
        diff.removed.len(),
        diff.modified.len()
    );

    Ok(diff)
}
