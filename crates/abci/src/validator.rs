// Path: crates/abci/src/validator.rs
//! Validator-set diffing (spec.md §4.9 `endBlock`, §6: "Validator public
//! keys use Ed25519 only; the add/remove/update operations map to the
//! engine's standard `ValidatorUpdate` messages with a `power` field
//! (0 = remove)").

use jarnet_types::error::AbciError;

/// One validator as currently recorded (in a beginBlock snapshot, or in the
/// manifest's `validators` sub-object).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorEntry {
    pub public_key: [u8; 32],
    pub power: u64,
}

/// One change to report to the consensus engine: `power == 0` removes the
/// validator, a new `public_key` adds one, and a changed `power` for an
/// existing key updates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorUpdate {
    pub public_key: [u8; 32],
    pub power: u64,
}

/// Diffs `before` (the snapshot captured at `beginBlock`) against `after`
/// (the validators currently named by the manifest), refusing a diff that
/// would leave `after` empty (spec.md §4.9: "refusing the diff if the new
/// set would be empty").
pub fn diff_validators(before: &[ValidatorEntry], after: &[ValidatorEntry]) -> Result<Vec<ValidatorUpdate>, AbciError> {
    if after.is_empty() {
        return Err(AbciError::EmptyValidatorSet);
    }

    let mut updates = Vec::new();
    for old in before {
        if !after.iter().any(|e| e.public_key == old.public_key) {
            updates.push(ValidatorUpdate { public_key: old.public_key, power: 0 });
        }
    }
    for new in after {
        match before.iter().find(|e| e.public_key == new.public_key) {
            None => updates.push(ValidatorUpdate { public_key: new.public_key, power: new.power }),
            Some(old) if old.power != new.power => updates.push(ValidatorUpdate { public_key: new.public_key, power: new.power }),
            Some(_) => {}
        }
    }
    Ok(updates)
}

/// Where `endBlock` reads "the validators currently in the manifest" from.
/// Resolving an arbitrary `validators` contract object's member list is out
/// of the engine's modeled scope (spec.md §9: the contract runtime only
/// implements the well-known `Account` class), so the bridge takes this as
/// an injected dependency rather than decoding it itself.
pub trait ValidatorSetSource: Send + Sync {
    fn current(&self) -> Vec<ValidatorEntry>;
}

/// A fixed validator set, for tests and single-validator deployments.
#[derive(Debug, Clone, Default)]
pub struct StaticValidatorSet(pub Vec<ValidatorEntry>);

impl ValidatorSetSource for StaticValidatorSet {
    fn current(&self) -> Vec<ValidatorEntry> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(byte: u8, power: u64) -> ValidatorEntry {
        ValidatorEntry { public_key: [byte; 32], power }
    }

    #[test]
    fn empty_target_set_is_refused() {
        let before = vec![entry(1, 10)];
        assert!(matches!(diff_validators(&before, &[]), Err(AbciError::EmptyValidatorSet)));
    }

    #[test]
    fn added_removed_and_changed_are_all_reported() {
        let before = vec![entry(1, 10), entry(2, 10)];
        let after = vec![entry(1, 20), entry(3, 5)];
        let mut updates = diff_validators(&before, &after).expect("diff");
        updates.sort_by_key(|u| u.public_key);
        assert_eq!(
            updates,
            vec![
                ValidatorUpdate { public_key: [1; 32], power: 20 },
                ValidatorUpdate { public_key: [2; 32], power: 0 },
                ValidatorUpdate { public_key: [3; 32], power: 5 },
            ]
        );
    }

    #[test]
    fn unchanged_validator_produces_no_update() {
        let before = vec![entry(1, 10)];
        let after = vec![entry(1, 10)];
        assert!(diff_validators(&before, &after).expect("diff").is_empty());
    }
}
