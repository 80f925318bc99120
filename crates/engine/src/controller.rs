// Path: crates/engine/src/controller.rs
//! Per-request orchestration and block-level bookkeeping (spec.md §4.8, C8):
//! assigns a reference, builds the response, folds the resulting updates
//! into history, and synthesizes the end-of-block reward transaction.

use crate::builders::{build_response, BuildContext};
use crate::runtime::{balance_field, decode_account_fields, decode_field};
use jarnet_crypto::hash::sha256;
use jarnet_store::{Store, StoreTransformation};
use jarnet_types::error::TransactionError;
use jarnet_types::gas::GasCosts;
use jarnet_types::reference::{StorageReference, TransactionReference};
use jarnet_types::request::TransactionRequest;
use jarnet_types::response::TransactionResponse;
use jarnet_types::response::Outcome;
use jarnet_types::update::Update;
use jarnet_types::value::{ClassType, FieldSignature, StorageType, StorageValue};
use std::collections::{BTreeMap, BTreeSet};

fn request_kind(request: &TransactionRequest) -> &'static str {
    match request {
        TransactionRequest::JarStoreInitial { .. } => "jar_store_initial",
        TransactionRequest::GameteCreation { .. } => "gamete_creation",
        TransactionRequest::Initialization { .. } => "initialization",
        TransactionRequest::JarStore { .. } => "jar_store",
        TransactionRequest::ConstructorCall { .. } => "constructor_call",
        TransactionRequest::InstanceMethodCall { .. } => "instance_method_call",
        TransactionRequest::StaticMethodCall { .. } => "static_method_call",
    }
}

fn outcome_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Successful { .. } | Outcome::VoidSuccessful => "successful",
        Outcome::ApplicationException { .. } => "application_exception",
        Outcome::Failed { .. } => "failed",
    }
}

/// `hash(request)` (spec.md §6.2): the reference a request is addressed by
/// once accepted, computed over [`TransactionRequest::bytes_for_hashing`].
pub fn reference_of(request: &TransactionRequest) -> TransactionReference {
    TransactionReference::new(sha256(&request.bytes_for_hashing()))
}

/// Accumulates per-block totals the end-of-block reward transaction is
/// computed from (spec.md §4.8: "gasConsumed, coins, coinsWithoutInflation,
/// numberOfRequests").
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockTotals {
    pub gas_consumed: u128,
    pub coins: u128,
    pub coins_without_inflation: u128,
    pub number_of_requests: u64,
}

impl BlockTotals {
    pub fn accumulate(&mut self, gas: &GasCosts, gas_price: u128) {
        let consumed = gas.consumed();
        self.gas_consumed += consumed;
        let paid = GasCosts::cost_of(consumed, gas_price);
        self.coins += paid;
        self.coins_without_inflation += paid;
        self.number_of_requests += 1;
    }
}

/// The per-request outcome the controller folds into a block: the accepted
/// response (or a bare rejection reason), plus the store writes it produced.
pub enum DeliveryOutcome {
    Accepted {
        reference: TransactionReference,
        response: TransactionResponse,
    },
    Rejected {
        reference: TransactionReference,
        reason: String,
    },
}

/// Builds, applies and folds one request into `txn` and `totals`, returning
/// which of the three outer dispositions (accepted / rejected) resulted.
/// `Failed`/`ApplicationException` outcomes still count as accepted: they
/// are recorded responses with their own updates, not out-of-band
/// rejections (spec.md §7).
pub fn deliver(ctx: &BuildContext, request: &TransactionRequest, txn: &mut StoreTransformation, totals: &mut BlockTotals) -> DeliveryOutcome {
    let reference = reference_of(request);
    let kind = request_kind(request);
    let metrics = jarnet_telemetry::sinks::service_metrics();

    match build_response(ctx, reference, request) {
        Ok(outcome) => {
            metrics.inc_requests_total(kind, outcome_label(&outcome.response.outcome));
            metrics.observe_gas_consumed(outcome.response.gas.consumed() as f64);
            tracing::debug!(reference = %reference, kind, "delivered request");

            txn.put_request(reference, request.clone());
            txn.put_response(reference, outcome.response.clone());
            for (obj, obj_txn) in group_by_object(&outcome.response.updates, reference) {
                let mut history = obj_txn;
                history.extend(ctx.store.get_history(&obj).unwrap_or_default());
                txn.set_history(obj, history);
            }
            txn.merge(outcome.side_effects);
            if let Some(manifest) = outcome.manifest {
                txn.set_manifest(manifest);
            }
            if let Some(common) = request.common() {
                totals.accumulate(&outcome.response.gas, common.gas_price);
            }
            DeliveryOutcome::Accepted { reference, response: outcome.response }
        }
        Err(TransactionError::Rejected(reason)) => {
            metrics.inc_requests_total(kind, "rejected");
            tracing::debug!(reference = %reference, kind, reason, "rejected request");
            DeliveryOutcome::Rejected { reference, reason }
        }
        Err(other) => {
            metrics.inc_requests_total(kind, "rejected");
            tracing::warn!(reference = %reference, kind, error = %other, "request build failed");
            DeliveryOutcome::Rejected { reference, reason: other.to_string() }
        }
    }
}

/// Groups a response's updates by the object they touch, each mapped to the
/// single new history entry (`reference`) to prepend ahead of that object's
/// existing history (spec.md §3: histories are newest-first).
fn group_by_object(updates: &[Update], reference: TransactionReference) -> BTreeMap<StorageReference, Vec<TransactionReference>> {
    let mut grouped: BTreeMap<StorageReference, Vec<TransactionReference>> = BTreeMap::new();
    for update in updates {
        grouped.entry(*update.object()).or_insert_with(|| vec![reference]);
    }
    grouped
}

/// Whether a reward transaction's resulting updates set contains only the
/// manifest-nonce update, in which case it is elided rather than committed
/// (spec.md §4.8: "if the resulting updates set contains only the
/// manifest-nonce update, elide it").
pub fn is_quiescent_reward(updates: &[Update], manifest_nonce_field_name: &str) -> bool {
    updates.iter().all(|u| matches!(u, Update::UpdateOfField { field, .. } if field.name == manifest_nonce_field_name))
}

/// The manifest's own nonce, bumped by every reward transaction regardless
/// of outcome so [`is_quiescent_reward`] has something to elide when there
/// is otherwise nothing to pay out.
fn manifest_class() -> ClassType {
    ClassType::new("io.jarnet.Manifest")
}

fn manifest_nonce_field() -> FieldSignature {
    FieldSignature::new(manifest_class(), "nonce", StorageType::Long)
}

/// Addresses the `Account` object a validator's reward share is credited
/// to. Validators have no creation transaction of their own to derive a
/// `StorageReference` from the way a gamete or externally-owned account
/// does (spec.md §6: they are named directly by public key), so this hashes
/// the key the same way every other object address in this store is a hash
/// (spec.md §3).
fn validator_account(public_key: &[u8; 32]) -> StorageReference {
    StorageReference::new(TransactionReference::new(sha256(public_key)), 0)
}

/// Synthesizes spec.md §4.8's end-of-block reward transaction: "a system
/// instance-method call to `validators.reward(coins, minted, behaving,
/// misbehaving, gasConsumed, numberOfRequests)` with the manifest as
/// caller". There is no modeled `validators` contract object to dispatch
/// that call against (spec.md §9: `DefaultRuntime` only implements the
/// well-known `Account` class), so this produces the observable effect such
/// a call would have on the part of the object model this crate does
/// track: crediting each behaving validator's account with an equal share
/// of the block's collected fees, and bumping the manifest's nonce so every
/// commit leaves a trace even when nothing was collected. Misbehaving
/// validators and `minted`/inflation accounting are out of this minimal
/// synthesis (spec.md's §9 scope note already excludes slashing/inflation
/// policy from the modeled runtime) — only the behaving-validator payout
/// spec.md's `reward(...)` signature names first is implemented.
///
/// Returns the reference the resulting updates should be recorded under if
/// [`is_quiescent_reward`] says they are not elided, and the updates
/// themselves.
pub fn build_reward(
    store: &Store,
    manifest: TransactionReference,
    time: u64,
    totals: &BlockTotals,
    behaving: &BTreeSet<[u8; 32]>,
) -> (TransactionReference, Vec<Update>) {
    let manifest_object = StorageReference::new(manifest, 0);
    let previous_nonce = match decode_field(store, &manifest_object, &manifest_nonce_field()) {
        Ok(Some(StorageValue::Long(n))) => n,
        _ => 0,
    };
    let mut updates = vec![Update::UpdateOfField {
        object: manifest_object,
        field: manifest_nonce_field(),
        value: StorageValue::Long(previous_nonce.saturating_add(1)),
    }];

    if totals.coins > 0 && !behaving.is_empty() {
        let share = (totals.coins / behaving.len() as u128).min(i64::MAX as u128) as i64;
        if share > 0 {
            for key in behaving {
                let account = validator_account(key);
                let current = match decode_account_fields(store, &account) {
                    Ok(fields) => match fields.get(&balance_field()) {
                        Some(StorageValue::Long(n)) => *n,
                        _ => 0,
                    },
                    Err(_) => 0,
                };
                updates.push(Update::UpdateOfField {
                    object: account,
                    field: balance_field(),
                    value: StorageValue::Long(current.saturating_add(share)),
                });
            }
        }
    }

    let reference = TransactionReference::new(sha256([manifest.as_bytes().as_slice(), time.to_be_bytes().as_slice()].concat()));
    (reference, updates)
}

/// Folds a non-elided reward transaction's updates into `txn`, the same way
/// [`deliver`] folds an ordinary accepted request's updates — minus
/// `put_request`, since a reward transaction has no submitted request to
/// record one against.
pub fn fold_reward(store: &Store, txn: &mut StoreTransformation, reference: TransactionReference, updates: Vec<Update>) {
    txn.put_response(reference, TransactionResponse::void_successful(updates.clone(), vec![], GasCosts::zero()));
    for (obj, obj_txn) in group_by_object(&updates, reference) {
        let mut history = obj_txn;
        history.extend(store.get_history(&obj).unwrap_or_default());
        txn.set_history(obj, history);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{balance_field, nonce_field, DefaultRuntime};
    use jarnet_crypto::sign::EmptyScheme;
    use jarnet_storage::MemoryBackend;
    use jarnet_types::config::NodeConfig;
    use jarnet_types::reference::TransactionReference;
    use jarnet_types::value::StorageValue;
    use jarnet_vm::DeterministicVerifier;
    use std::sync::Arc;

    fn config() -> NodeConfig {
        NodeConfig {
            dir: "/tmp/jarnet".into(),
            max_gas_per_view_transaction: 1_000_000,
            max_polling_attempts: 10,
            polling_delay_millis: 10,
            signature_for_requests: Default::default(),
            allow_unsigned_faucet: false,
            ignore_gas_price: false,
            initial_supply: 1_000_000_000_000_000_000_000,
            final_supply: 2_000_000_000_000_000_000_000,
            initial_red_supply: 0,
            initial_inflation: 0,
            initial_gas_price: 1,
            target_gas_at_reward: 1_000_000,
            oblivion: 250_000,
            max_error_length: 300,
            max_dependencies: 20,
            max_cumulative_size_of_dependencies: 10_000_000,
            ticket_for_new_poll: 100,
            percent_staked: 75,
            buyer_surcharge: 0,
            slashing_for_misbehaving: 1,
            slashing_for_not_behaving: 1,
            chain_id: "test".into(),
            genesis_time: 0,
            verification_version: 1,
        }
    }

    #[test]
    fn delivering_gamete_creation_records_history_and_manifest_is_untouched() {
        let backend: Arc<dyn jarnet_storage::NodeStoreBackend> = Arc::new(MemoryBackend::new());
        let store = jarnet_store::Store::new(backend);
        let mut bootstrap = StoreTransformation::new();
        bootstrap.set_manifest(TransactionReference::new([1u8; 32]));
        let store = store.commit(bootstrap).expect("bootstrap");

        let runtime = DefaultRuntime;
        let scheme = EmptyScheme;
        let verifier = DeterministicVerifier;
        let cfg = config();
        let ctx = BuildContext::new(&store, &cfg, &scheme, &verifier, &runtime);

        let request = TransactionRequest::GameteCreation {
            classpath: jarnet_types::request::Classpath::new(vec![]),
            initial_amount: jarnet_types::codec::bigint_to_bytes(1_000_000_000_000_000_000),
            public_key: vec![1, 2, 3],
        };

        let mut txn = StoreTransformation::new();
        let mut totals = BlockTotals::default();
        match deliver(&ctx, &request, &mut txn, &mut totals) {
            DeliveryOutcome::Accepted { reference, response } => {
                assert!(response.outcome.is_successful());
                let gamete = StorageReference::new(reference, 0);
                let committed = store.commit(txn).expect("commit");
                let history = committed.get_history(&gamete).expect("history");
                assert_eq!(history, vec![reference]);

                let stored = committed.get_response(&reference).expect("get").expect("present");
                let balance_update = stored.updates.iter().find(|u| matches!(u, Update::UpdateOfField { field, .. } if *field == balance_field()));
                assert_eq!(
                    balance_update,
                    Some(&Update::UpdateOfField { object: gamete, field: balance_field(), value: StorageValue::Long(1_000_000_000_000_000_000) })
                );
            }
            DeliveryOutcome::Rejected { reason, .. } => panic!("unexpected rejection: {reason}"),
        }
        assert_eq!(totals.number_of_requests, 0, "initial requests are free and untracked");
    }

    #[test]
    fn quiescent_reward_with_only_nonce_update_is_elided() {
        let object = StorageReference::new(TransactionReference::new([2u8; 32]), 0);
        let updates = vec![Update::UpdateOfField { object, field: nonce_field(), value: StorageValue::Long(1) }];
        assert!(is_quiescent_reward(&updates, "nonce"));

        let updates = vec![
            Update::UpdateOfField { object, field: nonce_field(), value: StorageValue::Long(1) },
            Update::UpdateOfField { object, field: balance_field(), value: StorageValue::Long(5) },
        ];
        assert!(!is_quiescent_reward(&updates, "nonce"));
    }

    #[test]
    fn reference_of_is_deterministic() {
        let request = TransactionRequest::JarStoreInitial { jar_bytes: vec![1, 2, 3] };
        assert_eq!(reference_of(&request), reference_of(&request));
    }

    #[test]
    fn reward_with_no_fees_and_no_behaving_validators_is_quiescent() {
        let backend: Arc<dyn jarnet_storage::NodeStoreBackend> = Arc::new(MemoryBackend::new());
        let store = jarnet_store::Store::new(backend);
        let mut bootstrap = StoreTransformation::new();
        bootstrap.set_manifest(TransactionReference::new([1u8; 32]));
        let store = store.commit(bootstrap).expect("bootstrap");

        let manifest = store.get_manifest().expect("manifest").expect("present");
        let totals = BlockTotals::default();
        let (_reference, updates) = build_reward(&store, manifest, 1_000, &totals, &BTreeSet::new());
        assert!(is_quiescent_reward(&updates, "nonce"));
    }

    #[test]
    fn reward_with_fees_credits_each_behaving_validator_equally() {
        let backend: Arc<dyn jarnet_storage::NodeStoreBackend> = Arc::new(MemoryBackend::new());
        let store = jarnet_store::Store::new(backend);
        let mut bootstrap = StoreTransformation::new();
        bootstrap.set_manifest(TransactionReference::new([1u8; 32]));
        let store = store.commit(bootstrap).expect("bootstrap");

        let manifest = store.get_manifest().expect("manifest").expect("present");
        let mut totals = BlockTotals::default();
        totals.coins = 100;
        let behaving: BTreeSet<[u8; 32]> = [[9u8; 32], [10u8; 32]].into_iter().collect();

        let (reference, updates) = build_reward(&store, manifest, 1_000, &totals, &behaving);
        assert!(!is_quiescent_reward(&updates, "nonce"));
        assert_eq!(updates.len(), 1 + behaving.len());
        for key in &behaving {
            let account = validator_account(key);
            let credit = updates.iter().find(|u| u.object() == &account);
            assert_eq!(credit, Some(&Update::UpdateOfField { object: account, field: balance_field(), value: StorageValue::Long(50) }));
        }

        let mut txn = StoreTransformation::new();
        fold_reward(&store, &mut txn, reference, updates);
        let committed = store.commit(txn).expect("commit");
        for key in &behaving {
            let account = validator_account(key);
            let history = committed.get_history(&account).expect("history");
            assert_eq!(history, vec![reference]);
        }
    }
}
