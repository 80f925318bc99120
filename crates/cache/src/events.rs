// Path: crates/cache/src/events.rs
//! Typed invalidation predicates over the class-tag updates a response
//! produces (spec.md §4.10: "Invalidation rules encoded as typed predicates
//! over event class names ... emitted by a trusted set of creators").

use jarnet_types::reference::{StorageReference, TransactionReference};
use jarnet_types::update::Update;
use std::collections::HashSet;

/// One class-tag update, reduced to the two things an invalidation rule
/// cares about: whose object it tags, and what class it becomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    pub object: StorageReference,
    pub class_name: String,
}

impl CacheEvent {
    fn from_update(update: &Update) -> Option<Self> {
        match update {
            Update::ClassTag { object, class_type } => Some(Self { object: *object, class_name: class_type.as_str().to_string() }),
            Update::UpdateOfField { .. } => None,
        }
    }
}

/// Reduces a response's updates to the `ClassTag` events among them.
pub fn events_of(updates: &[Update]) -> Vec<CacheEvent> {
    updates.iter().filter_map(CacheEvent::from_update).collect()
}

/// The well-known objects allowed to emit cache-invalidating events (spec.md
/// §4.10: "manifest/validators/gas-station/versions"). An event whose object
/// isn't created by one of these is never considered for invalidation, no
/// matter its class name.
#[derive(Debug, Clone, Default)]
pub struct TrustedCreators {
    creators: HashSet<TransactionReference>,
}

impl TrustedCreators {
    pub fn new(creators: impl IntoIterator<Item = TransactionReference>) -> Self {
        Self { creators: creators.into_iter().collect() }
    }

    fn trusts(&self, object: &StorageReference) -> bool {
        self.creators.contains(&object.creator)
    }
}

/// One cache's invalidation rule: the set of event class names that flip it.
#[derive(Debug, Clone, Copy)]
pub struct InvalidationRule {
    pub cache: &'static str,
    pub class_names: &'static [&'static str],
}

/// The three rules spec.md §4.10 names by name.
pub const CONSENSUS_RULE: InvalidationRule = InvalidationRule { cache: "consensus", class_names: &["ConsensusUpdateEvent"] };
pub const GAS_PRICE_RULE: InvalidationRule = InvalidationRule { cache: "gas_price", class_names: &["GasPriceUpdateEvent"] };
pub const INFLATION_RULE: InvalidationRule = InvalidationRule { cache: "inflation", class_names: &["InflationUpdateEvent"] };

pub const ALL_RULES: [InvalidationRule; 3] = [CONSENSUS_RULE, GAS_PRICE_RULE, INFLATION_RULE];

/// Which of `ALL_RULES`' caches must be invalidated given `events`, trusting
/// only events from `trusted`.
pub fn invalidated_caches(events: &[CacheEvent], trusted: &TrustedCreators) -> HashSet<&'static str> {
    let mut hit = HashSet::new();
    for event in events {
        if !trusted.trusts(&event.object) {
            continue;
        }
        for rule in ALL_RULES {
            if rule.class_names.contains(&event.class_name.as_str()) {
                hit.insert(rule.cache);
            }
        }
    }
    hit
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarnet_types::value::ClassType;

    fn object(creator_byte: u8) -> StorageReference {
        StorageReference::new(TransactionReference::new([creator_byte; 32]), 0)
    }

    #[test]
    fn untrusted_creator_is_ignored() {
        let trusted = TrustedCreators::new([TransactionReference::new([1; 32])]);
        let events = vec![CacheEvent { object: object(9), class_name: "ConsensusUpdateEvent".into() }];
        assert!(invalidated_caches(&events, &trusted).is_empty());
    }

    #[test]
    fn trusted_event_flips_the_matching_cache_only() {
        let trusted = TrustedCreators::new([TransactionReference::new([1; 32])]);
        let events = vec![CacheEvent { object: object(1), class_name: "GasPriceUpdateEvent".into() }];
        let hit = invalidated_caches(&events, &trusted);
        assert!(hit.contains("gas_price"));
        assert!(!hit.contains("consensus"));
        assert!(!hit.contains("inflation"));
    }

    #[test]
    fn events_of_skips_field_updates() {
        use jarnet_types::value::{FieldSignature, StorageType, StorageValue};
        let updates = vec![
            Update::ClassTag { object: object(1), class_type: ClassType::new("io.jarnet.Validators") },
            Update::UpdateOfField {
                object: object(1),
                field: FieldSignature::new(ClassType::new("io.jarnet.Validators"), "size", StorageType::Int),
                value: StorageValue::Int(3),
            },
        ];
        assert_eq!(events_of(&updates).len(), 1);
    }
}
