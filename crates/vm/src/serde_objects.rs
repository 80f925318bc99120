// Path: crates/vm/src/serde_objects.rs
//! Maps in-memory values to/from storage values, and reconstructs an
//! object's current state by walking its history (spec.md §4.5, C5).

use crate::classloader::ClassLoader;
use jarnet_store::Store;
use jarnet_types::error::SerdeObjectError;
use jarnet_types::reference::StorageReference;
use jarnet_types::update::Update;
use jarnet_types::value::{ClassType, FieldSignature, StorageValue};
use std::collections::HashMap;

/// A value as the running request sees it, before it is written into a
/// storage-typed [`Update`]. Basic/`String`/`BigInteger` values are already
/// storage-shaped; object references carry the referenced storage reference
/// directly (spec.md's bytecode runtime, which would hand us live heap
/// objects, is out of scope — the engine constructs this enum from whatever
/// it already resolved).
pub enum LiveValue {
    Basic(StorageValue),
    ObjectReference(StorageReference),
    Null,
    /// A value of a class with no recognized storage mapping.
    Unrepresentable(ClassType),
}

/// Serializes a [`LiveValue`] into the [`StorageValue`] recorded in an
/// update (spec.md §4.5 "Serialize").
pub fn serialize(value: &LiveValue) -> Result<StorageValue, SerdeObjectError> {
    match value {
        LiveValue::Basic(v) => Ok(v.clone()),
        LiveValue::ObjectReference(r) => Ok(StorageValue::Reference(Some(*r))),
        LiveValue::Null => Ok(StorageValue::Reference(None)),
        LiveValue::Unrepresentable(class) => Err(SerdeObjectError::IllegalArgument(class.to_string())),
    }
}

/// An object reconstructed from its history: its concrete class and its
/// eager fields, ordered superclass-first and then by field name (spec.md
/// §4.5 "Deserialize").
pub struct DeserializedObject {
    pub reference: StorageReference,
    pub class_type: ClassType,
    pub fields: Vec<(FieldSignature, StorageValue)>,
}

/// Walks `object`'s history newest-to-oldest, collecting the first update
/// seen for each eager field (newest wins) and the object's `ClassTag`, then
/// orders the result the way a synthesized deserialization constructor's
/// parameter list expects.
pub fn deserialize(store: &Store, loader: &ClassLoader, object: &StorageReference) -> Result<DeserializedObject, SerdeObjectError> {
    let history = store.get_history(object)?;
    if history.is_empty() {
        return Err(SerdeObjectError::MissingClassTag(object.to_string()));
    }

    let mut class_type: Option<ClassType> = None;
    let mut field_values: HashMap<FieldSignature, StorageValue> = HashMap::new();

    for tref in &history {
        let response = store
            .get_response(tref)?
            .ok_or_else(|| SerdeObjectError::MissingClassTag(object.to_string()))?;
        for update in &response.updates {
            if update.object() != object {
                continue;
            }
            match update {
                Update::ClassTag { class_type: ct, .. } => {
                    if class_type.is_none() {
                        class_type = Some(ct.clone());
                    }
                }
                Update::UpdateOfField { field, value, .. } => {
                    if field.is_eager() {
                        field_values.entry(field.clone()).or_insert_with(|| value.clone());
                    }
                }
            }
        }
    }

    let class_type = class_type.ok_or_else(|| SerdeObjectError::MissingClassTag(object.to_string()))?;
    let chain = loader.superclass_chain(&class_type);

    let mut fields = Vec::new();
    for class in &chain {
        let Ok(declaration) = loader.find_declaration(class) else {
            continue;
        };
        let mut own_fields: Vec<&FieldSignature> = declaration.fields.iter().filter(|f| f.is_eager()).collect();
        own_fields.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| format!("{:?}", a.field_type).cmp(&format!("{:?}", b.field_type))));
        for field in own_fields {
            let value = field_values
                .get(field)
                .cloned()
                .ok_or_else(|| SerdeObjectError::MissingEagerField(object.to_string(), field.name.clone()))?;
            fields.push((field.clone(), value));
        }
    }

    Ok(DeserializedObject {
        reference: *object,
        class_type,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classloader::{ClassLoader, ClassLoaderLimits};
    use crate::verifier::{ClassDeclaration, DeterministicVerifier, JarManifest};
    use jarnet_storage::{MemoryBackend, NodeStoreBackend};
    use jarnet_store::StoreTransformation;
    use jarnet_types::codec::to_bytes_canonical;
    use jarnet_types::gas::GasCosts;
    use jarnet_types::reference::TransactionReference;
    use jarnet_types::request::{Classpath, TransactionRequest};
    use jarnet_types::response::{JarStoreOutcome, TransactionResponse};
    use jarnet_types::value::StorageType;
    use std::sync::Arc;

    fn basic_field(class: &str, name: &str, ty: StorageType) -> FieldSignature {
        FieldSignature::new(ClassType::new(class), name, ty)
    }

    fn wallet_manifest() -> JarManifest {
        JarManifest {
            classes: vec![ClassDeclaration {
                class_type: ClassType::new("Wallet"),
                superclass: None,
                fields: vec![basic_field("Wallet", "balance", StorageType::Long)],
                constructors: vec![],
                methods: vec![],
                is_storage: true,
                is_contract: false,
                white_listed_methods: vec![],
            }],
            verification_version: 1,
        }
    }

    fn setup() -> (Store, ClassLoader) {
        let backend: Arc<dyn NodeStoreBackend> = Arc::new(MemoryBackend::new());
        let store = Store::new(backend);
        let jar_ref = TransactionReference::new([1u8; 32]);
        let manifest = wallet_manifest();
        let bytes = to_bytes_canonical(&manifest);

        let mut txn = StoreTransformation::new();
        txn.put_request(jar_ref, TransactionRequest::JarStoreInitial { jar_bytes: bytes.clone() });
        let mut response = TransactionResponse::void_successful(vec![], vec![], GasCosts::zero());
        response.jar_store = Some(JarStoreOutcome {
            instrumented_jar: bytes,
            dependencies: vec![],
            verification_version: 1,
        });
        txn.put_response(jar_ref, response);
        let store = store.commit(txn).expect("install jar");

        let limits = ClassLoaderLimits { max_dependencies: 20, max_cumulative_size: 10_000 };
        let (loader, txn) = ClassLoader::load(&store, &DeterministicVerifier, &Classpath::new(vec![jar_ref]), limits, 1)
            .expect("load");
        assert!(txn.is_empty());
        (store, loader)
    }

    #[test]
    fn deserializes_object_from_creation_update() {
        let (store, loader) = setup();
        let creator = TransactionReference::new([2u8; 32]);
        let object = StorageReference::new(creator, 0);

        let updates = vec![
            Update::ClassTag { object, class_type: ClassType::new("Wallet") },
            Update::UpdateOfField {
                object,
                field: basic_field("Wallet", "balance", StorageType::Long),
                value: StorageValue::Long(100),
            },
        ];
        let response = TransactionResponse::void_successful(updates, vec![], GasCosts::zero());

        let mut txn = StoreTransformation::new();
        txn.put_response(creator, response);
        txn.set_history(object, vec![creator]);
        let store = store.commit(txn).expect("commit");

        let deserialized = deserialize(&store, &loader, &object).expect("deserialize");
        assert_eq!(deserialized.class_type, ClassType::new("Wallet"));
        assert_eq!(deserialized.fields.len(), 1);
        assert_eq!(deserialized.fields[0].1, StorageValue::Long(100));
    }

    #[test]
    fn missing_class_tag_is_an_error() {
        let (store, loader) = setup();
        let object = StorageReference::new(TransactionReference::new([9u8; 32]), 0);
        assert!(deserialize(&store, &loader, &object).is_err());
    }

    #[test]
    fn newest_update_wins_for_a_field() {
        let (store, loader) = setup();
        let creator = TransactionReference::new([3u8; 32]);
        let updater = TransactionReference::new([4u8; 32]);
        let object = StorageReference::new(creator, 0);

        let creation = TransactionResponse::void_successful(
            vec![
                Update::ClassTag { object, class_type: ClassType::new("Wallet") },
                Update::UpdateOfField {
                    object,
                    field: basic_field("Wallet", "balance", StorageType::Long),
                    value: StorageValue::Long(10),
                },
            ],
            vec![],
            GasCosts::zero(),
        );
        let top_up = TransactionResponse::void_successful(
            vec![Update::UpdateOfField {
                object,
                field: basic_field("Wallet", "balance", StorageType::Long),
                value: StorageValue::Long(50),
            }],
            vec![],
            GasCosts::zero(),
        );

        let mut txn = StoreTransformation::new();
        txn.put_response(creator, creation);
        txn.put_response(updater, top_up);
        // newest-first history: updater before creator.
        txn.set_history(object, vec![updater, creator]);
        let store = store.commit(txn).expect("commit");

        let deserialized = deserialize(&store, &loader, &object).expect("deserialize");
        assert_eq!(deserialized.fields[0].1, StorageValue::Long(50));
    }
}
