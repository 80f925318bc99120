// Path: crates/vm/src/classloader.rs
//! Builds an isolated loader over a classpath's transitive dependency DAG,
//! reverifying jars whose stored verification version has fallen behind the
//! node's current one (spec.md §4.4, C4).

use crate::verifier::{ClassDeclaration, JarManifest, JarVerifier};
use jarnet_store::{Store, StoreTransformation};
use jarnet_types::codec::from_bytes_canonical;
use jarnet_types::error::ClassLoadError;
use jarnet_types::reference::TransactionReference;
use jarnet_types::request::{Classpath, MemberSignature, TransactionRequest};
use jarnet_types::response::TransactionResponse;
use jarnet_types::value::ClassType;
use std::collections::BTreeMap;

/// Configured bounds on a classpath's transitive dependency set (spec.md §6:
/// `maxDependencies`, `maxCumulativeSizeOfDependencies`).
#[derive(Debug, Clone, Copy)]
pub struct ClassLoaderLimits {
    pub max_dependencies: usize,
    pub max_cumulative_size: u64,
}

/// A loader over one classpath's resolved classes, plus the manifests of
/// every jar that contributed to it.
#[derive(Debug)]
pub struct ClassLoader {
    manifests: BTreeMap<TransactionReference, JarManifest>,
}

impl ClassLoader {
    /// Resolves `classpath`'s full transitive dependency set against
    /// `store`, reverifying any jar whose stored verification version
    /// differs from `current_verification_version`. Returns the loader plus
    /// a [`StoreTransformation`] carrying any reverified/failed responses —
    /// the caller commits it alongside the rest of the block.
    pub fn load(
        store: &Store,
        verifier: &dyn JarVerifier,
        classpath: &Classpath,
        limits: ClassLoaderLimits,
        current_verification_version: u32,
    ) -> Result<(ClassLoader, StoreTransformation), ClassLoadError> {
        let mut txn = StoreTransformation::new();
        let mut visited: BTreeMap<TransactionReference, Result<JarManifest, String>> = BTreeMap::new();
        let mut cumulative_size: u64 = 0;

        for root in classpath.roots() {
            ensure_verified(
                store,
                verifier,
                *root,
                current_verification_version,
                limits,
                &mut visited,
                &mut cumulative_size,
                &mut txn,
            )?;
        }

        let manifests = visited
            .into_iter()
            .filter_map(|(jar_ref, result)| result.ok().map(|m| (jar_ref, m)))
            .collect();
        Ok((ClassLoader { manifests }, txn))
    }

    pub fn find_declaration(&self, class_type: &ClassType) -> Result<&ClassDeclaration, ClassLoadError> {
        self.manifests
            .values()
            .find_map(|m| m.find_class(class_type))
            .ok_or_else(|| ClassLoadError::ClassNotFound(class_type.to_string()))
    }

    pub fn is_storage(&self, class_type: &ClassType) -> bool {
        self.find_declaration(class_type).map(|c| c.is_storage).unwrap_or(false)
    }

    pub fn is_contract(&self, class_type: &ClassType) -> bool {
        self.find_declaration(class_type).map(|c| c.is_contract).unwrap_or(false)
    }

    pub fn is_white_listed(&self, class_type: &ClassType, member: &MemberSignature) -> Result<bool, ClassLoadError> {
        let declaration = self.find_declaration(class_type)?;
        Ok(declaration.white_listed_methods.contains(member))
    }

    pub fn resolve_method(&self, class_type: &ClassType, member: &MemberSignature) -> Result<&MemberSignature, ClassLoadError> {
        let declaration = self.find_declaration(class_type)?;
        declaration
            .methods
            .iter()
            .find(|m| m == &member)
            .ok_or_else(|| ClassLoadError::MethodNotFound(member.method_name.clone()))
    }

    pub fn resolve_constructor(&self, class_type: &ClassType, member: &MemberSignature) -> Result<&MemberSignature, ClassLoadError> {
        let declaration = self.find_declaration(class_type)?;
        declaration
            .constructors
            .iter()
            .find(|c| c == &member)
            .ok_or_else(|| ClassLoadError::MethodNotFound(format!("{}(..)", class_type)))
    }

    pub fn resolve_field(&self, class_type: &ClassType, name: &str) -> Result<&jarnet_types::value::FieldSignature, ClassLoadError> {
        self.find_declaration(class_type)?
            .fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| ClassLoadError::FieldNotFound(name.to_string()))
    }

    /// The chain of classes from the most distant ancestor down to
    /// `class_type` itself, used to order fields superclass-first when
    /// deserializing (spec.md §4.5).
    pub fn superclass_chain(&self, class_type: &ClassType) -> Vec<ClassType> {
        let mut chain = vec![class_type.clone()];
        let mut current = class_type.clone();
        while let Ok(declaration) = self.find_declaration(&current) {
            match &declaration.superclass {
                Some(parent) => {
                    chain.push(parent.clone());
                    current = parent.clone();
                }
                None => break,
            }
        }
        chain.reverse();
        chain
    }
}

#[allow(clippy::too_many_arguments)]
fn ensure_verified(
    store: &Store,
    verifier: &dyn JarVerifier,
    jar_ref: TransactionReference,
    current_verification_version: u32,
    limits: ClassLoaderLimits,
    visited: &mut BTreeMap<TransactionReference, Result<JarManifest, String>>,
    cumulative_size: &mut u64,
    txn: &mut StoreTransformation,
) -> Result<JarManifest, ClassLoadError> {
    if let Some(cached) = visited.get(&jar_ref) {
        return cached.clone().map_err(ClassLoadError::VerificationFailed);
    }

    let request = store
        .get_request(&jar_ref)
        .map_err(|e| ClassLoadError::JarNotFound(e.to_string()))?
        .ok_or_else(|| ClassLoadError::JarNotFound(jar_ref.to_hex()))?;
    let response = store
        .get_response(&jar_ref)
        .map_err(|e| ClassLoadError::JarNotFound(e.to_string()))?
        .ok_or_else(|| ClassLoadError::JarNotFound(jar_ref.to_hex()))?;

    let dependencies = match &request {
        TransactionRequest::JarStore { dependencies, .. } => dependencies.clone(),
        TransactionRequest::JarStoreInitial { .. } => Vec::new(),
        _ => return Err(ClassLoadError::JarNotFound(jar_ref.to_hex())),
    };

    if visited.len() + 1 > limits.max_dependencies {
        return Err(ClassLoadError::TooManyDependencies {
            got: visited.len() + 1,
            max: limits.max_dependencies,
        });
    }

    let mut dep_manifests = Vec::with_capacity(dependencies.len());
    for (index, dep_ref) in dependencies.iter().enumerate() {
        match ensure_verified(
            store,
            verifier,
            *dep_ref,
            current_verification_version,
            limits,
            visited,
            cumulative_size,
            txn,
        ) {
            Ok(manifest) => dep_manifests.push(manifest),
            Err(e) => {
                let reason = format!("reverification failed for dependency {index}: {e}");
                visited.insert(jar_ref, Err(reason.clone()));
                txn.put_response(jar_ref, replace_with_failed(&response, &reason));
                return Err(ClassLoadError::ReverificationFailed { index, reason });
            }
        }
    }

    let jar_store = response
        .jar_store
        .clone()
        .ok_or_else(|| ClassLoadError::JarNotFound(jar_ref.to_hex()))?;

    *cumulative_size += jar_store.instrumented_jar.len() as u64;
    if *cumulative_size > limits.max_cumulative_size {
        return Err(ClassLoadError::CumulativeSizeTooLarge {
            got: *cumulative_size,
            max: limits.max_cumulative_size,
        });
    }

    if jar_store.verification_version == current_verification_version {
        let manifest: JarManifest = from_bytes_canonical(&jar_store.instrumented_jar)
            .map_err(|e| ClassLoadError::VerificationFailed(e.to_string()))?;
        visited.insert(jar_ref, Ok(manifest.clone()));
        return Ok(manifest);
    }

    match verifier.verify_and_instrument(&jar_store.instrumented_jar, &dep_manifests, current_verification_version) {
        Ok((new_bytes, manifest)) => {
            let mut new_response = response.clone();
            let mut new_jar_store = jar_store;
            new_jar_store.instrumented_jar = new_bytes;
            new_jar_store.verification_version = current_verification_version;
            new_response.jar_store = Some(new_jar_store);
            txn.put_response(jar_ref, new_response);
            visited.insert(jar_ref, Ok(manifest.clone()));
            Ok(manifest)
        }
        Err(e) => {
            let reason = e.to_string();
            visited.insert(jar_ref, Err(reason.clone()));
            txn.put_response(jar_ref, replace_with_failed(&response, &reason));
            Err(ClassLoadError::VerificationFailed(reason))
        }
    }
}

fn replace_with_failed(original: &TransactionResponse, reason: &str) -> TransactionResponse {
    TransactionResponse::failed("ReverificationException", reason, Vec::new(), original.gas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::DeterministicVerifier;
    use jarnet_storage::MemoryBackend;
    use jarnet_types::codec::to_bytes_canonical;
    use jarnet_types::gas::GasCosts;
    use jarnet_types::response::JarStoreOutcome;
    use std::sync::Arc;

    fn manifest_with(class_name: &str, version: u32) -> JarManifest {
        JarManifest {
            classes: vec![ClassDeclaration {
                class_type: ClassType::new(class_name),
                superclass: None,
                fields: vec![],
                constructors: vec![],
                methods: vec![],
                is_storage: true,
                is_contract: true,
                white_listed_methods: vec![],
            }],
            verification_version: version,
        }
    }

    fn install_jar(
        store: &Store,
        jar_ref: TransactionReference,
        dependencies: Vec<TransactionReference>,
        manifest: JarManifest,
    ) -> Store {
        let mut txn = StoreTransformation::new();
        let bytes = to_bytes_canonical(&manifest);
        txn.put_request(
            jar_ref,
            if dependencies.is_empty() {
                TransactionRequest::JarStoreInitial { jar_bytes: bytes.clone() }
            } else {
                TransactionRequest::JarStore {
                    common: sample_common(),
                    jar_bytes: bytes.clone(),
                    dependencies,
                }
            },
        );
        let mut response = TransactionResponse::void_successful(vec![], vec![], GasCosts::zero());
        response.jar_store = Some(JarStoreOutcome {
            instrumented_jar: bytes,
            dependencies: vec![],
            verification_version: manifest.verification_version,
        });
        txn.put_response(jar_ref, response);
        store.commit(txn).expect("commit jar")
    }

    fn sample_common() -> jarnet_types::request::CommonFields {
        jarnet_types::request::CommonFields {
            caller: jarnet_types::reference::StorageReference::new(TransactionReference::new([9u8; 32]), 0),
            nonce: 0,
            chain_id: "test".into(),
            gas_limit: 0,
            gas_price: 0,
            classpath: Classpath::new(vec![]),
            signature: vec![],
        }
    }

    #[test]
    fn loads_a_single_jar_with_no_dependencies() {
        let backend: Arc<dyn jarnet_storage::NodeStoreBackend> = Arc::new(MemoryBackend::new());
        let store = Store::new(backend);
        let jar_ref = TransactionReference::new([1u8; 32]);
        let store = install_jar(&store, jar_ref, vec![], manifest_with("Wallet", 1));

        let limits = ClassLoaderLimits { max_dependencies: 20, max_cumulative_size: 10_000 };
        let (loader, txn) = ClassLoader::load(&store, &DeterministicVerifier, &Classpath::new(vec![jar_ref]), limits, 1)
            .expect("load");
        assert!(txn.is_empty());
        assert!(loader.is_storage(&ClassType::new("Wallet")));
    }

    #[test]
    fn mismatched_verification_version_triggers_reverification() {
        let backend: Arc<dyn jarnet_storage::NodeStoreBackend> = Arc::new(MemoryBackend::new());
        let store = Store::new(backend);
        let jar_ref = TransactionReference::new([2u8; 32]);
        let store = install_jar(&store, jar_ref, vec![], manifest_with("Token", 1));

        let limits = ClassLoaderLimits { max_dependencies: 20, max_cumulative_size: 10_000 };
        let (_loader, txn) = ClassLoader::load(&store, &DeterministicVerifier, &Classpath::new(vec![jar_ref]), limits, 2)
            .expect("load");
        assert!(!txn.is_empty());

        let committed = store.commit(txn).expect("commit reverification");
        let response = committed.get_response(&jar_ref).expect("get").expect("present");
        assert_eq!(response.jar_store.expect("jar store").verification_version, 2);
    }

    #[test]
    fn dependency_failure_cascades_with_indexed_reason() {
        let backend: Arc<dyn jarnet_storage::NodeStoreBackend> = Arc::new(MemoryBackend::new());
        let store = Store::new(backend);
        let dep_ref = TransactionReference::new([3u8; 32]);
        let store = install_jar(&store, dep_ref, vec![], manifest_with("Base", 1));
        let dependent_ref = TransactionReference::new([4u8; 32]);
        let store = install_jar(&store, dependent_ref, vec![dep_ref], manifest_with("Derived", 1));

        // Mutate the dependency's stored jar bytes so reverification at a
        // bumped version fails to decode as a manifest.
        let mut txn = StoreTransformation::new();
        let mut broken = store.get_response(&dep_ref).expect("get").expect("present");
        broken.jar_store.as_mut().expect("jar store").instrumented_jar = vec![0xFF, 0xFF];
        txn.put_response(dep_ref, broken);
        let store = store.commit(txn).expect("corrupt dependency");

        let limits = ClassLoaderLimits { max_dependencies: 20, max_cumulative_size: 10_000 };
        let err = ClassLoader::load(&store, &DeterministicVerifier, &Classpath::new(vec![dependent_ref]), limits, 2)
            .expect_err("should cascade");
        match err {
            ClassLoadError::ReverificationFailed { index, reason } => {
                assert_eq!(index, 0);
                assert!(reason.contains("reverification failed for dependency 0") || reason.contains("verification failed"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
