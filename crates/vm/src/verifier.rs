// Path: crates/vm/src/verifier.rs
//! The bytecode verifier/instrumenter seam (spec.md §4.4, Non-goals: "no
//! bytecode verifier/instrumenter implementation" — only the trait and a
//! deterministic default are in scope here, exactly as the module inventory
//! asks for a `JarVerifier` trait object over a concrete implementation).

use jarnet_types::codec::{from_bytes_canonical, to_bytes_canonical};
use jarnet_types::error::ClassLoadError;
use jarnet_types::request::MemberSignature;
use jarnet_types::value::{ClassType, FieldSignature};
use parity_scale_codec::{Decode, Encode};

/// The declared shape of one class within a verified jar: enough structure
/// for the class loader and serializer to do their jobs without a real JVM
/// class-file parser.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ClassDeclaration {
    pub class_type: ClassType,
    pub superclass: Option<ClassType>,
    pub fields: Vec<FieldSignature>,
    pub constructors: Vec<MemberSignature>,
    pub methods: Vec<MemberSignature>,
    pub is_storage: bool,
    pub is_contract: bool,
    pub white_listed_methods: Vec<MemberSignature>,
}

/// The result of verifying/instrumenting one jar: every class it declares,
/// plus the verification version it was checked against.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct JarManifest {
    pub classes: Vec<ClassDeclaration>,
    pub verification_version: u32,
}

impl JarManifest {
    pub fn find_class(&self, class_type: &ClassType) -> Option<&ClassDeclaration> {
        self.classes.iter().find(|c| &c.class_type == class_type)
    }
}

/// The seam over bytecode verification and instrumentation (spec.md §4.4).
/// `dependencies` are the already-verified manifests of this jar's direct
/// dependencies, in declaration order, so an implementation can check
/// against their public surface.
pub trait JarVerifier: Send + Sync {
    fn verify_and_instrument(
        &self,
        jar_bytes: &[u8],
        dependencies: &[JarManifest],
        verification_version: u32,
    ) -> Result<(Vec<u8>, JarManifest), ClassLoadError>;
}

/// A deterministic default verifier: the "bytecode" a caller submits is
/// itself a canonically encoded [`JarManifest`], and verification just
/// re-stamps it with the current verification version. This is the
/// `NodeStoreBackend`-style seam default spec.md's module inventory calls
/// for — sufficient to drive the class loader and reverification cascade in
/// tests without a real instrumenting compiler.
#[derive(Debug, Default)]
pub struct DeterministicVerifier;

impl JarVerifier for DeterministicVerifier {
    fn verify_and_instrument(
        &self,
        jar_bytes: &[u8],
        _dependencies: &[JarManifest],
        verification_version: u32,
    ) -> Result<(Vec<u8>, JarManifest), ClassLoadError> {
        let mut manifest: JarManifest =
            from_bytes_canonical(jar_bytes).map_err(|e| ClassLoadError::VerificationFailed(e.to_string()))?;
        manifest.verification_version = verification_version;
        let instrumented = to_bytes_canonical(&manifest);
        Ok((instrumented, manifest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manifest(version: u32) -> JarManifest {
        JarManifest {
            classes: vec![ClassDeclaration {
                class_type: ClassType::new("Wallet"),
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

    #[test]
    fn deterministic_verifier_restamps_version() {
        let verifier = DeterministicVerifier;
        let bytes = to_bytes_canonical(&sample_manifest(1));
        let (instrumented, manifest) = verifier.verify_and_instrument(&bytes, &[], 3).expect("verify");
        assert_eq!(manifest.verification_version, 3);
        let round_trip: JarManifest = from_bytes_canonical(&instrumented).expect("decode");
        assert_eq!(round_trip.verification_version, 3);
    }

    #[test]
    fn garbage_bytes_fail_verification() {
        let verifier = DeterministicVerifier;
        assert!(verifier.verify_and_instrument(&[0xFF, 0x00], &[], 1).is_err());
    }
}
