//! The `Update` type (spec.md §4.2/§4.5): the unit of change recorded
//! against an object in the responses/histories tries.

use crate::reference::StorageReference;
use crate::value::{ClassType, FieldSignature, StorageValue};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A single recorded change to an object, as produced by a successful
/// transaction and consumed when replaying an object's history.
#[derive(Clone, PartialEq, Encode, Decode, Serialize, Deserialize, Debug)]
pub enum Update {
    /// Records the runtime class of a newly created object. Every object's
    /// history contains exactly one `ClassTag`, written at creation time.
    ClassTag {
        object: StorageReference,
        class_type: ClassType,
    },
    /// Records the new value of one field of `object`.
    UpdateOfField {
        object: StorageReference,
        field: FieldSignature,
        value: StorageValue,
    },
}

impl Update {
    pub fn object(&self) -> &StorageReference {
        match self {
            Self::ClassTag { object, .. } => object,
            Self::UpdateOfField { object, .. } => object,
        }
    }

    pub fn is_class_tag(&self) -> bool {
        matches!(self, Self::ClassTag { .. })
    }

    /// The field this update concerns, if it is a field update. Used when
    /// walking an object's history newest-to-oldest to find the first
    /// update covering a particular eager field.
    pub fn field(&self) -> Option<&FieldSignature> {
        match self {
            Self::ClassTag { .. } => None,
            Self::UpdateOfField { field, .. } => Some(field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::TransactionReference;
    use crate::value::StorageType;

    fn object() -> StorageReference {
        StorageReference::new(TransactionReference::new([7u8; 32]), 0)
    }

    #[test]
    fn class_tag_has_no_field() {
        let u = Update::ClassTag {
            object: object(),
            class_type: ClassType::new("C"),
        };
        assert!(u.is_class_tag());
        assert!(u.field().is_none());
    }

    #[test]
    fn field_update_reports_field() {
        let sig = FieldSignature::new(ClassType::new("C"), "x", StorageType::Int);
        let u = Update::UpdateOfField {
            object: object(),
            field: sig.clone(),
            value: StorageValue::Int(42),
        };
        assert!(!u.is_class_tag());
        assert_eq!(u.field(), Some(&sig));
        assert_eq!(u.object(), &object());
    }
}
