// Path: crates/engine/src/runtime.rs
//! The contract execution seam (spec.md §9 design note: "define a
//! `ContractRuntime` interface the host exposes to the contract VM"). Real
//! managed-code execution and bytecode instrumentation stay out of scope
//! (spec.md §1 Non-goals: "no novel language semantics for contracts"); this
//! module only needs a deterministic host interface that can run the
//! well-known account operations spec.md's testable scenarios (§8) exercise,
//! and fail clearly for anything it doesn't recognize.

use jarnet_store::Store;
use jarnet_types::error::TransactionError;
use jarnet_types::reference::StorageReference;
use jarnet_types::request::{ActualArguments, MemberSignature};
use jarnet_types::update::Update;
use jarnet_types::value::{ClassType, FieldSignature, StorageType, StorageValue};
use jarnet_vm::gas::GasMeter;
use std::collections::HashMap;

/// The well-known account class every gamete and externally-owned account is
/// tagged with (spec.md §4.4: "well-known fields `balance`, `nonce`,
/// `publicKey`").
pub fn account_class() -> ClassType {
    ClassType::new("io.jarnet.Account")
}

pub fn balance_field() -> FieldSignature {
    FieldSignature::new(account_class(), "balance", StorageType::Long)
}

pub fn nonce_field() -> FieldSignature {
    FieldSignature::new(account_class(), "nonce", StorageType::Long)
}

pub fn public_key_field() -> FieldSignature {
    FieldSignature::new(account_class(), "publicKey", StorageType::String)
}

/// The live field values of the object a call executes against, mutated in
/// place by a native method; the caller diffs the result against the
/// pre-call snapshot to produce `Update::UpdateOfField`s.
pub type LiveFields = HashMap<FieldSignature, StorageValue>;

/// The well-known account fields, as recorded by `UpdateOfField` entries.
fn account_field_signatures() -> [FieldSignature; 3] {
    [balance_field(), nonce_field(), public_key_field()]
}

/// Reconstructs `object`'s well-known account fields directly from its
/// history, newest-first-wins (spec.md §4.5's eager-field rule), without
/// going through the general class loader: `io.jarnet.Account` is a native
/// class with no installed jar declaration, so [`jarnet_vm::serde_objects`]'s
/// declaration-driven deserializer does not apply to it.
pub fn decode_account_fields(store: &Store, object: &StorageReference) -> Result<LiveFields, TransactionError> {
    let known = account_field_signatures();
    let history = store.get_history(object).map_err(TransactionError::Store)?;
    let mut fields = LiveFields::new();
    for tref in &history {
        let Some(response) = store.get_response(tref).map_err(TransactionError::Store)? else {
            continue;
        };
        for update in &response.updates {
            if update.object() != object {
                continue;
            }
            if let Update::UpdateOfField { field, value, .. } = update {
                if known.contains(field) {
                    fields.entry(field.clone()).or_insert_with(|| value.clone());
                }
            }
        }
    }
    Ok(fields)
}

/// The single-field form of [`decode_account_fields`]'s history walk, for
/// objects and fields outside the well-known `Account` class (e.g. the
/// manifest's own `nonce`).
pub fn decode_field(store: &Store, object: &StorageReference, field: &FieldSignature) -> Result<Option<StorageValue>, TransactionError> {
    let history = store.get_history(object).map_err(TransactionError::Store)?;
    for tref in &history {
        let Some(response) = store.get_response(tref).map_err(TransactionError::Store)? else {
            continue;
        };
        for update in &response.updates {
            if update.object() != object {
                continue;
            }
            if let Update::UpdateOfField { field: f, value, .. } = update {
                if f == field {
                    return Ok(Some(value.clone()));
                }
            }
        }
    }
    Ok(None)
}

/// Everything a native method needs: who is calling, which object (if any)
/// receives the call, the actual arguments, the object's current field
/// values (mutated in place), and the gas meter backing the
/// instrumentation-injected `entry`/`payableEntry` hooks (spec.md §9).
pub struct CallContext<'a> {
    pub caller: StorageReference,
    pub receiver: Option<StorageReference>,
    pub actuals: &'a ActualArguments,
    pub fields: &'a mut LiveFields,
    pub gas: &'a mut GasMeter,
}

/// The host interface spec.md §9 describes in place of reflective method
/// invocation: a fixed table of native operations a resolved member
/// signature dispatches to.
pub trait ContractRuntime: Send + Sync {
    fn invoke(
        &self,
        class: &ClassType,
        member: &MemberSignature,
        ctx: &mut CallContext,
    ) -> Result<Option<StorageValue>, TransactionError>;

    fn construct(&self, class: &ClassType, ctx: &mut CallContext) -> Result<LiveFields, TransactionError>;
}

fn as_long(value: &StorageValue) -> Option<i64> {
    match value {
        StorageValue::Long(v) => Some(*v),
        _ => None,
    }
}

fn numeric_actual(actuals: &ActualArguments, index: usize) -> Result<i128, TransactionError> {
    let arg = actuals.0.get(index).ok_or_else(|| TransactionError::Failed {
        class_name: "IllegalArgumentException".into(),
        message: format!("missing actual argument {index}"),
    })?;
    match &arg.0 {
        StorageValue::BigInteger(bytes) => {
            jarnet_types::codec::bigint_from_bytes(bytes).map_err(TransactionError::Codec)
        }
        StorageValue::Long(v) => Ok(*v as i128),
        other => Err(TransactionError::Failed {
            class_name: "IllegalArgumentException".into(),
            message: format!("expected a numeric actual, got {other:?}"),
        }),
    }
}

/// The only [`ContractRuntime`] implementation in this crate: handles the
/// account operations spec.md's concrete scenarios exercise
/// (`Account.receive(BigInteger)`, a zero-argument `Account` constructor)
/// and otherwise reports an unresolved method, the same way the class
/// loader reports a resolved-but-unimplemented member.
#[derive(Debug, Default)]
pub struct DefaultRuntime;

impl ContractRuntime for DefaultRuntime {
    fn invoke(
        &self,
        class: &ClassType,
        member: &MemberSignature,
        ctx: &mut CallContext,
    ) -> Result<Option<StorageValue>, TransactionError> {
        if *class == account_class() && member.method_name == "receive" {
            ctx.gas.charge_cpu(50).map_err(TransactionError::Gas)?;
            let amount = numeric_actual(ctx.actuals, 0)?;
            let amount = i64::try_from(amount).map_err(|_| TransactionError::Failed {
                class_name: "ArithmeticException".into(),
                message: "amount out of range".into(),
            })?;
            let balance_sig = balance_field();
            let current = ctx.fields.get(&balance_sig).and_then(as_long).unwrap_or(0);
            let updated = current.checked_add(amount).ok_or_else(|| TransactionError::Failed {
                class_name: "ArithmeticException".into(),
                message: "balance overflow".into(),
            })?;
            ctx.fields.insert(balance_sig, StorageValue::Long(updated));
            return Ok(None);
        }

        Err(TransactionError::Failed {
            class_name: "NoSuchMethodException".into(),
            message: format!("no native implementation for {class}.{}", member.method_name),
        })
    }

    fn construct(&self, class: &ClassType, ctx: &mut CallContext) -> Result<LiveFields, TransactionError> {
        if *class == account_class() {
            ctx.gas.charge_cpu(50).map_err(TransactionError::Gas)?;
            let mut fields = LiveFields::new();
            fields.insert(balance_field(), StorageValue::Long(0));
            fields.insert(nonce_field(), StorageValue::Long(0));
            fields.insert(public_key_field(), StorageValue::String(String::new()));
            return Ok(fields);
        }

        Err(TransactionError::Failed {
            class_name: "NoSuchMethodException".into(),
            message: format!("no native constructor for {class}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarnet_types::reference::TransactionReference;
    use jarnet_types::request::ActualArgument;

    fn account_ref() -> StorageReference {
        StorageReference::new(TransactionReference::new([1u8; 32]), 0)
    }

    #[test]
    fn receive_increments_balance() {
        let runtime = DefaultRuntime;
        let mut fields = LiveFields::new();
        fields.insert(balance_field(), StorageValue::Long(100));
        let actuals = ActualArguments(vec![ActualArgument(StorageValue::BigInteger(
            jarnet_types::codec::bigint_to_bytes(42),
        ))]);
        let mut gas = GasMeter::new(1_000);
        let mut ctx = CallContext {
            caller: account_ref(),
            receiver: Some(account_ref()),
            actuals: &actuals,
            fields: &mut fields,
            gas: &mut gas,
        };
        let member = MemberSignature {
            defining_class: account_class(),
            method_name: "receive".into(),
            formals: vec![ClassType::new("java.math.BigInteger")],
        };
        let result = runtime.invoke(&account_class(), &member, &mut ctx).expect("invoke");
        assert!(result.is_none());
        assert_eq!(fields.get(&balance_field()), Some(&StorageValue::Long(142)));
    }

    #[test]
    fn unknown_method_fails() {
        let runtime = DefaultRuntime;
        let mut fields = LiveFields::new();
        let actuals = ActualArguments::default();
        let mut gas = GasMeter::new(1_000);
        let mut ctx = CallContext {
            caller: account_ref(),
            receiver: Some(account_ref()),
            actuals: &actuals,
            fields: &mut fields,
            gas: &mut gas,
        };
        let member = MemberSignature {
            defining_class: account_class(),
            method_name: "mystery".into(),
            formals: vec![],
        };
        assert!(runtime.invoke(&account_class(), &member, &mut ctx).is_err());
    }
}
