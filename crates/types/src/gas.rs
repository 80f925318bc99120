//! Gas accounting types shared between the engine, the VM and the store
//! (spec.md §4.6, §9 invariant 5: `gasLimit = cpu + ram + storage + penalty + refunded`).

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// The four buckets gas consumption is attributed to, plus whatever is
/// refunded back to the payer. Every accepted request's totals must satisfy
/// `gas_limit == cpu + ram + storage + penalty + refunded`.
#[derive(Clone, Copy, PartialEq, Eq, Default, Encode, Decode, Serialize, Deserialize, Debug)]
pub struct GasCosts {
    pub cpu: u128,
    pub ram: u128,
    pub storage: u128,
    pub penalty: u128,
    pub refunded: u128,
}

impl GasCosts {
    pub const fn zero() -> Self {
        Self {
            cpu: 0,
            ram: 0,
            storage: 0,
            penalty: 0,
            refunded: 0,
        }
    }

    pub fn consumed(&self) -> u128 {
        self.cpu + self.ram + self.storage + self.penalty
    }

    pub fn total(&self) -> u128 {
        self.consumed() + self.refunded
    }

    /// Checks the accounting identity against a known `gas_limit`.
    pub fn is_balanced(&self, gas_limit: u128) -> bool {
        self.total() == gas_limit
    }

    pub fn cost_of(gas: u128, gas_price: u128) -> u128 {
        gas.saturating_mul(gas_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_when_identity_holds() {
        let g = GasCosts {
            cpu: 10,
            ram: 5,
            storage: 3,
            penalty: 0,
            refunded: 82,
        };
        assert!(g.is_balanced(100));
        assert!(!g.is_balanced(99));
    }

    #[test]
    fn cost_of_multiplies() {
        assert_eq!(GasCosts::cost_of(100, 3), 300);
    }
}
