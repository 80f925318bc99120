// Path: crates/vm/src/gas.rs
//! The per-request gas engine (spec.md §4.6, C6): a mutable remaining-gas
//! counter plus the four running totals, sub-budget scoping via `with_gas`,
//! and payer charge/refund against a red/green balance.

use jarnet_types::error::GasError;
use jarnet_types::gas::GasCosts;

/// A payer's balance split into an unrestricted ("green") and a
/// use-restricted ("red") pool (spec.md §4.6, GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RedGreenBalance {
    pub red: u128,
    pub green: u128,
}

impl RedGreenBalance {
    pub fn new(red: u128, green: u128) -> Self {
        Self { red, green }
    }

    pub fn total(&self) -> u128 {
        self.red.saturating_add(self.green)
    }
}

/// Records how much of a gas pre-charge was drawn from each pool, so the
/// matching refund can put green money back in green first (spec.md §4.6,
/// §9 OQ2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChargeReceipt {
    pub from_red: u128,
    pub from_green: u128,
}

/// Debits `cost_of(gas_limit, gas_price)` from `balance`, red first then
/// green (spec.md §4.6: "if payer is a red/green account, drain red first,
/// then green").
pub fn charge_payer(balance: &mut RedGreenBalance, gas_limit: u128, gas_price: u128) -> Result<ChargeReceipt, GasError> {
    let cost = GasCosts::cost_of(gas_limit, gas_price);
    if balance.total() < cost {
        return Err(GasError::InsufficientFundsForGas(cost));
    }
    let from_red = cost.min(balance.red);
    balance.red -= from_red;
    let from_green = (cost - from_red).min(balance.green);
    balance.green -= from_green;
    Ok(ChargeReceipt { from_red, from_green })
}

/// Credits `cost_of(remaining_gas, gas_price)` back to `balance`: green
/// first up to the amount the matching [`charge_payer`] call drew from
/// green, the remainder into red (spec.md §4.6, §9 OQ2 — the dominant
/// behavior for the underspecified exhaustion case).
pub fn refund_payer(balance: &mut RedGreenBalance, receipt: ChargeReceipt, remaining_gas: u128, gas_price: u128) {
    let refund = GasCosts::cost_of(remaining_gas, gas_price);
    let to_green = refund.min(receipt.from_green);
    balance.green += to_green;
    balance.red += refund - to_green;
}

/// A per-request gas meter: `remaining` bounds what can still be charged,
/// `totals` accumulates into the four spec.md buckets that must ultimately
/// satisfy `gas_limit == cpu + ram + storage + penalty + refunded`.
#[derive(Debug, Clone)]
pub struct GasMeter {
    remaining: u128,
    totals: GasCosts,
}

impl GasMeter {
    pub fn new(gas_limit: u128) -> Self {
        Self {
            remaining: gas_limit,
            totals: GasCosts::zero(),
        }
    }

    pub fn remaining(&self) -> u128 {
        self.remaining
    }

    pub fn totals(&self) -> GasCosts {
        self.totals
    }

    /// Finalizes accounting on a non-failure path: whatever is left becomes
    /// the refunded bucket, so the identity in spec.md §9 holds for the
    /// `gas_limit` this meter was built with.
    pub fn into_totals_with_refund(mut self) -> GasCosts {
        self.totals.refunded = self.remaining;
        self.remaining = 0;
        self.totals
    }

    fn charge(&mut self, amount: u128, add: impl FnOnce(&mut GasCosts, u128)) -> Result<(), GasError> {
        if amount > self.remaining {
            return Err(GasError::OutOfGas);
        }
        self.remaining -= amount;
        add(&mut self.totals, amount);
        Ok(())
    }

    pub fn charge_cpu(&mut self, n: u128) -> Result<(), GasError> {
        self.charge(n, |t, a| t.cpu += a)
    }

    pub fn charge_ram(&mut self, n: u128) -> Result<(), GasError> {
        self.charge(n, |t, a| t.ram += a)
    }

    pub fn charge_storage(&mut self, n: u128) -> Result<(), GasError> {
        self.charge(n, |t, a| t.storage += a)
    }

    pub fn charge_penalty(&mut self, n: u128) -> Result<(), GasError> {
        self.charge(n, |t, a| t.penalty += a)
    }

    /// Runs `task` under a sub-budget of `n`, restoring the outer `remaining`
    /// afterward net of whatever `task` actually consumed (spec.md §4.6:
    /// "push current remaining, make n the new remaining, run task, pop and
    /// restore — failures inside still restore the stack"). `totals` is not
    /// scoped: charges made inside `task` land in the same running totals as
    /// the rest of the request, so the overall accounting identity still
    /// holds once the outer scope finishes.
    pub fn with_gas<T>(
        &mut self,
        n: u128,
        task: impl FnOnce(&mut GasMeter) -> Result<T, GasError>,
    ) -> Result<T, GasError> {
        let outer = self.remaining;
        self.remaining = n;
        let result = task(self);
        let consumed = n.saturating_sub(self.remaining);
        self.remaining = outer.saturating_sub(consumed);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charging_more_than_remaining_is_out_of_gas() {
        let mut meter = GasMeter::new(10);
        assert!(meter.charge_cpu(11).is_err());
        assert_eq!(meter.remaining(), 10);
    }

    #[test]
    fn totals_track_each_bucket() {
        let mut meter = GasMeter::new(100);
        meter.charge_cpu(10).expect("cpu");
        meter.charge_ram(20).expect("ram");
        meter.charge_storage(5).expect("storage");
        let totals = meter.into_totals_with_refund();
        assert_eq!(totals.cpu, 10);
        assert_eq!(totals.ram, 20);
        assert_eq!(totals.storage, 5);
        assert_eq!(totals.refunded, 65);
        assert!(totals.is_balanced(100));
    }

    #[test]
    fn with_gas_consumption_reduces_the_outer_budget() {
        let mut meter = GasMeter::new(100);
        meter.charge_cpu(10).expect("outer charge");
        meter
            .with_gas(30, |inner| inner.charge_cpu(12))
            .expect("inner call");
        // outer remaining started at 90 after the first charge, sub-budget
        // consumed 12 of its 30, so 12 comes back out of the outer pool too.
        assert_eq!(meter.remaining(), 78);
        assert_eq!(meter.totals().cpu, 22);
    }

    #[test]
    fn with_gas_restores_outer_budget_on_failure() {
        let mut meter = GasMeter::new(50);
        let result = meter.with_gas(5, |inner| inner.charge_cpu(6));
        assert!(result.is_err());
        assert_eq!(meter.remaining(), 50);
    }

    #[test]
    fn charge_then_refund_round_trips_through_red_then_green() {
        let mut balance = RedGreenBalance::new(40, 60);
        let receipt = charge_payer(&mut balance, 10, 5).expect("charge");
        assert_eq!(receipt.from_red, 40);
        assert_eq!(receipt.from_green, 10);
        assert_eq!(balance, RedGreenBalance::new(0, 50));

        refund_payer(&mut balance, receipt, 4, 5);
        // refund = 20: up to 10 goes back to green (what was paid from green), rest to red.
        assert_eq!(balance, RedGreenBalance::new(10, 60));
    }

    #[test]
    fn insufficient_funds_rejects_the_charge() {
        let mut balance = RedGreenBalance::new(0, 5);
        assert!(charge_payer(&mut balance, 10, 1).is_err());
    }
}
