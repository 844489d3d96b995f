//! Fee schedule and fee arithmetic
//!
//! Fees are expressed in basis points (1 bps = 0.01%). A global rate applies to
//! every asset unless the asset has a non-zero override. Both the global rate
//! and every override are bounded by a cap fixed at construction.
//!
//! # Integer Math
//!
//! `fee = floor(amount * bps / 10_000)`, computed without ever forming the full
//! product: with `amount = q * 10_000 + r`,
//!
//! ```text
//! floor(amount * bps / 10_000) = q * bps + floor(r * bps / 10_000)
//! ```
//!
//! `q * bps <= amount` because `bps < 10_000`, and `r * bps < 10_000 * 10_000`,
//! so neither term can overflow for any `u128` amount.

use crate::types::{AccountId, Amount, AssetId, EngineError, FeeQuote};
use serde::Serialize;
use std::collections::BTreeMap;

/// Basis points in 100%
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Compute `floor(amount * bps / 10_000)` without overflow
///
/// # Errors
///
/// Returns `FeeExceedsCap` if `bps` is 10_000 or more; such a rate would be
/// a full (or larger) confiscation rather than a fee.
pub fn compute_fee(amount: Amount, bps: u32) -> Result<Amount, EngineError> {
    if bps >= BPS_DENOMINATOR {
        return Err(EngineError::FeeExceedsCap {
            bps,
            cap: BPS_DENOMINATOR - 1,
        });
    }

    let denominator = Amount::from(BPS_DENOMINATOR);
    let bps = Amount::from(bps);
    let whole = amount / denominator;
    let remainder = amount % denominator;

    let fee = whole * bps + remainder * bps / denominator;
    debug_assert!(fee <= amount);
    Ok(fee)
}

/// Fee configuration owned by the settlement engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeSchedule {
    global_bps: u32,
    overrides: BTreeMap<AssetId, u32>,
    recipient: AccountId,
    cap_bps: u32,
}

impl FeeSchedule {
    /// Create a schedule with an immutable cap
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if the cap is not below 10_000 bps
    /// - `FeeExceedsCap` if `global_bps` exceeds the cap
    /// - `InvalidAccount` if the recipient is the zero account
    pub fn new(cap_bps: u32, global_bps: u32, recipient: AccountId) -> Result<Self, EngineError> {
        if cap_bps >= BPS_DENOMINATOR {
            return Err(EngineError::invalid_config(format!(
                "fee cap {} bps must be below {} bps",
                cap_bps, BPS_DENOMINATOR
            )));
        }
        let mut schedule = FeeSchedule {
            global_bps: 0,
            overrides: BTreeMap::new(),
            recipient: AccountId::ZERO,
            cap_bps,
        };
        schedule.set_global_bps(global_bps)?;
        schedule.set_recipient(recipient)?;
        Ok(schedule)
    }

    pub fn cap_bps(&self) -> u32 {
        self.cap_bps
    }

    pub fn global_bps(&self) -> u32 {
        self.global_bps
    }

    pub fn recipient(&self) -> AccountId {
        self.recipient
    }

    /// Non-zero per-asset overrides
    pub fn overrides(&self) -> &BTreeMap<AssetId, u32> {
        &self.overrides
    }

    /// Override for `asset` if set, else the global rate
    pub fn effective_bps(&self, asset: AssetId) -> u32 {
        self.overrides
            .get(&asset)
            .copied()
            .unwrap_or(self.global_bps)
    }

    /// Fee and net amount for paying `amount` of `asset`
    pub fn quote(&self, asset: AssetId, amount: Amount) -> Result<FeeQuote, EngineError> {
        let bps = self.effective_bps(asset);
        let fee = compute_fee(amount, bps)?;
        let net_amount = amount
            .checked_sub(fee)
            .ok_or_else(|| EngineError::arithmetic_overflow("fee quote"))?;

        tracing::debug!(%asset, amount, bps, fee, "Fee computed");
        Ok(FeeQuote {
            bps,
            fee,
            net_amount,
        })
    }

    fn check_cap(&self, bps: u32) -> Result<(), EngineError> {
        if bps > self.cap_bps {
            return Err(EngineError::FeeExceedsCap {
                bps,
                cap: self.cap_bps,
            });
        }
        Ok(())
    }

    /// Set the global rate; returns the previous one
    pub fn set_global_bps(&mut self, bps: u32) -> Result<u32, EngineError> {
        self.check_cap(bps)?;
        Ok(std::mem::replace(&mut self.global_bps, bps))
    }

    /// Set a per-asset override; `0` removes it so the asset defers to global
    pub fn set_override(&mut self, asset: AssetId, bps: u32) -> Result<(), EngineError> {
        self.check_cap(bps)?;
        if bps == 0 {
            self.overrides.remove(&asset);
        } else {
            self.overrides.insert(asset, bps);
        }
        Ok(())
    }

    /// Set the fee recipient; returns the previous one
    pub fn set_recipient(&mut self, recipient: AccountId) -> Result<AccountId, EngineError> {
        if recipient.is_zero() {
            return Err(EngineError::invalid_account(recipient, "fee recipient"));
        }
        Ok(std::mem::replace(&mut self.recipient, recipient))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn usdc() -> AssetId {
        AssetId::token(AccountId::from_low_u64(0xc0))
    }

    fn schedule() -> FeeSchedule {
        FeeSchedule::new(200, 50, AccountId::from_low_u64(0xfe)).unwrap()
    }

    #[rstest]
    #[case::zero_amount(0, 50, 0)]
    #[case::one_unit(1, 50, 0)]
    #[case::rounds_down(199, 50, 0)]
    #[case::first_whole_unit(200, 50, 1)]
    #[case::hundred_usdc(100_000_000, 50, 500_000)]
    #[case::zero_bps(100_000_000, 0, 0)]
    #[case::cap(10_000, 200, 200)]
    #[case::max_bps(10_000, 9_999, 9_999)]
    #[case::max_amount(u128::MAX, 50, u128::MAX / 10_000 * 50 + (u128::MAX % 10_000) * 50 / 10_000)]
    fn test_compute_fee(#[case] amount: Amount, #[case] bps: u32, #[case] expected: Amount) {
        assert_eq!(compute_fee(amount, bps).unwrap(), expected);
    }

    #[test]
    fn test_compute_fee_rejects_full_rate() {
        assert!(matches!(
            compute_fee(100, BPS_DENOMINATOR),
            Err(EngineError::FeeExceedsCap { .. })
        ));
    }

    #[test]
    fn test_override_takes_precedence() {
        let mut schedule = schedule();
        schedule.set_override(usdc(), 10).unwrap();
        assert_eq!(schedule.effective_bps(usdc()), 10);
        assert_eq!(schedule.effective_bps(AssetId::NATIVE), 50);

        schedule.set_override(usdc(), 0).unwrap();
        assert_eq!(schedule.effective_bps(usdc()), 50);
        assert!(schedule.overrides().is_empty());
    }

    #[rstest]
    #[case::global(true)]
    #[case::override_(false)]
    fn test_above_cap_rejected_and_unchanged(#[case] global: bool) {
        let mut schedule = schedule();
        let result = if global {
            schedule.set_global_bps(201).map(|_| ())
        } else {
            schedule.set_override(usdc(), 201)
        };

        assert_eq!(result, Err(EngineError::FeeExceedsCap { bps: 201, cap: 200 }));
        assert_eq!(schedule, self::schedule());
    }

    #[test]
    fn test_cap_itself_allowed() {
        let mut schedule = schedule();
        assert_eq!(schedule.set_global_bps(200), Ok(50));
        assert_eq!(schedule.global_bps(), 200);
    }

    #[test]
    fn test_quote_conserves_amount() {
        let quote = schedule().quote(usdc(), 100_000_000).unwrap();
        assert_eq!(quote.fee, 500_000);
        assert_eq!(quote.net_amount, 99_500_000);
        assert_eq!(quote.fee + quote.net_amount, 100_000_000);
    }

    #[rstest]
    #[case::cap_too_high(10_000, 50)]
    #[case::global_above_cap(100, 150)]
    fn test_invalid_construction(#[case] cap: u32, #[case] global: u32) {
        assert!(FeeSchedule::new(cap, global, AccountId::from_low_u64(1)).is_err());
    }

    #[test]
    fn test_zero_recipient_rejected() {
        let mut schedule = schedule();
        assert!(matches!(
            schedule.set_recipient(AccountId::ZERO),
            Err(EngineError::InvalidAccount { .. })
        ));
        assert_eq!(schedule.recipient(), AccountId::from_low_u64(0xfe));
    }
}
