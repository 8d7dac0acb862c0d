// crates/light-economics/src/treasury.rs
//
// Area-creation fee vault.
//
// Native-currency payments for creating areas accumulate here unless a
// buy-back recipient is configured, in which case they pass straight through.
// Only the owner can sweep the vault (`transfer_create_area_fee`).

use light_core::error::LightError;
use light_core::types::Amount;

/// Withdrawable balance of collected area-creation fees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeVault {
    /// Current balance in native units.
    balance: Amount,
}

impl FeeVault {
    /// Create a new vault with zero balance.
    pub fn new() -> Self {
        Self { balance: 0 }
    }

    pub fn deposit(&mut self, amount: Amount) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Take `amount` out of the vault.
    ///
    /// # Errors
    /// Returns `LightError::InvalidState` if the vault holds less than `amount`.
    pub fn withdraw(&mut self, amount: Amount) -> Result<(), LightError> {
        if amount > self.balance {
            return Err(LightError::InvalidState(format!(
                "Insufficient area fee balance: requested {} but only {} available",
                amount, self.balance
            )));
        }
        self.balance -= amount;
        Ok(())
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_vault_is_empty() {
        assert_eq!(FeeVault::new().balance(), 0);
    }

    #[test]
    fn test_deposits_accumulate() {
        let mut vault = FeeVault::new();
        vault.deposit(50);
        vault.deposit(30);
        assert_eq!(vault.balance(), 80);
    }

    #[test]
    fn test_withdraw_exact_balance() {
        let mut vault = FeeVault::new();
        vault.deposit(100);
        assert!(vault.withdraw(100).is_ok());
        assert_eq!(vault.balance(), 0);
    }

    #[test]
    fn test_withdraw_insufficient_balance() {
        let mut vault = FeeVault::new();
        vault.deposit(50);
        assert!(vault.withdraw(51).is_err());
        // Balance should be unchanged
        assert_eq!(vault.balance(), 50);
    }
}
