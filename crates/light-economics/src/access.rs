// crates/light-economics/src/access.rs
//
// Single-holder authorization capability.
//
// The farm does not know what kind of account holds the capability: a plain
// key, a timelock, or a governance executor all look the same. The holder can
// hand it on with `transfer`.

use light_core::error::LightError;
use light_core::identity::Address;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authority {
    owner: Address,
}

impl Authority {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_owner(&self, caller: &Address) -> bool {
        *caller == self.owner
    }

    /// Fail unless `caller` holds the capability.
    ///
    /// # Errors
    /// Returns `LightError::Unauthorized` naming the attempted `action`.
    pub fn ensure(&self, caller: &Address, action: &str) -> Result<(), LightError> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(LightError::Unauthorized(format!(
                "{} may not {}: caller is not the owner",
                caller, action
            )))
        }
    }

    /// Hand the capability to `new_owner`. Returns the previous holder.
    ///
    /// # Errors
    /// Returns `LightError::Unauthorized` if `caller` is not the owner, and
    /// `LightError::InvalidConfig` for the zero address.
    pub fn transfer(&mut self, caller: &Address, new_owner: Address) -> Result<Address, LightError> {
        self.ensure(caller, "transfer ownership")?;
        if new_owner.is_zero() {
            return Err(LightError::InvalidConfig(
                "new owner may not be the zero address".to_string(),
            ));
        }
        let previous = self.owner;
        self.owner = new_owner;
        info!(%previous, new_owner = %new_owner, "Ownership transferred");
        Ok(previous)
    }
}
