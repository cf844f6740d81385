//! Access control gate in front of the ledger store.

use std::collections::HashSet;

use tracing::{info, warn};

use flightsurety_common::{CallerId, FlightSuretyError, Principal, Result};

/// Proof that the gate admitted a caller for one operation.
///
/// Only [`AccessGate::authorize`] can mint a token, and every store
/// mutator demands one.
#[derive(Debug)]
pub struct WriteToken {
    caller: CallerId,
}

impl WriteToken {
    /// The logic module the token was issued to.
    pub fn caller(&self) -> &CallerId {
        &self.caller
    }
}

/// Operational switch plus the set of modules allowed to mutate the store.
#[derive(Debug, Clone)]
pub struct AccessGate {
    owner: Principal,
    operational: bool,
    authorized: HashSet<CallerId>,
}

impl AccessGate {
    /// Create an operational gate with no authorized callers.
    pub fn new(owner: Principal) -> Self {
        Self {
            owner,
            operational: true,
            authorized: HashSet::new(),
        }
    }

    /// The owner identity.
    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    /// Check the operational switch.
    pub fn is_operational(&self) -> bool {
        self.operational
    }

    /// Check if a module may mutate the store.
    pub fn is_authorized(&self, caller: &CallerId) -> bool {
        self.authorized.contains(caller)
    }

    /// Fail unless `caller` is the owner.
    pub fn require_owner(&self, caller: &Principal, action: &str) -> Result<()> {
        if caller != &self.owner {
            warn!(caller = %caller, action, "Owner-only action rejected");
            return Err(FlightSuretyError::unauthorized(caller, action));
        }
        Ok(())
    }

    /// Flip the operational switch. Works while paused so the owner can resume.
    /// Returns whether the value changed.
    pub fn set_operating_status(&mut self, caller: &Principal, operational: bool) -> Result<bool> {
        self.require_owner(caller, "set operating status")?;

        let changed = self.operational != operational;
        self.operational = operational;
        info!(operational, changed, "Operating status set");
        Ok(changed)
    }

    /// Allow a logic module to mutate the store.
    pub fn authorize_caller(&mut self, caller: &Principal, module: CallerId) -> Result<()> {
        self.require_owner(caller, "authorize caller")?;
        info!(module = %module, "Caller authorized");
        self.authorized.insert(module);
        Ok(())
    }

    /// Revoke a logic module's access.
    pub fn deauthorize_caller(&mut self, caller: &Principal, module: &CallerId) -> Result<()> {
        self.require_owner(caller, "deauthorize caller")?;
        if self.authorized.remove(module) {
            info!(module = %module, "Caller deauthorized");
        }
        Ok(())
    }

    /// Admit `caller` for one mutating operation.
    pub fn authorize(&self, caller: &CallerId) -> Result<WriteToken> {
        if !self.operational {
            return Err(FlightSuretyError::NotOperational);
        }
        if !self.is_authorized(caller) {
            return Err(FlightSuretyError::unauthorized(caller, "mutate the ledger"));
        }
        Ok(WriteToken {
            caller: caller.clone(),
        })
    }
}
