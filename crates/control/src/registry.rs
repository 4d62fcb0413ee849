//! Enterprise registry
//!
//! Ids are dense and sequential from 0, so the backing vector index is the id.
//! A side index keeps addresses unique (exact byte match).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use ecoctl_core::{Address, EnterpriseId, Limits, Reading};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// A monitored enterprise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enterprise {
    pub id: EnterpriseId,
    pub name: String,
    pub address: Address,
    pub limits: Limits,
    /// Zero until the first successful compliance check
    pub latest_reading: Reading,
    pub latest_reading_time: Option<DateTime<Utc>>,
}

impl Enterprise {
    pub fn latest(&self) -> LatestReading {
        LatestReading {
            reading: self.latest_reading,
            recorded_at: self.latest_reading_time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestReading {
    pub reading: Reading,
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct EnterpriseRegistry {
    enterprises: Vec<Enterprise>,
    by_address: HashMap<Address, EnterpriseId>,
}

impl EnterpriseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next registration will receive
    pub fn next_id(&self) -> EnterpriseId {
        EnterpriseId::new(self.enterprises.len() as u64)
    }

    pub fn len(&self) -> usize {
        self.enterprises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enterprises.is_empty()
    }

    pub fn get(&self, id: EnterpriseId) -> ControlResult<&Enterprise> {
        usize::try_from(id.value())
            .ok()
            .and_then(|index| self.enterprises.get(index))
            .ok_or(ControlError::NotFound(id))
    }

    pub fn address(&self, id: EnterpriseId) -> ControlResult<&Address> {
        Ok(&self.get(id)?.address)
    }

    pub fn limits(&self, id: EnterpriseId) -> ControlResult<Limits> {
        Ok(self.get(id)?.limits)
    }

    pub fn latest_reading(&self, id: EnterpriseId) -> ControlResult<LatestReading> {
        Ok(self.get(id)?.latest())
    }

    pub fn find_by_address(&self, address: &Address) -> Option<EnterpriseId> {
        self.by_address.get(address).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Enterprise> {
        self.enterprises.iter()
    }

    /// Validate a registration and build the record it would create.
    /// Nothing is stored until [`EnterpriseRegistry::insert`].
    pub fn prepare(&self, name: &str, address: &Address, limits: Limits) -> ControlResult<Enterprise> {
        if address.is_unset() {
            return Err(ControlError::InvalidAddress(address.clone()));
        }
        if self.by_address.contains_key(address) {
            return Err(ControlError::DuplicateAddress(address.clone()));
        }

        Ok(Enterprise {
            id: self.next_id(),
            name: name.to_string(),
            address: address.clone(),
            limits,
            latest_reading: Reading::default(),
            latest_reading_time: None,
        })
    }

    /// Store a record produced by `prepare` against the current state
    pub(crate) fn insert(&mut self, enterprise: Enterprise) {
        debug_assert_eq!(enterprise.id, self.next_id());
        self.by_address.insert(enterprise.address.clone(), enterprise.id);
        self.enterprises.push(enterprise);
    }

    pub(crate) fn set_limits(&mut self, id: EnterpriseId, limits: Limits) -> ControlResult<()> {
        self.get_mut(id)?.limits = limits;
        Ok(())
    }

    pub(crate) fn record_reading(
        &mut self,
        id: EnterpriseId,
        reading: Reading,
        at: DateTime<Utc>,
    ) -> ControlResult<()> {
        let enterprise = self.get_mut(id)?;
        enterprise.latest_reading = reading;
        enterprise.latest_reading_time = Some(at);
        Ok(())
    }

    fn get_mut(&mut self, id: EnterpriseId) -> ControlResult<&mut Enterprise> {
        usize::try_from(id.value())
            .ok()
            .and_then(|index| self.enterprises.get_mut(index))
            .ok_or(ControlError::NotFound(id))
    }
}
