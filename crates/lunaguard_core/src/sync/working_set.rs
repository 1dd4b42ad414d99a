//! In-memory per-kind record lists for the current session.

use crate::model::contact::EmergencyContact;
use crate::model::entity::Entity;
use crate::model::period::PeriodRecord;
use crate::model::sos::SosEvent;
use crate::remote::RemoteRecord;

/// Last loaded state of every kind, updated by each save and delete.
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    pub periods: Vec<PeriodRecord>,
    pub contacts: Vec<EmergencyContact>,
    pub sos_events: Vec<SosEvent>,
}

/// Maps an entity type to its list inside `WorkingSet`.
pub trait WorkingSetSlot: Entity {
    fn slot(set: &mut WorkingSet) -> &mut Vec<Self>;
    fn slot_ref(set: &WorkingSet) -> &Vec<Self>;
}

/// Everything the coordinator needs from an entity type.
pub trait SyncEntity: RemoteRecord + WorkingSetSlot {}

impl<E: RemoteRecord + WorkingSetSlot> SyncEntity for E {}

impl WorkingSetSlot for PeriodRecord {
    fn slot(set: &mut WorkingSet) -> &mut Vec<Self> {
        &mut set.periods
    }

    fn slot_ref(set: &WorkingSet) -> &Vec<Self> {
        &set.periods
    }
}

impl WorkingSetSlot for EmergencyContact {
    fn slot(set: &mut WorkingSet) -> &mut Vec<Self> {
        &mut set.contacts
    }

    fn slot_ref(set: &WorkingSet) -> &Vec<Self> {
        &set.contacts
    }
}

impl WorkingSetSlot for SosEvent {
    fn slot(set: &mut WorkingSet) -> &mut Vec<Self> {
        &mut set.sos_events
    }

    fn slot_ref(set: &WorkingSet) -> &Vec<Self> {
        &set.sos_events
    }
}

impl WorkingSet {
    pub fn records<E: WorkingSetSlot>(&self) -> &[E] {
        E::slot_ref(self)
    }

    pub fn find<E: WorkingSetSlot>(&self, id: &str) -> Option<&E> {
        E::slot_ref(self).iter().find(|record| record.id() == id)
    }

    pub fn replace<E: WorkingSetSlot>(&mut self, records: Vec<E>) {
        *E::slot(self) = records;
    }

    /// Overwrites in place when the id is known, appends otherwise.
    pub fn upsert<E: WorkingSetSlot>(&mut self, record: E) {
        let slot = E::slot(self);
        match slot.iter_mut().find(|existing| existing.id() == record.id()) {
            Some(existing) => *existing = record,
            None => slot.push(record),
        }
    }

    /// Returns whether a record was removed.
    pub fn remove<E: WorkingSetSlot>(&mut self, id: &str) -> bool {
        let slot = E::slot(self);
        let before = slot.len();
        slot.retain(|record| record.id() != id);
        before != slot.len()
    }
}
