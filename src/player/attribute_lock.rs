//! Pinned health/armour values
//!
//! A lock keeps reporting and re-applying its value every tick, so anything
//! the simulation does to the attribute in between is overwritten.

use crate::world::{PedHandle, Simulation};

/// Attributes an external authority can pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Health,
    Armour,
}

impl Attribute {
    fn read(self, sim: &dyn Simulation, ped: PedHandle) -> u32 {
        match self {
            Attribute::Health => sim.ped_health(ped),
            Attribute::Armour => sim.ped_armour(ped),
        }
    }

    fn write(self, sim: &mut dyn Simulation, ped: PedHandle, value: u32) {
        match self {
            Attribute::Health => sim.set_ped_health(ped, value),
            Attribute::Armour => sim.set_ped_armour(ped, value),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttributeLock {
    attribute: Attribute,
    locked: Option<u32>,
}

impl AttributeLock {
    pub fn new(attribute: Attribute) -> Self {
        Self {
            attribute,
            locked: None,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked.is_some()
    }

    /// Write through and release any lock. Without a ped the write is dropped.
    pub fn set(&mut self, sim: &mut dyn Simulation, ped: Option<PedHandle>, value: u32) {
        if let Some(ped) = ped {
            self.attribute.write(sim, ped, value);
        }
        self.locked = None;
    }

    /// Write through and pin `value`
    pub fn lock(&mut self, sim: &mut dyn Simulation, ped: Option<PedHandle>, value: u32) {
        self.set(sim, ped, value);
        self.locked = Some(value);
    }

    /// Locked value, else the simulation value, else 0 while despawned
    pub fn get(&self, sim: &dyn Simulation, ped: Option<PedHandle>) -> u32 {
        match (self.locked, ped) {
            (Some(value), _) => value,
            (None, Some(ped)) => self.attribute.read(sim, ped),
            (None, None) => 0,
        }
    }

    /// Force the locked value back into the simulation
    pub fn maintain(&self, sim: &mut dyn Simulation, ped: Option<PedHandle>) {
        if let (Some(value), Some(ped)) = (self.locked, ped) {
            if self.attribute.read(sim, ped) != value {
                self.attribute.write(sim, ped, value);
            }
        }
    }
}
