//! Clothing selection per body part

use crate::world::{PedHandle, Simulation};

/// Body parts with selectable clothing (0..=10)
pub const BODY_PART_COUNT: usize = 11;

/// Selected variation index for every body part.
///
/// An index counts through the ped model's drawable × texture grid in
/// drawable-major order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wardrobe {
    selection: [u8; BODY_PART_COUNT],
}

impl Wardrobe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, body_part: u8) -> u8 {
        self.selection
            .get(body_part as usize)
            .copied()
            .unwrap_or(0)
    }

    /// Select `index` for `body_part`. While spawned the variation is applied
    /// immediately; an index past the grid falls back to the default variation.
    pub fn set(
        &mut self,
        sim: &mut dyn Simulation,
        ped: Option<PedHandle>,
        body_part: u8,
        index: u8,
    ) {
        let Some(slot) = self.selection.get_mut(body_part as usize) else {
            return;
        };

        let Some(ped) = ped else {
            *slot = index;
            return;
        };

        match find_variation(sim, ped, body_part, index) {
            Some((drawable, texture)) => {
                sim.set_component_variation(ped, body_part, drawable, texture);
                *slot = index;
            }
            None => {
                sim.set_component_variation(ped, body_part, 0, 0);
                *slot = 0;
            }
        }
    }

    /// Re-apply every stored selection to a freshly spawned ped
    pub fn apply(&mut self, sim: &mut dyn Simulation, ped: PedHandle) {
        for part in 0..BODY_PART_COUNT as u8 {
            let index = self.get(part);
            self.set(sim, Some(ped), part, index);
        }
    }
}

fn find_variation(
    sim: &dyn Simulation,
    ped: PedHandle,
    body_part: u8,
    index: u8,
) -> Option<(u32, u32)> {
    let mut remaining = index as u32;
    for drawable in 0..sim.drawable_variations(ped, body_part) {
        let textures = sim.texture_variations(ped, body_part, drawable);
        if remaining < textures {
            return Some((drawable, remaining));
        }
        remaining -= textures;
    }
    None
}
