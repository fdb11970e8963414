use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use super::{FleetStatus, MoveOracle, OracleRequest, RawMove};
use crate::core::ai::{hunt_target, random_unresolved, target_cells};
use crate::core::grid::can_place_ship;
use crate::core::{CellState, Coord, Grid, Orientation, ShipType};

/// In-process oracle playing the hunt/target heuristic. In Tactical it also
/// reaches for abilities when they are obviously useful.
pub struct LocalOracle {
    rng: SmallRng,
}

impl LocalOracle {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_rng(&mut rand::rng()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn ready(fleet: &[FleetStatus], ship_type: ShipType) -> bool {
        fleet.iter().any(|s| s.ship_type == ship_type && s.ready())
    }

    fn plan_attack(&mut self, shots: &Grid) -> anyhow::Result<RawMove> {
        hunt_target(shots, &mut self.rng)
            .map(RawMove::attack)
            .ok_or_else(|| anyhow::anyhow!("No unresolved cell left"))
    }

    fn plan_tactical(
        &mut self,
        fleet: &[FleetStatus],
        own_grid: &Grid,
        shots: &Grid,
        escape_unlocked: bool,
        decoy_length: usize,
    ) -> anyhow::Result<RawMove> {
        let mothership_hurt = fleet
            .iter()
            .any(|s| s.ship_type == ShipType::Mothership && s.is_damaged && !s.is_sunk);
        if escape_unlocked && mothership_hurt && Self::ready(fleet, ShipType::Mothership) {
            return Ok(RawMove::skill(ShipType::Mothership, None));
        }

        if Self::ready(fleet, ShipType::Repairship) {
            let damaged: Vec<Coord> = own_grid
                .iter()
                .filter(|(_, s)| *s == CellState::Hit)
                .map(|(c, _)| c)
                .collect();
            if let Some(c) = damaged.choose(&mut self.rng) {
                return Ok(RawMove::skill(ShipType::Repairship, Some(*c)));
            }
        }

        let hunting = target_cells(shots).is_empty() && shots.count(CellState::RadarContact) == 0;
        if hunting && Self::ready(fleet, ShipType::Radarship) {
            if let Some(c) = random_unresolved(shots, &mut self.rng) {
                return Ok(RawMove::skill(ShipType::Radarship, Some(c)));
            }
        }

        if Self::ready(fleet, ShipType::Jamship) && self.rng.random_bool(0.25) {
            if let Some(c) = random_unresolved(shots, &mut self.rng) {
                return Ok(RawMove::skill(ShipType::Jamship, Some(c)));
            }
        }

        if Self::ready(fleet, ShipType::Decoyship) && self.rng.random_bool(0.2) {
            if let Some((c, orientation)) = self.open_water(own_grid, decoy_length) {
                let mut decoy = RawMove::skill(ShipType::Decoyship, Some(c));
                decoy.is_horizontal = Some(orientation.is_horizontal());
                return Ok(decoy);
            }
        }

        if Self::ready(fleet, ShipType::Commandship) && self.rng.random_bool(0.1) {
            let movable: Vec<&FleetStatus> = fleet
                .iter()
                .filter(|s| s.ship_type != ShipType::Commandship && !s.is_damaged && !s.is_sunk)
                .collect();
            if let Some(ship) = movable.choose(&mut self.rng) {
                let mut relocate = RawMove::skill(ShipType::Commandship, None);
                relocate.ship_to_move = Some(ship.name.clone());
                return Ok(relocate);
            }
        }

        self.plan_attack(shots)
    }

    /// A random spot on the own grid with `length` empty cells in a row.
    fn open_water(&mut self, grid: &Grid, length: usize) -> Option<(Coord, Orientation)> {
        for _ in 0..50 {
            let c = Coord::new(
                self.rng.random_range(0..grid.cols()),
                self.rng.random_range(0..grid.rows()),
            );
            let orientation = Orientation::from_horizontal(self.rng.random_bool(0.5));
            if can_place_ship(grid, length, c, orientation) {
                return Some((c, orientation));
            }
        }
        None
    }
}

impl Default for LocalOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MoveOracle for LocalOracle {
    async fn suggest(&mut self, request: &OracleRequest) -> anyhow::Result<String> {
        let reply = match request {
            OracleRequest::Attack { shots_grid, .. } => self.plan_attack(shots_grid)?,
            OracleRequest::Tactical {
                fleet,
                own_grid,
                shots_grid,
                escape_unlocked,
                decoy_length,
                ..
            } => self.plan_tactical(fleet, own_grid, shots_grid, *escape_unlocked, *decoy_length)?,
        };
        Ok(serde_json::to_string(&reply)?)
    }
}
