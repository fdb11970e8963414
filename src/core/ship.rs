//! Ship definitions: ability classes, roster templates and placed hulls.

use std::fmt;
use serde::{Deserialize, Serialize};

use super::common::Coord;

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn from_horizontal(horizontal: bool) -> Self {
        if horizontal {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }

    pub fn is_horizontal(self) -> bool {
        self == Orientation::Horizontal
    }
}

/// Ability class of a ship. Classic and Score-Attack hulls carry no ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShipType {
    Hull,
    Mothership,
    Radarship,
    Repairship,
    Commandship,
    Decoyship,
    Jamship,
}

impl ShipType {
    /// Parse the wire name used by the suggestion service.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Mothership" => Some(ShipType::Mothership),
            "Radarship" => Some(ShipType::Radarship),
            "Repairship" => Some(ShipType::Repairship),
            "Commandship" => Some(ShipType::Commandship),
            "Decoyship" => Some(ShipType::Decoyship),
            "Jamship" => Some(ShipType::Jamship),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShipType::Hull => "Hull",
            ShipType::Mothership => "Mothership",
            ShipType::Radarship => "Radarship",
            ShipType::Repairship => "Repairship",
            ShipType::Commandship => "Commandship",
            ShipType::Decoyship => "Decoyship",
            ShipType::Jamship => "Jamship",
        }
    }

    /// Player-facing name of the ship's active ability.
    pub fn skill_name(self) -> &'static str {
        match self {
            ShipType::Hull => "None",
            ShipType::Mothership => "Escape",
            ShipType::Radarship => "Radar Scan",
            ShipType::Repairship => "Repair",
            ShipType::Commandship => "Relocate",
            ShipType::Decoyship => "Deploy Decoy",
            ShipType::Jamship => "Area Jam",
        }
    }
}

impl fmt::Display for ShipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Roster entry: a ship before placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipConfig {
    pub name: String,
    pub ship_type: ShipType,
    pub length: usize,
}

impl ShipConfig {
    pub fn new(name: &str, ship_type: ShipType, length: usize) -> Self {
        Self {
            name: name.to_string(),
            ship_type,
            length,
        }
    }

    /// Plain hull for Classic and Score-Attack rosters.
    pub fn hull(name: &str, length: usize) -> Self {
        Self::new(name, ShipType::Hull, length)
    }
}

/// A ship owned by a player (or by the shared battlefield).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    pub name: String,
    pub ship_type: ShipType,
    pub length: usize,
    /// Occupied cells in bow-to-stern order; empty until placed.
    pub positions: Vec<Coord>,
    pub is_sunk: bool,
    pub is_damaged: bool,
    pub has_been_repaired: bool,
}

impl Ship {
    /// Unplaced ship from its roster entry.
    pub fn from_config(config: &ShipConfig) -> Self {
        Self {
            name: config.name.clone(),
            ship_type: config.ship_type,
            length: config.length,
            positions: Vec::new(),
            is_sunk: false,
            is_damaged: false,
            has_been_repaired: false,
        }
    }

    pub fn is_placed(&self) -> bool {
        self.positions.len() == self.length
    }

    pub fn occupies(&self, c: Coord) -> bool {
        self.positions.contains(&c)
    }

    /// Orientation inferred from the first two cells; single cells count as
    /// horizontal.
    pub fn orientation(&self) -> Orientation {
        match (self.positions.first(), self.positions.get(1)) {
            (Some(a), Some(b)) if a.x == b.x => Orientation::Vertical,
            _ => Orientation::Horizontal,
        }
    }
}
