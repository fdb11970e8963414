//! Rectangular cell grid and the placement primitives built on it.

use std::fmt;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::common::{CellState, Coord, GameError, GridDimensions};
use super::config::{PLACEMENT_ATTEMPTS, RELOCATION_ATTEMPTS};
use super::ship::{Orientation, Ship, ShipConfig};

/// Row-major matrix of cell states with fixed dimensions.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<CellState>,
}

impl Grid {
    /// Grid fully initialised to `Empty`.
    pub fn new(dims: GridDimensions) -> Self {
        Self {
            rows: dims.rows,
            cols: dims.cols,
            cells: vec![CellState::Empty; dims.rows * dims.cols],
        }
    }

    pub fn dims(&self) -> GridDimensions {
        GridDimensions::new(self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn in_bounds(&self, c: Coord) -> bool {
        c.x < self.cols && c.y < self.rows
    }

    /// Cell at `c`, or `None` when out of bounds.
    pub fn get(&self, c: Coord) -> Option<CellState> {
        if self.in_bounds(c) {
            Some(self.cells[c.y * self.cols + c.x])
        } else {
            None
        }
    }

    /// Overwrite the cell at `c`. Out-of-bounds writes are ignored and
    /// reported with `false`.
    pub fn set(&mut self, c: Coord, state: CellState) -> bool {
        if self.in_bounds(c) {
            self.cells[c.y * self.cols + c.x] = state;
            true
        } else {
            false
        }
    }

    /// Iterate over every cell in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, CellState)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, s)| (Coord::new(i % self.cols, i / self.cols), *s))
    }

    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|s| **s == state).count()
    }

    /// In-bounds orthogonal neighbours of `c`.
    pub fn neighbours(&self, c: Coord) -> Vec<Coord> {
        let mut out = Vec::with_capacity(4);
        if c.x > 0 {
            out.push(Coord::new(c.x - 1, c.y));
        }
        if c.x + 1 < self.cols {
            out.push(Coord::new(c.x + 1, c.y));
        }
        if c.y > 0 {
            out.push(Coord::new(c.x, c.y - 1));
        }
        if c.y + 1 < self.rows {
            out.push(Coord::new(c.x, c.y + 1));
        }
        out
    }

    /// Copy of this grid with the given cells cleared to `Empty`.
    pub fn without(&self, positions: &[Coord]) -> Grid {
        let mut grid = self.clone();
        for &p in positions {
            grid.set(p, CellState::Empty);
        }
        grid
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grid<{}x{}>:", self.rows, self.cols)?;
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.rows {
            for x in 0..self.cols {
                if x > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", self.cells[y * self.cols + x].glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Cells covered by a ship of `length` anchored at `origin`. Cells past the
/// grid edge are still produced; callers bounds-check. Coordinates saturate
/// at `usize::MAX`, which no grid contains.
pub fn ship_cells(length: usize, origin: Coord, orientation: Orientation) -> Vec<Coord> {
    (0..length)
        .map(|i| match orientation {
            Orientation::Horizontal => Coord::new(origin.x.saturating_add(i), origin.y),
            Orientation::Vertical => Coord::new(origin.x, origin.y.saturating_add(i)),
        })
        .collect()
}

/// True iff every cell the ship would cover is in bounds and `Empty`.
/// Ships may touch; there is no adjacency rule.
pub fn can_place_ship(grid: &Grid, length: usize, origin: Coord, orientation: Orientation) -> bool {
    ship_cells(length, origin, orientation)
        .into_iter()
        .all(|c| grid.get(c) == Some(CellState::Empty))
}

/// Mark the ship's cells `Ship` and record them as its positions. The caller
/// must have checked the placement with [`can_place_ship`].
pub fn place_ship(grid: &Grid, ship: &Ship, origin: Coord, orientation: Orientation) -> (Grid, Ship) {
    let mut new_grid = grid.clone();
    let positions = ship_cells(ship.length, origin, orientation);
    for &p in &positions {
        new_grid.set(p, CellState::Ship);
    }
    let new_ship = Ship {
        positions,
        ..ship.clone()
    };
    (new_grid, new_ship)
}

fn random_origin<R: Rng + ?Sized>(rng: &mut R, dims: GridDimensions) -> (Coord, Orientation) {
    let orientation = Orientation::from_horizontal(rng.random_bool(0.5));
    let x = rng.random_range(0..dims.cols);
    let y = rng.random_range(0..dims.rows);
    (Coord::new(x, y), orientation)
}

fn try_place_fleet<R: Rng + ?Sized>(
    roster: &[ShipConfig],
    dims: GridDimensions,
    rng: &mut R,
) -> Option<(Grid, Vec<Ship>)> {
    let mut grid = Grid::new(dims);
    let mut ships = Vec::with_capacity(roster.len());
    for config in roster {
        let ship = Ship::from_config(config);
        let mut placed = false;
        for _ in 0..PLACEMENT_ATTEMPTS {
            let (origin, orientation) = random_origin(rng, dims);
            if can_place_ship(&grid, ship.length, origin, orientation) {
                let (g, s) = place_ship(&grid, &ship, origin, orientation);
                grid = g;
                ships.push(s);
                placed = true;
                break;
            }
        }
        if !placed {
            log::debug!("could not place {} after {} draws", config.name, PLACEMENT_ATTEMPTS);
            return None;
        }
    }
    Some((grid, ships))
}

/// Place a whole roster at random. When any ship exhausts its draws the
/// entire fleet is thrown away and placement restarts from an empty grid.
/// The returned ships are in roster order.
pub fn place_all_ships_randomly<R: Rng + ?Sized>(
    roster: &[ShipConfig],
    dims: GridDimensions,
    rng: &mut R,
) -> Result<(Grid, Vec<Ship>), GameError> {
    let longest = dims.rows.max(dims.cols);
    let area: usize = roster.iter().map(|s| s.length).sum();
    if roster.iter().any(|s| s.length == 0 || s.length > longest) || area > dims.rows * dims.cols {
        return Err(GameError::UnableToPlaceFleet);
    }
    loop {
        if let Some((grid, mut ships)) = try_place_fleet(roster, dims, rng) {
            ships.sort_by_key(|s| roster.iter().position(|r| r.name == s.name));
            return Ok((grid, ships));
        }
        log::warn!("fleet placement exhausted its attempts, restarting");
    }
}

/// Random legal spot for `ship` on its owner's grid, ignoring the cells the
/// ship currently occupies. `None` when every draw failed.
pub fn find_random_valid_placement<R: Rng + ?Sized>(
    owner_grid: &Grid,
    ship: &Ship,
    rng: &mut R,
) -> Option<(Coord, Orientation)> {
    let grid = owner_grid.without(&ship.positions);
    for _ in 0..RELOCATION_ATTEMPTS {
        let (origin, orientation) = random_origin(rng, grid.dims());
        if can_place_ship(&grid, ship.length, origin, orientation) {
            return Some((origin, orientation));
        }
    }
    None
}
