//! Resource grid generation for activity sessions.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::game::content::ResourceSpec;
use crate::game::types::ResourceKind;

pub const GRID_DIM: usize = 3;
/// Every freshly generated grid carries exactly this many populated cells.
pub const NODES_PER_GRID: usize = 3;

/// A 3x3 field of resource nodes. Cells are cleared as they are harvested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGrid {
    cells: [[Option<ResourceKind>; GRID_DIM]; GRID_DIM],
}

fn clock_seed() -> u64 {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros() * 1000) as u64
}

impl ResourceGrid {
    /// Generate a fresh grid for one activity: shuffle the nine positions
    /// with a clock-seeded RNG, populate the first three, and draw each
    /// node's type from the activity's resource set. The seed only has to
    /// vary call-to-call; it carries no security weight.
    pub fn generate(resources: &[ResourceSpec]) -> Self {
        Self::generate_seeded(resources, clock_seed())
    }

    pub(crate) fn generate_seeded(resources: &[ResourceSpec], seed: u64) -> Self {
        debug_assert!(!resources.is_empty());
        let mut rng = StdRng::seed_from_u64(seed);

        let mut positions: Vec<(usize, usize)> = (0..GRID_DIM)
            .flat_map(|row| (0..GRID_DIM).map(move |col| (row, col)))
            .collect();
        positions.shuffle(&mut rng);

        let mut cells = [[None; GRID_DIM]; GRID_DIM];
        for &(row, col) in positions.iter().take(NODES_PER_GRID) {
            let pick = rng.gen_range(0..resources.len());
            cells[row][col] = Some(resources[pick].resource);
        }
        Self { cells }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<ResourceKind> {
        self.cells.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    /// Clear a harvested cell. Out-of-range coordinates are ignored.
    pub fn clear(&mut self, row: usize, col: usize) {
        if row < GRID_DIM && col < GRID_DIM {
            self.cells[row][col] = None;
        }
    }

    pub fn remaining(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| cell.is_some())
            .count()
    }

    pub fn is_depleted(&self) -> bool {
        self.remaining() == 0
    }

    pub fn cells(&self) -> &[[Option<ResourceKind>; GRID_DIM]; GRID_DIM] {
        &self.cells
    }
}
