//! Cluster controller: spawn a vertical stack of particles and move it as one
//! rigid unit until it can no longer descend.

use crate::config::SimConfig;
use crate::grid::{Grid, Particle, ParticleId};
use crate::random::RandomSource;
use thiserror::Error;

/// Why a new cluster could not be placed. Either case ends the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpawnError {
    #[error("spawn cell ({x}, {y}) is already occupied")]
    Occupied { x: usize, y: usize },
    #[error("spawn cell ({x}, {y}) is outside the grid")]
    OutOfBounds { x: usize, y: usize },
}

/// Particles spawned together, top member first. Holds handles only; the
/// particles themselves stay owned by the [`Grid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    members: Vec<ParticleId>,
}

impl Cluster {
    /// Stacks a randomly sized cluster in the spawn column from row 0 down,
    /// each particle with an independently chosen colour.
    ///
    /// Every target cell is checked before anything is placed, so a failed
    /// spawn leaves the grid untouched.
    pub fn spawn<R: RandomSource + ?Sized>(
        grid: &mut Grid,
        config: &SimConfig,
        rng: &mut R,
    ) -> Result<Self, SpawnError> {
        let (min, max) = (*config.cluster_sizes.start(), *config.cluster_sizes.end());
        let size = min + rng.pick(max - min + 1);
        let x = config.start_column();

        for y in 0..size {
            if !grid.in_bounds(x as i32, y as i32) {
                return Err(SpawnError::OutOfBounds { x, y });
            }
            if grid.get(x, y).is_some() {
                return Err(SpawnError::Occupied { x, y });
            }
        }

        let mut members = Vec::with_capacity(size);
        for y in 0..size {
            let color = rng.pick(config.palette.len()) as u8;
            // Cells were checked free above.
            if let Some(id) = grid.insert(x, y, color) {
                members.push(id);
            }
        }
        Ok(Self { members })
    }

    /// Wraps already-placed particles as a cluster.
    pub fn from_members(members: Vec<ParticleId>) -> Self {
        Self { members }
    }

    #[inline]
    pub fn members(&self) -> &[ParticleId] {
        &self.members
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: ParticleId) -> bool {
        self.members.contains(&id)
    }

    /// Current member coordinates, in member order.
    pub fn positions(&self, grid: &Grid) -> Vec<(usize, usize)> {
        self.members
            .iter()
            .filter_map(|&id| grid.particle(id).map(Particle::position))
            .collect()
    }

    /// Lateral move check. Each destination must be in bounds and empty or
    /// held by another member.
    pub fn can_shift(&self, grid: &Grid, dx: i32) -> bool {
        self.can_offset(grid, dx, 0)
    }

    /// Moves every member by `dx`. Caller must have checked [`Self::can_shift`].
    pub fn shift(&self, grid: &mut Grid, dx: i32) {
        debug_assert!(self.can_shift(grid, dx), "shift without can_shift");
        self.offset(grid, dx, 0);
    }

    /// True if every member can move one row down.
    pub fn can_descend(&self, grid: &Grid) -> bool {
        self.can_offset(grid, 0, 1)
    }

    /// Moves every member one row down. Caller must have checked
    /// [`Self::can_descend`].
    pub fn descend(&self, grid: &mut Grid) {
        debug_assert!(self.can_descend(grid), "descend without can_descend");
        self.offset(grid, 0, 1);
    }

    fn can_offset(&self, grid: &Grid, dx: i32, dy: i32) -> bool {
        self.positions(grid).into_iter().all(|(x, y)| {
            let (nx, ny) = (x as i32 + dx, y as i32 + dy);
            grid.in_bounds(nx, ny)
                && grid
                    .get(nx as usize, ny as usize)
                    .is_none_or(|id| self.contains(id))
        })
    }

    /// Clear all, move all, rewrite all: members never collide with each other.
    fn offset(&self, grid: &mut Grid, dx: i32, dy: i32) {
        let moves: Vec<(ParticleId, usize, usize)> = self
            .members
            .iter()
            .filter_map(|&id| grid.particle(id).map(|p| (id, p.x(), p.y())))
            .collect();
        for &(_, x, y) in &moves {
            grid.set(x, y, None);
        }
        for &(id, x, y) in &moves {
            let nx = (x as i32 + dx) as usize;
            let ny = (y as i32 + dy) as usize;
            grid.relocate(id, nx, ny);
            grid.set(nx, ny, Some(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::Scripted;

    fn column_cluster(grid: &mut Grid, x: usize, ys: std::ops::Range<usize>) -> Cluster {
        let members = ys.map(|y| grid.insert(x, y, 0).unwrap()).collect();
        Cluster::from_members(members)
    }

    #[test]
    fn spawn_stacks_in_start_column() {
        let mut grid = Grid::new(10, 20);
        let config = SimConfig::default();
        // size pick 0 -> 3 particles, then colours 4, 1, 6
        let mut rng = Scripted::new([0, 4, 1, 6]);
        let cluster = Cluster::spawn(&mut grid, &config, &mut rng).unwrap();
        assert_eq!(cluster.len(), 3);
        assert_eq!(cluster.positions(&grid), vec![(5, 0), (5, 1), (5, 2)]);
        assert_eq!(grid.color_at(5, 0), Some(4));
        assert_eq!(grid.color_at(5, 1), Some(1));
        assert_eq!(grid.color_at(5, 2), Some(6));
        grid.assert_consistent();
    }

    #[test]
    fn spawn_size_covers_range() {
        let config = SimConfig::default();
        for (pick, expected) in [(0, 3), (1, 4), (2, 5)] {
            let mut grid = Grid::new(10, 20);
            let mut rng = Scripted::new([pick, 0]);
            let cluster = Cluster::spawn(&mut grid, &config, &mut rng).unwrap();
            assert_eq!(cluster.len(), expected);
        }
    }

    #[test]
    fn spawn_onto_occupied_cell_fails_without_placing() {
        let mut grid = Grid::new(10, 20);
        grid.insert(5, 2, 0);
        let config = SimConfig::default();
        let mut rng = Scripted::new([2, 0]);
        let err = Cluster::spawn(&mut grid, &config, &mut rng).unwrap_err();
        assert_eq!(err, SpawnError::Occupied { x: 5, y: 2 });
        assert_eq!(grid.len(), 1);
        assert!(grid.get(5, 0).is_none());
        assert!(grid.get(5, 1).is_none());
    }

    #[test]
    fn spawn_taller_than_grid_is_out_of_bounds() {
        let config = SimConfig::with_size(10, 2);
        let mut grid = Grid::new(10, 2);
        let mut rng = Scripted::new([0]);
        let err = Cluster::spawn(&mut grid, &config, &mut rng).unwrap_err();
        assert_eq!(err, SpawnError::OutOfBounds { x: 5, y: 2 });
        assert!(grid.is_empty());
    }

    #[test]
    fn descend_until_floor() {
        let mut grid = Grid::new(10, 20);
        let cluster = column_cluster(&mut grid, 5, 0..3);
        let mut steps = 0;
        while cluster.can_descend(&grid) {
            cluster.descend(&mut grid);
            steps += 1;
            grid.assert_consistent();
        }
        assert_eq!(steps, 17);
        assert_eq!(cluster.positions(&grid), vec![(5, 17), (5, 18), (5, 19)]);
    }

    #[test]
    fn descend_blocked_by_settled_particle() {
        let mut grid = Grid::new(10, 20);
        grid.insert(5, 10, 2);
        let cluster = column_cluster(&mut grid, 5, 6..10);
        assert!(!cluster.can_descend(&grid));
    }

    #[test]
    fn blocked_lateral_move() {
        let mut grid = Grid::new(10, 20);
        grid.insert(4, 10, 1);
        let cluster = column_cluster(&mut grid, 5, 8..11);
        let before = cluster.positions(&grid);
        assert!(!cluster.can_shift(&grid, -1));
        assert_eq!(cluster.positions(&grid), before);
        assert!(cluster.can_shift(&grid, 1));
    }

    #[test]
    fn shift_respects_walls() {
        let mut grid = Grid::new(10, 20);
        let left = column_cluster(&mut grid, 0, 0..2);
        assert!(!left.can_shift(&grid, -1));
        let right = column_cluster(&mut grid, 9, 0..2);
        assert!(!right.can_shift(&grid, 1));
    }

    #[test]
    fn shift_moves_every_member_by_same_delta() {
        let mut grid = Grid::new(10, 20);
        let cluster = column_cluster(&mut grid, 5, 3..7);
        let ids: Vec<_> = cluster.members().to_vec();
        cluster.shift(&mut grid, 1);
        assert_eq!(
            cluster.positions(&grid),
            vec![(6, 3), (6, 4), (6, 5), (6, 6)]
        );
        // Same particles, not recreated.
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(grid.get(6, 3 + i), Some(*id));
            assert!(grid.get(5, 3 + i).is_none());
        }
        grid.assert_consistent();
    }

    #[test]
    fn horizontal_cluster_may_move_into_own_cells() {
        let mut grid = Grid::new(10, 20);
        let members = (2..5).map(|x| grid.insert(x, 0, 0).unwrap()).collect();
        let cluster = Cluster::from_members(members);
        assert!(cluster.can_shift(&grid, 1));
        cluster.shift(&mut grid, 1);
        assert_eq!(cluster.positions(&grid), vec![(3, 0), (4, 0), (5, 0)]);
        assert!(grid.get(2, 0).is_none());
        grid.assert_consistent();
    }
}
