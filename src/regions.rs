//! Region remover: clears 4-connected same-colour regions of four or more.

use crate::grid::Grid;
use std::collections::VecDeque;

/// Smallest region that gets cleared.
pub const MIN_REGION_SIZE: usize = 4;

/// Points awarded per particle removed.
pub const POINTS_PER_PARTICLE: u32 = 10;

const NEIGHBOURS_4: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Outcome of one clearing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clearing {
    /// Number of disjoint regions removed.
    pub regions: usize,
    /// Every removed cell, region by region.
    pub cells: Vec<(usize, usize)>,
}

impl Clearing {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn points(&self) -> u32 {
        self.cells.len() as u32 * POINTS_PER_PARTICLE
    }
}

/// Every maximal same-colour region of at least `min_size` cells. Cells are
/// scanned column by column; each region is flood-filled breadth first from
/// its first unvisited cell, matching colour by strict equality.
pub fn find_regions(grid: &Grid, min_size: usize) -> Vec<Vec<(usize, usize)>> {
    let (width, height) = (grid.width(), grid.height());
    let mut visited = vec![false; width * height];
    let mut regions = Vec::new();

    for x in 0..width {
        for y in 0..height {
            if visited[y * width + x] {
                continue;
            }
            let Some(color) = grid.color_at(x, y) else {
                continue;
            };
            visited[y * width + x] = true;
            let mut region = Vec::new();
            let mut queue = VecDeque::from([(x, y)]);
            while let Some((cx, cy)) = queue.pop_front() {
                region.push((cx, cy));
                for (dx, dy) in NEIGHBOURS_4 {
                    let (nx, ny) = (cx as i32 + dx, cy as i32 + dy);
                    if !grid.in_bounds(nx, ny) {
                        continue;
                    }
                    let (nx, ny) = (nx as usize, ny as usize);
                    let idx = ny * width + nx;
                    if !visited[idx] && grid.color_at(nx, ny) == Some(color) {
                        visited[idx] = true;
                        queue.push_back((nx, ny));
                    }
                }
            }
            if region.len() >= min_size {
                regions.push(region);
            }
        }
    }
    regions
}

/// Finds every qualifying region, adds the points to `score`, then empties
/// the cells. All regions found in one scan are removed together.
pub fn remove_regions(grid: &mut Grid, score: &mut u32) -> Clearing {
    let regions = find_regions(grid, MIN_REGION_SIZE);
    let clearing = Clearing {
        regions: regions.len(),
        cells: regions.into_iter().flatten().collect(),
    };
    if clearing.is_empty() {
        return clearing;
    }
    *score = score.saturating_add(clearing.points());
    for &(x, y) in &clearing.cells {
        grid.remove_at(x, y);
    }
    clearing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(grid: &mut Grid, cells: &[(usize, usize)], color: u8) {
        for &(x, y) in cells {
            grid.insert(x, y, color).unwrap();
        }
    }

    #[test]
    fn l_shape_of_four_is_cleared() {
        let mut grid = Grid::new(10, 20);
        fill(&mut grid, &[(2, 16), (2, 17), (2, 18), (3, 18)], 1);
        let mut score = 0;
        let clearing = remove_regions(&mut grid, &mut score);
        assert_eq!(clearing.regions, 1);
        assert_eq!(clearing.cells.len(), 4);
        assert_eq!(score, 40);
        assert!(grid.is_empty());
        grid.assert_consistent();
    }

    #[test]
    fn three_in_a_row_stays() {
        let mut grid = Grid::new(10, 20);
        fill(&mut grid, &[(0, 19), (1, 19), (2, 19)], 3);
        let mut score = 5;
        let clearing = remove_regions(&mut grid, &mut score);
        assert!(clearing.is_empty());
        assert_eq!(score, 5);
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn diagonal_neighbours_do_not_connect() {
        let mut grid = Grid::new(5, 5);
        fill(&mut grid, &[(0, 0), (1, 1), (2, 2), (3, 3)], 0);
        assert!(find_regions(&grid, MIN_REGION_SIZE).is_empty());
    }

    #[test]
    fn different_colours_split_regions() {
        let mut grid = Grid::new(5, 5);
        fill(&mut grid, &[(0, 4), (1, 4)], 0);
        fill(&mut grid, &[(2, 4), (3, 4)], 1);
        assert!(find_regions(&grid, MIN_REGION_SIZE).is_empty());
    }

    #[test]
    fn disjoint_regions_cleared_together() {
        let mut grid = Grid::new(10, 10);
        fill(&mut grid, &[(0, 9), (1, 9), (2, 9), (3, 9)], 0);
        fill(&mut grid, &[(6, 6), (6, 7), (6, 8), (6, 9), (7, 9)], 2);
        fill(&mut grid, &[(9, 9), (9, 8)], 0);
        let mut score = 0;
        let clearing = remove_regions(&mut grid, &mut score);
        assert_eq!(clearing.regions, 2);
        assert_eq!(clearing.cells.len(), 9);
        assert_eq!(score, 90);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.color_at(9, 9), Some(0));
        grid.assert_consistent();
    }

    #[test]
    fn region_is_maximal() {
        let mut grid = Grid::new(6, 6);
        // 3x3 block of one colour: found once, all nine cells.
        for x in 1..4 {
            for y in 2..5 {
                grid.insert(x, y, 4).unwrap();
            }
        }
        let regions = find_regions(&grid, MIN_REGION_SIZE);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].len(), 9);
        assert_eq!(regions[0][0], (1, 2));
    }

    #[test]
    fn empty_grid_is_a_no_op() {
        let mut grid = Grid::new(4, 4);
        let mut score = 0;
        assert!(remove_regions(&mut grid, &mut score).is_empty());
        assert_eq!(score, 0);
    }
}
