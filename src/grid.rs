//! Grid: fixed-size cell store over an arena of particles.
//!
//! Cells hold optional [`ParticleId`] handles into the arena; each particle
//! records its own coordinate. Every mutation goes through this type so the
//! handle in a cell and the coordinate on the particle never disagree.

/// Handle to a particle in the grid's arena. Stale handles (particle removed)
/// resolve to nothing, even if the slot has since been reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticleId {
    index: u32,
    generation: u32,
}

/// A single coloured unit. Identity is the [`ParticleId`]; moving a particle
/// rewrites its coordinate, never the particle itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Particle {
    pub(crate) x: usize,
    pub(crate) y: usize,
    /// Index into the simulation palette.
    pub color: u8,
}

impl Particle {
    #[inline]
    pub fn x(&self) -> usize {
        self.x
    }

    #[inline]
    pub fn y(&self) -> usize {
        self.y
    }

    #[inline]
    pub fn position(&self) -> (usize, usize) {
        (self.x, self.y)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    particle: Option<Particle>,
}

/// Playfield of `width` x `height` cells. y=0 is the top row.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    /// cells[y * width + x]
    cells: Vec<Option<ParticleId>>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of particles on the grid.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Signed so callers can test `x + dx` without underflow.
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Handle of the particle at `(x, y)`; `None` when empty or out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<ParticleId> {
        self.index(x, y).and_then(|i| self.cells[i])
    }

    /// True if `(x, y)` is in bounds and unoccupied.
    #[inline]
    pub fn is_free(&self, x: usize, y: usize) -> bool {
        self.index(x, y).is_some_and(|i| self.cells[i].is_none())
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.particle.as_ref())
    }

    pub fn particle_at(&self, x: usize, y: usize) -> Option<&Particle> {
        self.get(x, y).and_then(|id| self.particle(id))
    }

    /// Palette index at `(x, y)`.
    #[inline]
    pub fn color_at(&self, x: usize, y: usize) -> Option<u8> {
        self.particle_at(x, y).map(|p| p.color)
    }

    /// Raw cell write. Touches only the one cell; callers moving a particle
    /// must clear its old cell first and keep its coordinate in step.
    pub(crate) fn set(&mut self, x: usize, y: usize, cell: Option<ParticleId>) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = cell;
        }
    }

    /// Rewrites a particle's stored coordinate without touching any cell.
    pub(crate) fn relocate(&mut self, id: ParticleId, x: usize, y: usize) {
        if let Some(p) = self.particle_mut(id) {
            p.x = x;
            p.y = y;
        }
    }

    fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.particle.as_mut())
    }

    /// Creates a particle at a free cell. Returns `None` if the cell is
    /// occupied or out of bounds.
    pub fn insert(&mut self, x: usize, y: usize, color: u8) -> Option<ParticleId> {
        if !self.is_free(x, y) {
            return None;
        }
        let particle = Particle { x, y, color };
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.particle = Some(particle);
                ParticleId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    particle: Some(particle),
                });
                ParticleId {
                    index,
                    generation: 0,
                }
            }
        };
        self.set(x, y, Some(id));
        self.len += 1;
        Some(id)
    }

    /// Moves one particle to a free cell: old cell cleared, new cell set,
    /// coordinate updated. Returns false (and changes nothing) otherwise.
    pub fn move_particle(&mut self, id: ParticleId, x: usize, y: usize) -> bool {
        let Some((ox, oy)) = self.particle(id).map(Particle::position) else {
            return false;
        };
        if !self.is_free(x, y) {
            return false;
        }
        self.set(ox, oy, None);
        self.relocate(id, x, y);
        self.set(x, y, Some(id));
        true
    }

    /// Empties `(x, y)` and destroys the particle there.
    pub fn remove_at(&mut self, x: usize, y: usize) -> Option<Particle> {
        let id = self.get(x, y)?;
        self.set(x, y, None);
        let slot = &mut self.slots[id.index as usize];
        let particle = slot.particle.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        particle
    }

    /// Drops every particle and empties every cell. Slots are retired like
    /// [`Self::remove_at`] does, so handles from before the clear stay stale.
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.particle.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.len = 0;
    }

    /// Live particles in arena order.
    pub fn particles(&self) -> impl Iterator<Item = (ParticleId, &Particle)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.particle.as_ref().map(|p| {
                (
                    ParticleId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    p,
                )
            })
        })
    }

    /// Per-cell palette index, row-major.
    pub fn colors(&self) -> Vec<Option<u8>> {
        self.cells
            .iter()
            .map(|cell| cell.and_then(|id| self.particle(id)).map(|p| p.color))
            .collect()
    }

    /// Single-occupancy check: every cell handle resolves to a particle whose
    /// coordinate is that cell, and every live particle is referenced once.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let mut referenced = 0;
        for y in 0..self.height {
            for x in 0..self.width {
                if let Some(id) = self.get(x, y) {
                    let p = self
                        .particle(id)
                        .unwrap_or_else(|| panic!("stale handle at ({x}, {y})"));
                    assert_eq!(p.position(), (x, y), "coordinate mismatch");
                    referenced += 1;
                }
            }
        }
        assert_eq!(referenced, self.len);
        assert_eq!(self.particles().count(), self.len);
    }
}
