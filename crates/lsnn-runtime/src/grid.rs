//! Dense 2-D lattice and the four lattice directions

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row-major dense 2-D grid
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Create a grid by calling `f(x, y)` for every cell
    pub fn create(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    /// Grid width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell at `(x, y)`, if inside the grid
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        (x < self.width && y < self.height).then(|| &self.cells[y * self.width + x])
    }

    /// Cell at possibly negative coordinates, if inside the grid
    pub fn get_signed(&self, x: isize, y: isize) -> Option<&T> {
        if x < 0 || y < 0 {
            return None;
        }
        self.get(x as usize, y as usize)
    }

    /// Mutable cell at `(x, y)`, if inside the grid
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        (x < self.width && y < self.height).then(|| &mut self.cells[y * self.width + x])
    }

    /// Iterate over `(x, y, &cell)` in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (i % width, i / width, cell))
    }

    /// Iterate over `(x, y, &mut cell)` in row-major order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.cells
            .iter_mut()
            .enumerate()
            .map(move |(i, cell)| (i % width, i / width, cell))
    }

    /// The backing row-major cell storage
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// The backing row-major cell storage, mutable
    pub(crate) fn cells_mut(&mut self) -> &mut [T] {
        &mut self.cells
    }

    /// Map every cell into a grid of the same shape
    pub fn map<U>(&self, mut f: impl FnMut(usize, usize, &T) -> U) -> Grid<U> {
        Grid::create(self.width, self.height, |x, y| {
            f(x, y, &self.cells[y * self.width + x])
        })
    }
}

/// Lattice direction, north up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Dir {
    /// Up (`y - 1`)
    N,
    /// Right (`x + 1`)
    E,
    /// Down (`y + 1`)
    S,
    /// Left (`x - 1`)
    W,
}

impl Dir {
    /// All directions in slot order
    pub const ALL: [Dir; 4] = [Dir::N, Dir::E, Dir::S, Dir::W];

    /// Horizontal offset
    pub fn dx(self) -> isize {
        match self {
            Dir::E => 1,
            Dir::W => -1,
            _ => 0,
        }
    }

    /// Vertical offset
    pub fn dy(self) -> isize {
        match self {
            Dir::N => -1,
            Dir::S => 1,
            _ => 0,
        }
    }

    /// Slot index inside per-direction signal vectors
    pub fn index(self) -> usize {
        match self {
            Dir::N => 0,
            Dir::E => 1,
            Dir::S => 2,
            Dir::W => 3,
        }
    }

    /// The direction a neighbor uses to point back at this cell
    pub fn opposite(self) -> Dir {
        match self {
            Dir::N => Dir::S,
            Dir::E => Dir::W,
            Dir::S => Dir::N,
            Dir::W => Dir::E,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_indexing() {
        let grid = Grid::create(3, 2, |x, y| (x, y));
        assert_eq!(grid.get(2, 1), Some(&(2, 1)));
        assert_eq!(grid.get(3, 0), None);
        assert_eq!(grid.get_signed(-1, 0), None);
        assert_eq!(grid.get_signed(1, 1), Some(&(1, 1)));
    }

    #[test]
    fn test_iteration_order_is_row_major() {
        let grid = Grid::create(2, 2, |x, y| (x, y));
        let order: Vec<_> = grid.iter().map(|(x, y, _)| (x, y)).collect();
        assert_eq!(order, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn test_opposite_directions() {
        for dir in Dir::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_eq!(dir.dx(), -dir.opposite().dx());
            assert_eq!(dir.dy(), -dir.opposite().dy());
        }
    }
}
