//! Bounded 2D grid of colored objects.

use antsort_core::{
    object_count, validate_grid, Color, GridView, Position, Result, SimulationConfig, EMPTY,
};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::warn;

/// A 2D grid with hard edges (no wraparound).
///
/// Each cell is `EMPTY` or holds one object of color `1..=num_colors`. An index
/// of empty cells is kept in step with every write.
#[derive(Debug, Clone)]
pub struct GridWorld {
    height: i32,
    width: i32,
    num_colors: Color,
    cells: Vec<Color>,
    empty: EmptyIndex,
}

impl GridWorld {
    /// Create an all-empty grid
    pub fn empty(height: u32, width: u32, num_colors: u32) -> Result<Self> {
        validate_grid(height, width, num_colors, 0.0)?;

        let size = height as usize * width as usize;
        Ok(Self {
            height: height as i32,
            width: width as i32,
            num_colors: num_colors as Color,
            cells: vec![EMPTY; size],
            empty: EmptyIndex::full(size),
        })
    }

    /// Create a grid with `round(height * width * fill_fraction)` objects.
    ///
    /// Colors get equal shares, the first `total % num_colors` colors one extra.
    /// Positions come from a shuffled list of every cell, consumed color by
    /// color, so a given rng state always yields the same layout.
    pub fn new(
        height: u32,
        width: u32,
        num_colors: u32,
        fill_fraction: f64,
        rng: &mut ChaCha8Rng,
    ) -> Result<Self> {
        validate_grid(height, width, num_colors, fill_fraction)?;
        let mut grid = Self::empty(height, width, num_colors)?;

        let total = object_count(height, width, fill_fraction);
        let per_color = total / num_colors as usize;
        let remainder = total % num_colors as usize;

        let mut positions: Vec<usize> = (0..grid.cells.len()).collect();
        positions.shuffle(rng);
        let mut positions = positions.into_iter();

        for color in 1..=num_colors as usize {
            let count = per_color + usize::from(color <= remainder);
            for index in positions.by_ref().take(count) {
                grid.write(index, color as Color);
            }
        }

        Ok(grid)
    }

    /// Create a grid from simulation configuration
    pub fn from_config(config: &SimulationConfig, rng: &mut ChaCha8Rng) -> Result<Self> {
        Self::new(
            config.height,
            config.width,
            config.num_colors,
            config.fill_fraction,
            rng,
        )
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn num_colors(&self) -> Color {
        self.num_colors
    }

    pub fn is_valid(&self, row: i32, col: i32) -> bool {
        row >= 0 && row < self.height && col >= 0 && col < self.width
    }

    /// Color at a cell; `EMPTY` for coordinates off the grid
    pub fn get(&self, row: i32, col: i32) -> Color {
        if !self.is_valid(row, col) {
            return EMPTY;
        }
        self.cells[self.pos_to_index(row, col)]
    }

    /// Write a cell. Off-grid coordinates are ignored, as are colors above
    /// `num_colors`.
    pub fn set(&mut self, row: i32, col: i32, value: Color) {
        if !self.is_valid(row, col) {
            return;
        }
        if value > self.num_colors {
            warn!(
                row,
                col,
                value,
                num_colors = self.num_colors,
                "Ignoring write of out-of-range color"
            );
            return;
        }
        let index = self.pos_to_index(row, col);
        self.write(index, value);
    }

    pub fn is_empty(&self, row: i32, col: i32) -> bool {
        self.get(row, col) == EMPTY
    }

    /// In-bounds cells within `radius` (Chebyshev) of a cell, excluding the
    /// cell itself. With radius 1: 3 at a corner, 5 on an edge, 8 inside.
    /// A negative radius yields nothing.
    pub fn neighbors(&self, row: i32, col: i32, radius: i32) -> Vec<(Position, Color)> {
        self.neighborhood(row, col, radius).collect()
    }

    /// Fraction of all in-bounds neighbors (empty ones included) holding
    /// `color`. 0.0 when the cell has no neighbors.
    pub fn local_similarity(&self, row: i32, col: i32, color: Color) -> f64 {
        let mut total = 0u32;
        let mut matching = 0u32;
        for (_, value) in self.neighborhood(row, col, 1) {
            total += 1;
            if value == color {
                matching += 1;
            }
        }

        if total == 0 {
            return 0.0;
        }
        matching as f64 / total as f64
    }

    pub fn empty_count(&self) -> usize {
        self.empty.len()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.len() - self.empty.len()
    }

    /// Pick an empty cell uniformly at random in O(1)
    pub fn random_empty_cell(&self, rng: &mut ChaCha8Rng) -> Option<Position> {
        if self.empty.is_empty() {
            return None;
        }
        let index = self.empty.get(rng.gen_range(0..self.empty.len()));
        Some(self.index_to_pos(index))
    }

    /// Object count per color; entry `i` counts color `i + 1`.
    pub fn color_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_colors as usize];
        for &value in &self.cells {
            if value != EMPTY {
                counts[value as usize - 1] += 1;
            }
        }
        counts
    }

    /// Row slices, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Color]> + '_ {
        self.cells.chunks(self.width as usize)
    }

    /// Iterator over all cells with positions
    pub fn iter(&self) -> impl Iterator<Item = (Position, Color)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &value)| (self.index_to_pos(i), value))
    }

    fn neighborhood(
        &self,
        row: i32,
        col: i32,
        radius: i32,
    ) -> impl Iterator<Item = (Position, Color)> + '_ {
        // A radius past the larger side already covers the whole grid.
        let radius = radius.clamp(0, self.height.max(self.width));
        (-radius..=radius)
            .flat_map(move |dr| (-radius..=radius).map(move |dc| (dr, dc)))
            .filter(|&(dr, dc)| dr != 0 || dc != 0)
            .map(move |(dr, dc)| Position::new(row.saturating_add(dr), col.saturating_add(dc)))
            .filter(move |pos| self.is_valid(pos.row, pos.col))
            .map(move |pos| (pos, self.cells[self.pos_to_index(pos.row, pos.col)]))
    }

    fn write(&mut self, index: usize, value: Color) {
        let old = std::mem::replace(&mut self.cells[index], value);
        if old != EMPTY && value == EMPTY {
            self.empty.insert(index);
        } else if old == EMPTY && value != EMPTY {
            self.empty.remove(index);
        }
    }

    fn pos_to_index(&self, row: i32, col: i32) -> usize {
        (row * self.width + col) as usize
    }

    fn index_to_pos(&self, index: usize) -> Position {
        let row = (index as i32) / self.width;
        let col = (index as i32) % self.width;
        Position::new(row, col)
    }
}

impl GridView for GridWorld {
    fn height(&self) -> i32 {
        self.height
    }

    fn width(&self) -> i32 {
        self.width
    }

    fn get(&self, row: i32, col: i32) -> Color {
        GridWorld::get(self, row, col)
    }
}

/// Set of cell indices with O(1) insert, remove and random access.
///
/// `members` holds the indices densely; `slots[i]` is where index `i` sits in
/// `members`, if present.
#[derive(Debug, Clone)]
struct EmptyIndex {
    members: Vec<usize>,
    slots: Vec<Option<usize>>,
}

impl EmptyIndex {
    fn full(size: usize) -> Self {
        Self {
            members: (0..size).collect(),
            slots: (0..size).map(Some).collect(),
        }
    }

    fn len(&self) -> usize {
        self.members.len()
    }

    fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn get(&self, slot: usize) -> usize {
        self.members[slot]
    }

    fn contains(&self, index: usize) -> bool {
        self.slots[index].is_some()
    }

    fn insert(&mut self, index: usize) {
        if self.contains(index) {
            return;
        }
        self.slots[index] = Some(self.members.len());
        self.members.push(index);
    }

    fn remove(&mut self, index: usize) {
        let Some(slot) = self.slots[index].take() else {
            return;
        };
        self.members.swap_remove(slot);
        if let Some(&moved) = self.members.get(slot) {
            self.slots[moved] = Some(slot);
        }
    }
}
