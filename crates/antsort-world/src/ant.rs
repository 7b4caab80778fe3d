//! Ant agent: stochastic pick/drop rules and random walk.

use crate::grid::GridWorld;
use antsort_core::{Color, Direction, Position, EMPTY};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// What an ant did to the grid during one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// Lifted the object it stood on
    Picked(Color),
    /// Put its object down on an empty cell
    Dropped(Color),
    /// Left the grid untouched
    Idle,
}

/// Lifetime pick/drop counters for one ant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntStats {
    pub picks: u64,
    pub drops: u64,
    pub moves: u64,
}

/// An ant on the grid
#[derive(Debug, Clone)]
pub struct Ant {
    position: Position,
    carrying: Option<Color>,
    k1: f64,
    k2: f64,
    stats: AntStats,
}

impl Ant {
    pub fn new(position: Position, k1: f64, k2: f64) -> Self {
        Self {
            position,
            carrying: None,
            k1,
            k2,
            stats: AntStats::default(),
        }
    }

    /// Place an ant on a uniformly random cell
    pub fn random(grid: &GridWorld, k1: f64, k2: f64, rng: &mut ChaCha8Rng) -> Self {
        let row = rng.gen_range(0..grid.height());
        let col = rng.gen_range(0..grid.width());
        Self::new(Position::new(row, col), k1, k2)
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn carrying(&self) -> Option<Color> {
        self.carrying
    }

    pub fn is_carrying(&self) -> bool {
        self.carrying.is_some()
    }

    pub fn k1(&self) -> f64 {
        self.k1
    }

    pub fn k2(&self) -> f64 {
        self.k2
    }

    pub fn stats(&self) -> AntStats {
        self.stats
    }

    /// `(k1 / (k1 + s))^2`
    pub fn pick_probability(&self, similarity: f64) -> f64 {
        let p = self.k1 / (self.k1 + similarity);
        p * p
    }

    /// `(s / (k2 + s))^2`
    pub fn drop_probability(&self, similarity: f64) -> f64 {
        let p = similarity / (self.k2 + similarity);
        p * p
    }

    /// Advance one tick: pick or drop, then move.
    ///
    /// Both rules look at the cell value read at the start of the step, so at
    /// most one of them applies and at most one cell is written.
    pub fn step(&mut self, grid: &mut GridWorld, rng: &mut ChaCha8Rng) -> StepOutcome {
        let Position { row, col } = self.position;
        let cell = grid.get(row, col);

        let outcome = match self.carrying {
            None if cell != EMPTY => self.try_pick(grid, cell, rng),
            Some(color) if cell == EMPTY => self.try_drop(grid, color, rng),
            _ => StepOutcome::Idle,
        };

        self.random_move(grid, rng);
        outcome
    }

    fn try_pick(&mut self, grid: &mut GridWorld, cell: Color, rng: &mut ChaCha8Rng) -> StepOutcome {
        let Position { row, col } = self.position;
        let similarity = grid.local_similarity(row, col, cell);
        let p_pick = self.pick_probability(similarity);

        if rng.gen::<f64>() < p_pick {
            grid.set(row, col, EMPTY);
            self.carrying = Some(cell);
            self.stats.picks += 1;
            trace!(row, col, color = cell, similarity, p_pick, "Ant picked object");
            StepOutcome::Picked(cell)
        } else {
            StepOutcome::Idle
        }
    }

    fn try_drop(&mut self, grid: &mut GridWorld, color: Color, rng: &mut ChaCha8Rng) -> StepOutcome {
        let Position { row, col } = self.position;
        let similarity = grid.local_similarity(row, col, color);
        let p_drop = self.drop_probability(similarity);

        if rng.gen::<f64>() < p_drop {
            grid.set(row, col, color);
            self.carrying = None;
            self.stats.drops += 1;
            trace!(row, col, color, similarity, p_drop, "Ant dropped object");
            StepOutcome::Dropped(color)
        } else {
            StepOutcome::Idle
        }
    }

    /// Move to a uniformly chosen in-bounds neighbor; stay put if there is none.
    fn random_move(&mut self, grid: &GridWorld, rng: &mut ChaCha8Rng) {
        let mut valid = [Direction::North; 8];
        let mut count = 0;
        for direction in Direction::all() {
            let next = self.position.step(direction);
            if grid.is_valid(next.row, next.col) {
                valid[count] = direction;
                count += 1;
            }
        }

        if let Some(&direction) = valid[..count].choose(rng) {
            self.position = self.position.step(direction);
            self.stats.moves += 1;
        }
    }

    pub fn snapshot(&self) -> AntSnapshot {
        AntSnapshot::from(self)
    }
}

/// Serializable ant state for renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntSnapshot {
    pub row: i32,
    pub col: i32,
    pub carrying: Option<Color>,
}

impl From<&Ant> for AntSnapshot {
    fn from(ant: &Ant) -> Self {
        Self {
            row: ant.position.row,
            col: ant.position.col,
            carrying: ant.carrying,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    #[test]
    fn test_ant_creation() {
        let ant = Ant::new(Position::new(2, 3), 0.3, 0.15);
        assert_eq!(ant.position(), Position::new(2, 3));
        assert_eq!(ant.carrying(), None);
        assert_eq!(ant.stats(), AntStats::default());
    }

    #[test]
    fn test_random_placement_in_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let grid = GridWorld::empty(4, 7, 2).unwrap();
        for _ in 0..100 {
            let ant = Ant::random(&grid, 0.3, 0.15, &mut rng);
            let pos = ant.position();
            assert!(grid.is_valid(pos.row, pos.col));
        }
    }

    #[test]
    fn test_probability_formulas() {
        let ant = Ant::new(Position::new(0, 0), 0.3, 0.15);

        assert_eq!(ant.pick_probability(0.0), 1.0);
        assert!((ant.pick_probability(1.0) - (0.3f64 / 1.3).powi(2)).abs() < 1e-12);

        assert_eq!(ant.drop_probability(0.0), 0.0);
        assert!((ant.drop_probability(0.5) - (0.5f64 / 0.65).powi(2)).abs() < 1e-12);

        // pick falls and drop rises as similarity grows
        assert!(ant.pick_probability(0.25) > ant.pick_probability(0.75));
        assert!(ant.drop_probability(0.25) < ant.drop_probability(0.75));
    }

    #[test]
    fn test_isolated_object_is_always_picked() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut grid = GridWorld::empty(5, 5, 2).unwrap();
        grid.set(2, 2, 2);

        let mut ant = Ant::new(Position::new(2, 2), 0.3, 0.15);
        let outcome = ant.step(&mut grid, &mut rng);

        assert_eq!(outcome, StepOutcome::Picked(2));
        assert_eq!(ant.carrying(), Some(2));
        assert_eq!(grid.get(2, 2), EMPTY);
        assert_eq!(ant.stats().picks, 1);
        assert_eq!(ant.position().chebyshev_distance(&Position::new(2, 2)), 1);
    }

    #[test]
    fn test_never_drops_without_matching_neighbors() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut grid = GridWorld::empty(6, 6, 2).unwrap();
        // only color 2 on the grid, the ant carries color 1
        grid.set(0, 0, 2);

        let mut ant = Ant::new(Position::new(3, 3), 0.3, 0.15);
        ant.carrying = Some(1);

        for _ in 0..500 {
            assert_eq!(ant.step(&mut grid, &mut rng), StepOutcome::Idle);
        }
        assert_eq!(ant.carrying(), Some(1));
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn test_drops_next_to_matching_objects() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut grid = GridWorld::empty(3, 3, 1).unwrap();
        for (row, col) in [(0, 0), (0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1), (2, 2)] {
            grid.set(row, col, 1);
        }

        // s = 1 at the centre, so P_drop is within 1e-11 of certain
        let mut ant = Ant::new(Position::new(1, 1), 0.3, 1e-12);
        ant.carrying = Some(1);

        assert_eq!(ant.step(&mut grid, &mut rng), StepOutcome::Dropped(1));
        assert_eq!(grid.get(1, 1), 1);
        assert_eq!(ant.carrying(), None);
        assert_eq!(grid.empty_count(), 0);
    }

    #[test]
    fn test_no_action_when_rules_do_not_apply() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let mut grid = GridWorld::empty(4, 4, 2).unwrap();

        // empty-handed on an empty cell
        let mut idle = Ant::new(Position::new(1, 1), 0.3, 0.15);
        assert_eq!(idle.step(&mut grid, &mut rng), StepOutcome::Idle);

        // carrying on an occupied cell
        grid.set(2, 2, 1);
        let mut loaded = Ant::new(Position::new(2, 2), 0.3, 0.15);
        loaded.carrying = Some(2);
        assert_eq!(loaded.step(&mut grid, &mut rng), StepOutcome::Idle);
        assert_eq!(grid.get(2, 2), 1);
        assert_eq!(loaded.carrying(), Some(2));
    }

    #[test]
    fn test_single_cell_grid_never_moves() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut grid = GridWorld::empty(1, 1, 1).unwrap();
        let mut ant = Ant::new(Position::new(0, 0), 0.3, 0.15);

        for _ in 0..20 {
            ant.step(&mut grid, &mut rng);
            assert_eq!(ant.position(), Position::new(0, 0));
        }
        assert_eq!(ant.stats().moves, 0);
    }

    #[test]
    fn test_corridor_movement() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let mut grid = GridWorld::empty(1, 2, 1).unwrap();
        let mut ant = Ant::new(Position::new(0, 0), 0.3, 0.15);

        // the only valid move alternates between the two cells
        ant.step(&mut grid, &mut rng);
        assert_eq!(ant.position(), Position::new(0, 1));
        ant.step(&mut grid, &mut rng);
        assert_eq!(ant.position(), Position::new(0, 0));
    }

    #[test]
    fn test_snapshot() {
        let mut ant = Ant::new(Position::new(4, 1), 0.3, 0.15);
        ant.carrying = Some(3);
        let snapshot = ant.snapshot();
        assert_eq!(snapshot, AntSnapshot { row: 4, col: 1, carrying: Some(3) });
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_steps_stay_in_bounds_and_change_at_most_one_cell(
            seed in any::<u64>(),
            height in 1u32..8,
            width in 1u32..8,
            fill in 0.0f64..=1.0,
        ) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut grid = GridWorld::new(height, width, 3, fill, &mut rng).unwrap();
            let initial_objects = grid.occupied_count();
            let mut ant = Ant::random(&grid, 0.3, 0.15, &mut rng);
            let can_move = height > 1 || width > 1;

            for _ in 0..200 {
                let before_pos = ant.position();
                let before_cell = grid.get(before_pos.row, before_pos.col);
                let before_objects = grid.occupied_count();

                let outcome = ant.step(&mut grid, &mut rng);

                let after_pos = ant.position();
                prop_assert!(grid.is_valid(after_pos.row, after_pos.col));
                if can_move {
                    prop_assert_eq!(before_pos.chebyshev_distance(&after_pos), 1);
                } else {
                    prop_assert_eq!(before_pos, after_pos);
                }

                let after_cell = grid.get(before_pos.row, before_pos.col);
                match outcome {
                    StepOutcome::Picked(color) => {
                        prop_assert_eq!(before_cell, color);
                        prop_assert_eq!(after_cell, EMPTY);
                        prop_assert_eq!(grid.occupied_count() + 1, before_objects);
                    }
                    StepOutcome::Dropped(color) => {
                        prop_assert_eq!(before_cell, EMPTY);
                        prop_assert_eq!(after_cell, color);
                        prop_assert_eq!(grid.occupied_count(), before_objects + 1);
                    }
                    StepOutcome::Idle => {
                        prop_assert_eq!(before_cell, after_cell);
                        prop_assert_eq!(grid.occupied_count(), before_objects);
                    }
                }

                let carried = usize::from(ant.is_carrying());
                prop_assert_eq!(grid.occupied_count() + carried, initial_objects);
            }
        }
    }
}
