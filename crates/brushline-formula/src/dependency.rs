//! Dependency tracking for formula recalculation
//!
//! The graph records precedent/dependent edges between formula cells and
//! produces an evaluation plan: a topological order over the non-cyclic
//! cells plus the set of cells that participate in a reference cycle.
//! Traversal is iterative with an explicit stack, so deep dependency
//! chains cannot overflow the call stack.

use ahash::{AHashMap, AHashSet};
use brushline_core::CellAddress;

/// Unique key for a cell (sheet index + address)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub sheet: usize,
    pub row: u32,
    pub col: u16,
}

impl CellKey {
    /// Create a new cell key
    pub fn new(sheet: usize, row: u32, col: u16) -> Self {
        Self { sheet, row, col }
    }

    /// Create from sheet index and cell address
    pub fn from_address(sheet: usize, addr: &CellAddress) -> Self {
        Self::new(sheet, addr.row, addr.col)
    }

    /// The cell's address within its sheet
    pub fn address(&self) -> CellAddress {
        CellAddress::new(self.row, self.col)
    }
}

/// Result of planning a recalculation pass
///
/// `order` lists every requested non-cyclic cell, precedents before
/// dependents. `cyclic` holds the cells that sit on a reference cycle;
/// they are excluded from `order` and never evaluated. Cells that
/// merely *depend on* a cyclic cell are still ordered and evaluated
/// normally, and pick up the cycle error by reading their precedents.
#[derive(Debug, Default)]
pub struct EvaluationPlan {
    pub order: Vec<CellKey>,
    pub cyclic: AHashSet<CellKey>,
}

/// Dependency graph for formula cells
///
/// Tracks which cells depend on which other cells,
/// enabling recalculation in dependency order.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Cell → Cells that depend on it (dependents)
    dependents: AHashMap<CellKey, AHashSet<CellKey>>,
    /// Cell → Cells it depends on (precedents)
    precedents: AHashMap<CellKey, AHashSet<CellKey>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Gray,
    Black,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency: dependent depends on precedent
    pub fn add_dependency(&mut self, precedent: CellKey, dependent: CellKey) {
        self.dependents
            .entry(precedent)
            .or_default()
            .insert(dependent);
        self.precedents
            .entry(dependent)
            .or_default()
            .insert(precedent);
    }

    /// Remove all dependencies for a cell
    pub fn clear_dependencies(&mut self, cell: CellKey) {
        if let Some(precedents) = self.precedents.remove(&cell) {
            for precedent in precedents {
                if let Some(deps) = self.dependents.get_mut(&precedent) {
                    deps.remove(&cell);
                }
            }
        }

        if let Some(dependents) = self.dependents.remove(&cell) {
            for dependent in dependents {
                if let Some(precs) = self.precedents.get_mut(&dependent) {
                    precs.remove(&cell);
                }
            }
        }
    }

    /// Get cells that depend on the given cell
    pub fn get_dependents(&self, cell: CellKey) -> impl Iterator<Item = CellKey> + '_ {
        self.dependents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Get cells that the given cell depends on
    pub fn get_precedents(&self, cell: CellKey) -> impl Iterator<Item = CellKey> + '_ {
        self.precedents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Plan an evaluation pass over the given cells
    ///
    /// Produces a topological order (precedents before dependents) plus
    /// the set of cells involved in reference cycles. The order is
    /// deterministic for a given insertion order of `cells`.
    pub fn evaluation_plan(&self, cells: &[CellKey]) -> EvaluationPlan {
        let mut plan = EvaluationPlan::default();
        let mut colors: AHashMap<CellKey, Color> = AHashMap::new();
        // (cell, precedents snapshot, next precedent index)
        let mut stack: Vec<(CellKey, Vec<CellKey>, usize)> = Vec::new();

        for &root in cells {
            if colors.contains_key(&root) {
                continue;
            }

            colors.insert(root, Color::Gray);
            stack.push((root, self.sorted_precedents(root), 0));

            while let Some(frame) = stack.last_mut() {
                let (cell, precedents, idx) = (frame.0, &frame.1, frame.2);

                if idx < precedents.len() {
                    let next = precedents[idx];
                    frame.2 += 1;

                    match colors.get(&next) {
                        None => {
                            colors.insert(next, Color::Gray);
                            let precs = self.sorted_precedents(next);
                            stack.push((next, precs, 0));
                        }
                        Some(Color::Gray) => {
                            // Back edge: every cell on the stack from
                            // `next` upward is part of the cycle.
                            let mut in_cycle = false;
                            for (frame_cell, _, _) in stack.iter() {
                                if *frame_cell == next {
                                    in_cycle = true;
                                }
                                if in_cycle {
                                    plan.cyclic.insert(*frame_cell);
                                }
                            }
                        }
                        Some(Color::Black) => {}
                    }
                } else {
                    colors.insert(cell, Color::Black);
                    plan.order.push(cell);
                    stack.pop();
                }
            }
        }

        // Only cells we were asked to evaluate belong in the order;
        // precedents outside that set are plain inputs, and cyclic
        // cells are reported through `cyclic` alone.
        let requested: AHashSet<CellKey> = cells.iter().copied().collect();
        let EvaluationPlan { order, cyclic } = &mut plan;
        order.retain(|c| requested.contains(c) && !cyclic.contains(c));

        plan
    }

    /// Detect whether the given cell participates in a reference cycle
    pub fn has_circular_reference(&self, cell: CellKey) -> bool {
        self.evaluation_plan(&[cell]).cyclic.contains(&cell)
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }

    /// Precedents in a stable order, so planning is deterministic
    fn sorted_precedents(&self, cell: CellKey) -> Vec<CellKey> {
        let mut precs: Vec<CellKey> = self.get_precedents(cell).collect();
        precs.sort_by_key(|c| (c.sheet, c.row, c.col));
        precs
    }
}
