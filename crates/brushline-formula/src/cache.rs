//! Parse cache
//!
//! Formula text in estimate templates repeats heavily (the same SUM or
//! VLOOKUP shape appears on every row), so parsed ASTs are cached by
//! their source text. Eviction is least-recently-used over a logical
//! tick counter.

use crate::ast::FormulaExpr;
use crate::error::FormulaResult;
use crate::parser::parse_formula;
use ahash::AHashMap;
use std::sync::Arc;

/// LRU cache of parsed formula ASTs, keyed by formula text
#[derive(Debug)]
pub struct ParseCache {
    entries: AHashMap<String, (Arc<FormulaExpr>, u64)>,
    capacity: usize,
    tick: u64,
    hits: u64,
    misses: u64,
}

impl ParseCache {
    /// Create a cache bounded to `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: AHashMap::new(),
            capacity: capacity.max(1),
            tick: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Parse a formula, reusing the cached AST when the text was seen before
    pub fn get_or_parse(&mut self, formula: &str) -> FormulaResult<Arc<FormulaExpr>> {
        self.tick += 1;

        if let Some((ast, last_used)) = self.entries.get_mut(formula) {
            *last_used = self.tick;
            self.hits += 1;
            return Ok(Arc::clone(ast));
        }

        let ast = Arc::new(parse_formula(formula)?);
        self.misses += 1;

        if self.entries.len() >= self.capacity {
            self.evict_lru();
        }

        self.entries
            .insert(formula.to_string(), (Arc::clone(&ast), self.tick));
        Ok(ast)
    }

    fn evict_lru(&mut self) {
        if let Some(key) = self
            .entries
            .iter()
            .min_by_key(|(_, (_, last_used))| *last_used)
            .map(|(k, _)| k.clone())
        {
            self.entries.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::new(1024)
    }
}
