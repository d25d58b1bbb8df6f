//! Manual white-blood-cell differential counter.
//!
//! A tally per cell type, bounded at [`DIFFERENTIAL_LIMIT`] cells in total.
//! The last increment can be undone once; reset clears everything.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Total number of cells counted in one differential.
pub const DIFFERENTIAL_LIMIT: u32 = 100;

/// Counter errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CounterError {
    #[error("Differential already has {0} cells")]
    LimitReached(u32),

    #[error("Unknown cell type: {0}")]
    UnknownCell(String),
}

/// White blood cell subtypes tallied in a differential.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    /// Segmented neutrophils
    Neutrophils,
    /// Band neutrophils
    Bands,
    Lymphocytes,
    Monocytes,
    Eosinophils,
    Basophils,
}

impl CellType {
    pub const ALL: [CellType; 6] = [
        CellType::Neutrophils,
        CellType::Bands,
        CellType::Lymphocytes,
        CellType::Monocytes,
        CellType::Eosinophils,
        CellType::Basophils,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CellType::Neutrophils => "neutrophils",
            CellType::Bands => "bands",
            CellType::Lymphocytes => "lymphocytes",
            CellType::Monocytes => "monocytes",
            CellType::Eosinophils => "eosinophils",
            CellType::Basophils => "basophils",
        }
    }
}

impl std::str::FromStr for CellType {
    type Err = CounterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CellType::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| CounterError::UnknownCell(s.to_string()))
    }
}

/// Counts per cell type.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DifferentialCount {
    pub neutrophils: u32,
    pub bands: u32,
    pub lymphocytes: u32,
    pub monocytes: u32,
    pub eosinophils: u32,
    pub basophils: u32,
}

impl DifferentialCount {
    pub fn get(&self, cell: CellType) -> u32 {
        match cell {
            CellType::Neutrophils => self.neutrophils,
            CellType::Bands => self.bands,
            CellType::Lymphocytes => self.lymphocytes,
            CellType::Monocytes => self.monocytes,
            CellType::Eosinophils => self.eosinophils,
            CellType::Basophils => self.basophils,
        }
    }

    fn slot(&mut self, cell: CellType) -> &mut u32 {
        match cell {
            CellType::Neutrophils => &mut self.neutrophils,
            CellType::Bands => &mut self.bands,
            CellType::Lymphocytes => &mut self.lymphocytes,
            CellType::Monocytes => &mut self.monocytes,
            CellType::Eosinophils => &mut self.eosinophils,
            CellType::Basophils => &mut self.basophils,
        }
    }

    pub fn total(&self) -> u32 {
        CellType::ALL.iter().map(|c| self.get(*c)).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.total() >= DIFFERENTIAL_LIMIT
    }

    /// Relative value per cell type, in percent of the cells counted so far.
    pub fn percentages(&self) -> Vec<(CellType, f64)> {
        let total = self.total();
        CellType::ALL
            .iter()
            .map(|c| {
                let pct = if total == 0 {
                    0.0
                } else {
                    f64::from(self.get(*c)) * 100.0 / f64::from(total)
                };
                (*c, pct)
            })
            .collect()
    }

    /// Absolute count per cell type for a WBC value (×10³/µL).
    pub fn absolute_values(&self, wbc: f64) -> Vec<(CellType, f64)> {
        self.percentages()
            .into_iter()
            .map(|(c, pct)| (c, crate::money::round_display(wbc * pct / 100.0)))
            .collect()
    }
}

/// Interactive counter state with single-level undo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DifferentialCounter {
    counts: DifferentialCount,
    last: Option<CellType>,
}

impl DifferentialCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume counting from a saved snapshot. Undo history starts empty.
    pub fn from_counts(counts: DifferentialCount) -> Self {
        Self { counts, last: None }
    }

    /// Add one cell. Rejected once the total reaches the limit.
    pub fn increment(&mut self, cell: CellType) -> Result<u32, CounterError> {
        let total = self.counts.total();
        if total >= DIFFERENTIAL_LIMIT {
            return Err(CounterError::LimitReached(total));
        }
        let slot = self.counts.slot(cell);
        *slot += 1;
        let value = *slot;
        self.last = Some(cell);
        Ok(value)
    }

    /// Revert the last increment. Returns false if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.last.take() {
            Some(cell) => {
                let slot = self.counts.slot(cell);
                *slot = slot.saturating_sub(1);
                true
            }
            None => false,
        }
    }

    /// Zero all fields and forget the undo history.
    pub fn reset(&mut self) {
        self.counts = DifferentialCount::default();
        self.last = None;
    }

    pub fn counts(&self) -> &DifferentialCount {
        &self.counts
    }

    pub fn total(&self) -> u32 {
        self.counts.total()
    }

    pub fn remaining(&self) -> u32 {
        DIFFERENTIAL_LIMIT.saturating_sub(self.total())
    }

    pub fn is_complete(&self) -> bool {
        self.counts.is_complete()
    }
}
