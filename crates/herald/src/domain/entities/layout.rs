//! Button Layout
//!
//! Rows of control labels authored for an event post. Every mutation is
//! followed by [`ButtonLayout::normalize`], so the caps below always hold:
//! at least one row, at most 5 rows, at most 5 controls per row and at most
//! 25 controls overall. Labels are clamped to the platform's button label
//! limit.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::entities::{truncate_chars, ButtonRecord, MAX_BUTTON_LABEL_CHARS};
use crate::domain::value_objects::IdentifierCodec;

pub const MAX_ROWS: usize = 5;
pub const MAX_CONTROLS_PER_ROW: usize = 5;
pub const MAX_CONTROLS: usize = 25;

/// Outcome of a layout mutation
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutChange {
    Applied,
    /// A cap was already met; the layout is unchanged
    CapacityRejected,
    /// The addressed row or column does not exist; the layout is unchanged
    OutOfRange,
}

impl LayoutChange {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ButtonLayout {
    rows: Vec<Vec<String>>,
}

impl ButtonLayout {
    /// One empty row
    pub fn new() -> Self {
        Self {
            rows: vec![Vec::new()],
        }
    }

    /// Build from raw rows, trimming whatever exceeds the caps.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let mut layout = Self { rows };
        layout.normalize();
        layout
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn total(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn add_row(&mut self) -> LayoutChange {
        let change = if self.rows.len() >= MAX_ROWS || self.total() >= MAX_CONTROLS {
            LayoutChange::CapacityRejected
        } else {
            self.rows.push(Vec::new());
            LayoutChange::Applied
        };
        self.normalize();
        change
    }

    pub fn remove_row(&mut self, row: usize) -> LayoutChange {
        let change = if row < self.rows.len() {
            self.rows.remove(row);
            LayoutChange::Applied
        } else {
            LayoutChange::OutOfRange
        };
        self.normalize();
        change
    }

    pub fn add_control(&mut self, row: usize, label: impl Into<String>) -> LayoutChange {
        let total = self.total();
        let change = match self.rows.get_mut(row) {
            None => LayoutChange::OutOfRange,
            Some(r) if r.len() >= MAX_CONTROLS_PER_ROW || total >= MAX_CONTROLS => {
                LayoutChange::CapacityRejected
            }
            Some(r) => {
                r.push(label.into());
                LayoutChange::Applied
            }
        };
        self.normalize();
        change
    }

    pub fn remove_control(&mut self, row: usize, col: usize) -> LayoutChange {
        let change = match self.rows.get_mut(row) {
            Some(r) if col < r.len() => {
                r.remove(col);
                LayoutChange::Applied
            }
            _ => LayoutChange::OutOfRange,
        };
        self.normalize();
        change
    }

    pub fn set_label(&mut self, row: usize, col: usize, label: impl Into<String>) -> LayoutChange {
        let change = match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(slot) => {
                *slot = label.into();
                LayoutChange::Applied
            }
            None => LayoutChange::OutOfRange,
        };
        self.normalize();
        change
    }

    /// Restore the layout caps.
    pub fn normalize(&mut self) {
        if self.rows.is_empty() {
            self.rows.push(Vec::new());
        }
        self.rows.truncate(MAX_ROWS);
        for row in &mut self.rows {
            row.truncate(MAX_CONTROLS_PER_ROW);
            for label in row.iter_mut() {
                truncate_chars(label, MAX_BUTTON_LABEL_CHARS);
            }
        }

        let mut excess = self.total().saturating_sub(MAX_CONTROLS);
        for row in self.rows.iter_mut().rev() {
            if excess == 0 {
                break;
            }
            let cut = excess.min(row.len());
            row.truncate(row.len() - cut);
            excess -= cut;
        }
    }

    /// Button records with codec-derived custom ids, row by row.
    pub fn controls(&self, codec: &IdentifierCodec) -> Vec<Vec<ButtonRecord>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(|(c, label)| {
                        ButtonRecord::with_custom_id(label.clone(), codec.encode(label, r, c))
                    })
                    .collect()
            })
            .collect()
    }
}

impl Default for ButtonLayout {
    fn default() -> Self {
        Self::new()
    }
}
