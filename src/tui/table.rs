//! Data-table commit: turns the dataset into formatted rows.
//!
//! This is the profiled subtree. Unoptimized commits format every row and,
//! with heavy computation on, run the simulator per row each time. Optimized
//! commits format only the windowed rows, reuse formatted output for records
//! whose `Arc` has not changed, and skip the commit entirely when no input
//! changed since the previous one.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use crate::core::config::RenderMode;
use crate::dataset::compute::calculate_expensive_tree;
use crate::dataset::record::{Dataset, RowRecord, Status};
use crate::tui::window::{FixedSizeList, Viewport, Windowing};

/// Characters of the id shown before the ellipsis.
pub const ID_PREVIEW_CHARS: usize = 8;
/// Characters of the description shown before the ellipsis.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 20;
pub const ACTIONS_LABEL: &str = "[Edit] [Del]";

/// Display strings for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedRow {
    /// Full id; row actions need it.
    pub id: String,
    pub id_preview: String,
    pub label: String,
    pub value: String,
    pub status: Status,
    pub description_preview: String,
}

/// First `chars` characters followed by `...`.
#[must_use]
pub fn preview(text: &str, chars: usize) -> String {
    let mut out: String = text.chars().take(chars).collect();
    out.push_str("...");
    out
}

#[must_use]
pub fn format_row(record: &RowRecord) -> FormattedRow {
    FormattedRow {
        id: record.id.clone(),
        id_preview: preview(&record.id, ID_PREVIEW_CHARS),
        label: record.label.clone(),
        value: record.value.to_string(),
        status: record.status,
        description_preview: preview(&record.description, DESCRIPTION_PREVIEW_CHARS),
    }
}

/// Output of one commit.
#[derive(Debug, Clone, PartialEq)]
pub struct TableFrame {
    pub mode: RenderMode,
    /// Rows in the dataset.
    pub total: usize,
    /// Index range that `rows` covers.
    pub range: Range<usize>,
    pub rows: Vec<Arc<FormattedRow>>,
    /// Rows formatted from scratch during this commit.
    pub formatted: usize,
    /// Simulator total, when heavy computation ran.
    pub checksum: Option<f64>,
}

impl TableFrame {
    /// Formatted row for absolute index `index`, if this frame holds it.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Arc<FormattedRow>> {
        if !self.range.contains(&index) {
            return None;
        }
        self.rows.get(index - self.range.start)
    }
}

/// Inputs of one commit.
#[derive(Debug, Clone, Copy)]
pub struct CommitInputs<'a> {
    pub dataset: &'a Dataset,
    pub mode: RenderMode,
    pub heavy_computation: bool,
    pub viewport: Viewport,
}

/// Whether a commit did work.
#[derive(Debug, Clone)]
pub enum Commit {
    Rendered(Arc<TableFrame>),
    /// Inputs unchanged; the previous frame stands.
    Skipped(Arc<TableFrame>),
}

impl Commit {
    #[must_use]
    pub fn frame(&self) -> &Arc<TableFrame> {
        match self {
            Self::Rendered(frame) | Self::Skipped(frame) => frame,
        }
    }

    #[must_use]
    pub const fn rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }
}

#[derive(Debug, Clone)]
struct LastInputs {
    dataset: Dataset,
    mode: RenderMode,
    heavy_computation: bool,
    viewport: Viewport,
}

impl LastInputs {
    fn matches(&self, inputs: &CommitInputs<'_>) -> bool {
        self.dataset.ptr_eq(inputs.dataset)
            && self.mode == inputs.mode
            && self.heavy_computation == inputs.heavy_computation
            && self.viewport == inputs.viewport
    }
}

/// Formatted rows keyed by id, valid while the record `Arc` is the same.
#[derive(Debug, Default)]
struct RowMemo {
    entries: HashMap<String, (Arc<RowRecord>, Arc<FormattedRow>)>,
}

impl RowMemo {
    fn get(&self, record: &Arc<RowRecord>) -> Option<Arc<FormattedRow>> {
        self.entries
            .get(&record.id)
            .filter(|(cached, _)| Arc::ptr_eq(cached, record))
            .map(|(_, formatted)| Arc::clone(formatted))
    }
}

/// Stateful table builder.
#[derive(Debug)]
pub struct DataTable {
    window: FixedSizeList,
    row_height: u16,
    memo: RowMemo,
    last: Option<(LastInputs, Arc<TableFrame>)>,
}

impl DataTable {
    #[must_use]
    pub fn new(row_height: u16, overscan: usize) -> Self {
        Self {
            window: FixedSizeList::new(overscan),
            row_height: row_height.max(1),
            memo: RowMemo::default(),
            last: None,
        }
    }

    #[must_use]
    pub fn row_height(&self) -> u16 {
        self.row_height
    }

    /// Latest frame, if any commit ran.
    #[must_use]
    pub fn last_frame(&self) -> Option<Arc<TableFrame>> {
        self.last.as_ref().map(|(_, frame)| Arc::clone(frame))
    }

    pub fn commit(&mut self, inputs: CommitInputs<'_>) -> Commit {
        if inputs.mode == RenderMode::Optimized
            && let Some((last, frame)) = &self.last
            && last.matches(&inputs)
        {
            return Commit::Skipped(Arc::clone(frame));
        }

        let frame = Arc::new(match inputs.mode {
            RenderMode::Unoptimized => self.commit_unoptimized(&inputs),
            RenderMode::Optimized => self.commit_optimized(&inputs),
        });
        self.last = Some((
            LastInputs {
                dataset: inputs.dataset.clone(),
                mode: inputs.mode,
                heavy_computation: inputs.heavy_computation,
                viewport: inputs.viewport,
            },
            Arc::clone(&frame),
        ));
        Commit::Rendered(frame)
    }

    fn commit_unoptimized(&mut self, inputs: &CommitInputs<'_>) -> TableFrame {
        self.memo.entries.clear();
        let mut checksum = inputs.heavy_computation.then_some(0.0);
        let rows: Vec<Arc<FormattedRow>> = inputs
            .dataset
            .iter()
            .map(|record| {
                if let Some(total) = checksum.as_mut() {
                    *total += calculate_expensive_tree(std::iter::once(&**record));
                }
                Arc::new(format_row(record))
            })
            .collect();
        TableFrame {
            mode: RenderMode::Unoptimized,
            total: rows.len(),
            range: 0..rows.len(),
            formatted: rows.len(),
            rows,
            checksum,
        }
    }

    fn commit_optimized(&mut self, inputs: &CommitInputs<'_>) -> TableFrame {
        let records = inputs.dataset.rows();
        let memo = &self.memo;
        let mut formatted = 0;
        let windowed = self.window.render(
            records.len(),
            self.row_height,
            inputs.viewport,
            records,
            |index, records| {
                let record = &records[index];
                memo.get(record).map_or_else(
                    || {
                        formatted += 1;
                        (Arc::clone(record), Arc::new(format_row(record)))
                    },
                    |hit| (Arc::clone(record), hit),
                )
            },
        );

        let mut entries = HashMap::with_capacity(windowed.rows.len());
        let mut rows = Vec::with_capacity(windowed.rows.len());
        for (record, row) in windowed.rows {
            rows.push(Arc::clone(&row));
            entries.insert(record.id.clone(), (record, row));
        }
        self.memo.entries = entries;

        TableFrame {
            mode: RenderMode::Optimized,
            total: records.len(),
            range: windowed.range,
            rows,
            formatted,
            checksum: None,
        }
    }
}
