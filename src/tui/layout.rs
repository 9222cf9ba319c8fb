//! Screen layout: which terminal lines each panel occupies.

#![allow(missing_docs)]

/// Below this many lines the table gets no body rows.
pub const MIN_ROWS: u16 = 14;

/// Line positions of every panel for one terminal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabLayout {
    pub cols: u16,
    pub header: u16,
    pub controls: u16,
    pub metrics: u16,
    pub table_header: u16,
    /// First line of table rows.
    pub table_top: u16,
    /// Lines available for table rows.
    pub table_height: u16,
    pub footer: u16,
}

/// Header (1) + gap, controls (3) + gap, metrics (2) + gap, table header,
/// table body, footer.
#[must_use]
pub fn build_layout(cols: u16, rows: u16) -> LabLayout {
    let header = 0;
    let controls = 2;
    let metrics = 6;
    let table_header = 9;
    let table_top = 10;
    let footer = rows.saturating_sub(1).max(table_top);
    LabLayout {
        cols,
        header,
        controls,
        metrics,
        table_header,
        table_top,
        table_height: footer.saturating_sub(table_top),
        footer,
    }
}
