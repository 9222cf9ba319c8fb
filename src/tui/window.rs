//! Fixed-height list windowing.
//!
//! Given the total row count, the row height and the viewport, a
//! [`Windowing`] implementation decides which rows are visible and renders
//! only those through a caller-supplied row callback.

#![allow(missing_docs)]

use std::ops::Range;

/// Visible terminal area of the list, in lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Lines available for rows.
    pub height: u16,
    /// Lines scrolled past the top of the list.
    pub scroll_offset: usize,
}

impl Viewport {
    #[must_use]
    pub const fn new(height: u16, scroll_offset: usize) -> Self {
        Self {
            height,
            scroll_offset,
        }
    }

    /// Rows that fit into the viewport at `row_height` lines each.
    #[must_use]
    pub fn rows_fitting(&self, row_height: u16) -> usize {
        let row_height = usize::from(row_height.max(1));
        usize::from(self.height).div_ceil(row_height)
    }

    /// Smallest scroll offset that keeps `row` fully on screen.
    #[must_use]
    pub fn scrolled_to(self, row: usize, row_height: u16) -> Self {
        let row_height = usize::from(row_height.max(1));
        let top = row * row_height;
        let bottom = top + row_height;
        let height = usize::from(self.height);
        let scroll_offset = if top < self.scroll_offset {
            top
        } else if bottom > self.scroll_offset + height {
            bottom.saturating_sub(height)
        } else {
            self.scroll_offset
        };
        Self {
            height: self.height,
            scroll_offset,
        }
    }
}

/// Rows produced by one windowed render.
#[derive(Debug, Clone, PartialEq)]
pub struct Windowed<R> {
    /// Indices that were rendered, overscan included.
    pub range: Range<usize>,
    pub rows: Vec<R>,
}

/// Virtualized list contract.
pub trait Windowing {
    /// Indices to render for `total` rows of `row_height` lines.
    fn visible_range(&self, total: usize, row_height: u16, viewport: Viewport) -> Range<usize>;

    /// Render only the rows in [`Self::visible_range`], passing each index
    /// and the shared row data to `render_row`.
    fn render<D, R, F>(
        &self,
        total: usize,
        row_height: u16,
        viewport: Viewport,
        data: &D,
        mut render_row: F,
    ) -> Windowed<R>
    where
        D: ?Sized,
        F: FnMut(usize, &D) -> R,
    {
        let range = self.visible_range(total, row_height, viewport);
        let rows = range.clone().map(|index| render_row(index, data)).collect();
        Windowed { range, rows }
    }
}

/// Windowing over rows of one fixed height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSizeList {
    /// Extra rows rendered beyond each edge of the viewport.
    pub overscan: usize,
}

impl FixedSizeList {
    #[must_use]
    pub const fn new(overscan: usize) -> Self {
        Self { overscan }
    }
}

impl Windowing for FixedSizeList {
    fn visible_range(&self, total: usize, row_height: u16, viewport: Viewport) -> Range<usize> {
        if total == 0 || viewport.height == 0 {
            return 0..0;
        }
        let first = (viewport.scroll_offset / usize::from(row_height.max(1))).min(total - 1);
        let start = first.saturating_sub(self.overscan);
        let end = (first + viewport.rows_fitting(row_height) + self.overscan).min(total);
        start..end
    }
}
