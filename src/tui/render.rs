//! Draws a [`LabModel`] onto any `Write` sink with crossterm commands.
//!
//! Rendering is a pure function of the model and theme: the runtime passes
//! stdout, tests pass a `Vec<u8>` and search the output for text.

#![allow(missing_docs)]

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Attribute, Color, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};

use super::input::help_bindings;
use super::layout::{LabLayout, build_layout};
use super::model::{LabModel, NotificationLevel};
use super::table::{ACTIONS_LABEL, FormattedRow};
use super::theme::Theme;
use crate::core::config::RenderMode;
use crate::tui::boundary::{BoundaryState, FaultReport};

const TITLE: &str = "Render Lab";
const TRACE_LINES: usize = 12;

// ──────────────────── helpers ────────────────────

/// Truncate to `width` characters.
fn fit(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

fn put<W: Write>(
    out: &mut W,
    col: u16,
    row: u16,
    text: &str,
    color: Option<Color>,
    width: u16,
) -> io::Result<()> {
    let room = usize::from(width.saturating_sub(col));
    if room == 0 {
        return Ok(());
    }
    queue!(out, MoveTo(col, row))?;
    if let Some(color) = color {
        queue!(out, SetForegroundColor(color))?;
    }
    write!(out, "{}", fit(text, room))?;
    if color.is_some() {
        queue!(out, SetAttribute(Attribute::Reset))?;
    }
    Ok(())
}

/// `Off` when 0.
#[must_use]
pub fn interval_label(interval_ms: u64) -> String {
    if interval_ms == 0 {
        "Off".to_string()
    } else {
        format!("{interval_ms} ms")
    }
}

const fn mode_title(mode: RenderMode) -> &'static str {
    match mode {
        RenderMode::Optimized => "Optimized",
        RenderMode::Unoptimized => "Unoptimized",
    }
}

const fn mode_hint(mode: RenderMode) -> &'static str {
    match mode {
        RenderMode::Optimized => "Windowed list: only visible rows are formatted, unchanged rows reused",
        RenderMode::Unoptimized => "Full list: every row formatted on every commit, row actions lag",
    }
}

/// One table line, without the status badge coloring.
#[must_use]
pub fn table_line(row: &FormattedRow) -> (String, String, String) {
    let left = format!("{:<12} {:<12} {:>6}  ", row.id_preview, row.label, row.value);
    let status = format!("{:<9}", row.status.as_str());
    let right = format!(" {:<24} {ACTIONS_LABEL}", row.description_preview);
    (left, status, right)
}

// ──────────────────── frame ────────────────────

/// Draw the whole screen and flush.
pub fn draw<W: Write>(out: &mut W, model: &LabModel, theme: &Theme) -> io::Result<()> {
    let (cols, rows) = model.terminal_size;
    queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
    if let BoundaryState::Failed(report) = &model.boundary {
        draw_fault(out, report, theme, cols, rows)?;
        return out.flush();
    }

    let layout = build_layout(cols, rows);

    draw_header(out, model, theme, &layout)?;
    draw_controls(out, model, theme, &layout)?;
    draw_metrics(out, model, theme, &layout)?;
    draw_table(out, model, theme, &layout)?;
    if model.help_open {
        draw_help(out, theme, &layout)?;
    }
    draw_footer(out, model, theme, &layout)?;
    out.flush()
}

fn draw_header<W: Write>(
    out: &mut W,
    model: &LabModel,
    theme: &Theme,
    layout: &LabLayout,
) -> io::Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    put(
        out,
        0,
        layout.header,
        &format!(" {TITLE} v{version} "),
        theme.paint(theme.palette.accent),
        layout.cols,
    )?;
    let col = u16::try_from(TITLE.len() + version.len() + 4).unwrap_or(u16::MAX);
    let badge = format!("[{}]", mode_title(model.mode()).to_uppercase());
    put(out, col, layout.header, &badge, theme.mode(model.mode()), layout.cols)
}

fn draw_controls<W: Write>(
    out: &mut W,
    model: &LabModel,
    theme: &Theme,
    layout: &LabLayout,
) -> io::Result<()> {
    let state = &model.state;
    let line = format!(
        " Mode: {} [m]   Rows: {} [+/-]   Heavy computation: {} [h]   Background updates: {} [ [ ] ]",
        mode_title(state.mode),
        state.dataset_size,
        if state.heavy_computation { "On" } else { "Off" },
        interval_label(state.update_interval_ms),
    );
    put(out, 0, layout.controls, &line, None, layout.cols)?;
    put(
        out,
        0,
        layout.controls + 1,
        &format!(" {}", mode_hint(state.mode)),
        theme.paint(theme.palette.muted),
        layout.cols,
    )
}

fn draw_metrics<W: Write>(
    out: &mut W,
    model: &LabModel,
    theme: &Theme,
    layout: &LabLayout,
) -> io::Result<()> {
    let border = theme.mode(model.mode());
    let inner = usize::from(layout.cols.saturating_sub(2));
    let title = "─ Metrics ";
    let top = format!("┌{title}{}┐", "─".repeat(inner.saturating_sub(title.chars().count())));
    put(out, 0, layout.metrics - 1, &top, border, layout.cols)?;
    put(out, 0, layout.metrics, "│", border, layout.cols)?;

    let m = &model.metrics;
    let cells = [
        ("FPS", m.fps.to_string(), theme.health(m.fps_health())),
        ("Commit", m.commit_label(), theme.health(m.commit_health())),
        ("Renders", m.render_count.to_string(), None),
        ("Memory", m.memory_label(), theme.health(m.memory_health())),
    ];
    let mut col: u16 = 2;
    for (name, value, color) in cells {
        let label = format!("{name}: ");
        put(out, col, layout.metrics, &label, None, layout.cols)?;
        let value_col = col.saturating_add(u16::try_from(label.len()).unwrap_or(u16::MAX));
        put(out, value_col, layout.metrics, &value, color, layout.cols)?;
        col = col.saturating_add(20);
    }
    put(out, layout.cols.saturating_sub(1), layout.metrics, "│", border, layout.cols)?;

    let bottom = format!("└{}┘", "─".repeat(inner));
    put(out, 0, layout.metrics + 1, &bottom, border, layout.cols)
}

fn draw_table<W: Write>(
    out: &mut W,
    model: &LabModel,
    theme: &Theme,
    layout: &LabLayout,
) -> io::Result<()> {
    let header = format!(
        " {:<12} {:<12} {:>6}  {:<9} {:<24} {}",
        "ID", "Label", "Value", "Status", "Description", "Actions"
    );
    queue!(out, SetAttribute(Attribute::Bold))?;
    put(out, 0, layout.table_header, &header, None, layout.cols)?;
    queue!(out, SetAttribute(Attribute::Reset))?;

    let Some(frame) = &model.frame else {
        return Ok(());
    };
    if frame.total == 0 {
        return put(
            out,
            1,
            layout.table_top,
            "No rows. Press g to regenerate.",
            theme.paint(theme.palette.muted),
            layout.cols,
        );
    }

    let row_height = usize::from(model.row_height);
    let scroll = model.viewport.scroll_offset;
    let first = scroll / row_height;
    let last = (scroll + usize::from(layout.table_height)).div_ceil(row_height);
    for index in first..last.min(frame.total) {
        let Some(top) = (index * row_height).checked_sub(scroll) else {
            continue;
        };
        let Ok(offset) = u16::try_from(top) else {
            break;
        };
        if offset >= layout.table_height {
            break;
        }
        let line = layout.table_top + offset;
        let Some(row) = frame.row(index) else {
            continue;
        };
        let selected = index == model.selected;
        let (left, status, right) = table_line(row);
        let marker = if selected { ">" } else { " " };
        if selected {
            queue!(out, SetAttribute(Attribute::Reverse))?;
        }
        put(out, 0, line, &format!("{marker}{left}"), None, layout.cols)?;
        let status_col = u16::try_from(left.chars().count() + 1).unwrap_or(u16::MAX);
        put(out, status_col, line, &status, theme.status(row.status), layout.cols)?;
        if selected {
            queue!(out, SetAttribute(Attribute::Reverse))?;
        }
        let right_col = status_col.saturating_add(u16::try_from(status.len()).unwrap_or(u16::MAX));
        put(out, right_col, line, &right, None, layout.cols)?;
        if selected {
            queue!(out, SetAttribute(Attribute::Reset))?;
        }
    }
    Ok(())
}

/// Fault screen: replaces every panel once the boundary has failed.
fn draw_fault<W: Write>(
    out: &mut W,
    report: &FaultReport,
    theme: &Theme,
    cols: u16,
    rows: u16,
) -> io::Result<()> {
    put(out, 1, 1, "Something went wrong.", theme.paint(theme.palette.danger), cols)?;
    let mut lines = vec![format!("Error: {}", report.message)];
    if let Some(location) = &report.location {
        lines.push(format!("at {location}"));
    }
    lines.extend(
        report
            .trace_lines(TRACE_LINES)
            .into_iter()
            .map(ToString::to_string),
    );
    lines.push("Restart rlab to recover.".to_string());

    let footer = rows.saturating_sub(1);
    for (offset, text) in lines.iter().enumerate() {
        let Ok(offset) = u16::try_from(offset) else {
            break;
        };
        let line = offset.saturating_add(3);
        if line >= footer {
            break;
        }
        put(out, 1, line, text, None, cols)?;
    }
    put(out, 0, footer, " q quit", theme.paint(theme.palette.muted), cols)
}

fn draw_help<W: Write>(out: &mut W, theme: &Theme, layout: &LabLayout) -> io::Result<()> {
    let accent = theme.paint(theme.palette.accent);
    put(out, 2, layout.table_header, " Keys (? or Esc to close) ", accent, layout.cols)?;
    for (offset, binding) in help_bindings().iter().enumerate() {
        let Ok(offset) = u16::try_from(offset) else {
            break;
        };
        if offset >= layout.table_height {
            break;
        }
        let line = layout.table_top + offset;
        queue!(out, MoveTo(0, line), Clear(ClearType::CurrentLine))?;
        put(
            out,
            2,
            line,
            &format!("{:<18} {}", binding.keys, binding.description),
            None,
            layout.cols,
        )?;
    }
    Ok(())
}

fn draw_footer<W: Write>(
    out: &mut W,
    model: &LabModel,
    theme: &Theme,
    layout: &LabLayout,
) -> io::Result<()> {
    if let Some(note) = &model.notification {
        let color = match note.level {
            NotificationLevel::Info => theme.paint(theme.palette.accent),
            NotificationLevel::Warning => theme.paint(theme.palette.warning),
        };
        return put(out, 0, layout.footer, &format!(" {}", note.message), color, layout.cols);
    }
    let position = if model.row_count() == 0 {
        "0/0".to_string()
    } else {
        format!("{}/{}", model.selected + 1, model.row_count())
    };
    put(
        out,
        0,
        layout.footer,
        &format!(" row {position}   e edit  d delete  ? help  q quit"),
        theme.paint(theme.palette.muted),
        layout.cols,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::config::Config;
    use crate::dataset::generator::generate;
    use crate::dataset::store::LabState;
    use crate::tui::model::edit_notice;
    use crate::tui::table::{CommitInputs, DataTable};
    use crate::tui::theme::AccessibilityProfile;

    fn model(rows: usize, mode: RenderMode) -> LabModel {
        let config = Config::default();
        let state = LabState {
            dataset: generate(rows),
            mode,
            dataset_size: 10_000,
            heavy_computation: false,
            update_interval_ms: 0,
        };
        let mut model = LabModel::new(&config, state, (120, 30));
        let mut table = DataTable::new(1, 2);
        let commit = table.commit(CommitInputs {
            dataset: &model.state.dataset,
            mode,
            heavy_computation: false,
            viewport: model.viewport,
        });
        model.frame = Some(Arc::clone(commit.frame()));
        model
    }

    fn render(model: &LabModel) -> String {
        let theme = Theme::new(AccessibilityProfile::from_no_color_flag(true));
        let mut out = Vec::new();
        draw(&mut out, model, &theme).unwrap();
        String::from_utf8_lossy(&out).into_owned()
    }

    #[test]
    fn draws_panels_and_rows() {
        let m = model(50, RenderMode::Optimized);
        let screen = render(&m);
        assert!(screen.contains("Render Lab v"));
        assert!(screen.contains("[OPTIMIZED]"));
        assert!(screen.contains("Background updates: Off"));
        assert!(screen.contains("Commit: "));
        assert!(screen.contains("0.0ms"));
        assert!(screen.contains("N/A"));
        assert!(screen.contains("Description"));
        assert!(screen.contains(ACTIONS_LABEL));
        let first = m.state.dataset.get(0).unwrap();
        assert!(screen.contains(&first.label));
        assert!(screen.contains(" row 1/50"));
    }

    #[test]
    fn rows_outside_viewport_are_not_drawn() {
        let m = model(200, RenderMode::Unoptimized);
        let screen = render(&m);
        let last = m.state.dataset.get(199).unwrap();
        assert!(!screen.contains(&format!("{:<12} ", last.label)));
    }

    #[test]
    fn failed_boundary_takes_over_the_screen() {
        let mut m = model(10, RenderMode::Unoptimized);
        m.help_open = true;
        m.push_notification(NotificationLevel::Info, edit_notice("abc"));
        m.boundary = BoundaryState::Failed(FaultReport {
            message: "kaboom".to_string(),
            location: Some("src/tui/table.rs:1:1".to_string()),
            backtrace: "  0: frame\n".to_string(),
        });
        let screen = render(&m);
        assert!(screen.contains("Something went wrong."));
        assert!(screen.contains("Error: kaboom"));
        assert!(screen.contains("at src/tui/table.rs:1:1"));
        assert!(screen.contains("0: frame"));
        assert!(screen.contains("Restart rlab to recover."));
        for hidden in ["Render Lab v", "Commit: ", ACTIONS_LABEL, "Keys (?", "Edit abc"] {
            assert!(!screen.contains(hidden), "{hidden} drawn over the fault screen");
        }
    }

    #[test]
    fn fault_screen_fits_tiny_terminals() {
        let mut m = model(1, RenderMode::Optimized);
        m.terminal_size = (10, 2);
        m.boundary = BoundaryState::Failed(FaultReport {
            message: "kaboom".to_string(),
            location: None,
            backtrace: String::new(),
        });
        let screen = render(&m);
        assert!(screen.contains("Something"));
        assert!(!screen.contains("Error: kaboom"));
    }

    #[test]
    fn notification_replaces_footer_hint() {
        let mut m = model(3, RenderMode::Unoptimized);
        m.push_notification(NotificationLevel::Info, edit_notice("abc"));
        let screen = render(&m);
        assert!(screen.contains("Edit abc clicked."));
        assert!(!screen.contains("q quit"));
    }

    #[test]
    fn help_overlay_lists_bindings() {
        let mut m = model(3, RenderMode::Unoptimized);
        m.help_open = true;
        let screen = render(&m);
        assert!(screen.contains("Keys (? or Esc to close)"));
        assert!(screen.contains("Toggle heavy computation"));
    }

    #[test]
    fn empty_dataset_hint() {
        let m = model(0, RenderMode::Optimized);
        assert!(render(&m).contains("No rows. Press g to regenerate."));
    }

    #[test]
    fn interval_labels() {
        assert_eq!(interval_label(0), "Off");
        assert_eq!(interval_label(300), "300 ms");
    }
}
