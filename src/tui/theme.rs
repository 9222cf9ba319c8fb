//! Theme tokens and the `NO_COLOR` accessibility hook for lab rendering.

#![allow(missing_docs)]

use std::env;

use crossterm::style::Color;

use crate::core::config::RenderMode;
use crate::dataset::record::Status;
use crate::metrics::snapshot::Health;

/// Color output mode for compatibility with `NO_COLOR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Enabled,
    Disabled,
}

/// Contrast profile used by palette selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContrastMode {
    Standard,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessibilityProfile {
    pub contrast: ContrastMode,
    pub color: ColorMode,
}

impl Default for AccessibilityProfile {
    fn default() -> Self {
        Self {
            contrast: ContrastMode::Standard,
            color: ColorMode::Enabled,
        }
    }
}

impl AccessibilityProfile {
    #[must_use]
    pub const fn from_no_color_flag(no_color: bool) -> Self {
        Self {
            contrast: ContrastMode::Standard,
            color: if no_color {
                ColorMode::Disabled
            } else {
                ColorMode::Enabled
            },
        }
    }

    /// Honors `NO_COLOR` and `RLAB_HIGH_CONTRAST`.
    #[must_use]
    pub fn from_environment(no_color_flag: bool) -> Self {
        let mut profile =
            Self::from_no_color_flag(no_color_flag || env::var_os("NO_COLOR").is_some());
        if env::var_os("RLAB_HIGH_CONTRAST").is_some() {
            profile.contrast = ContrastMode::High;
        }
        profile
    }

    #[must_use]
    pub const fn no_color(self) -> bool {
        matches!(self.color, ColorMode::Disabled)
    }
}

/// Semantic palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemePalette {
    pub accent: Color,
    pub good: Color,
    pub warning: Color,
    pub danger: Color,
    pub muted: Color,
    pub neutral: Color,
    /// Border and badge color for optimized mode.
    pub optimized: Color,
    /// Border and badge color for unoptimized mode.
    pub unoptimized: Color,
}

impl ThemePalette {
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            accent: Color::Cyan,
            good: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::DarkGrey,
            neutral: Color::White,
            optimized: Color::Green,
            unoptimized: Color::Red,
        }
    }

    #[must_use]
    pub const fn high_contrast() -> Self {
        Self {
            accent: Color::Cyan,
            good: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::Grey,
            neutral: Color::White,
            optimized: Color::Green,
            unoptimized: Color::Magenta,
        }
    }

    #[must_use]
    pub const fn from_contrast(mode: ContrastMode) -> Self {
        match mode {
            ContrastMode::Standard => Self::standard(),
            ContrastMode::High => Self::high_contrast(),
        }
    }
}

/// Full render theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub accessibility: AccessibilityProfile,
    pub palette: ThemePalette,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(AccessibilityProfile::default())
    }
}

impl Theme {
    #[must_use]
    pub const fn new(accessibility: AccessibilityProfile) -> Self {
        Self {
            palette: ThemePalette::from_contrast(accessibility.contrast),
            accessibility,
        }
    }

    /// `None` when color is disabled; callers then skip color escapes.
    #[must_use]
    pub const fn paint(&self, color: Color) -> Option<Color> {
        if self.accessibility.no_color() {
            None
        } else {
            Some(color)
        }
    }

    #[must_use]
    pub const fn health(&self, health: Health) -> Option<Color> {
        self.paint(match health {
            Health::Good => self.palette.good,
            Health::Warning => self.palette.warning,
            Health::Danger => self.palette.danger,
            Health::Neutral => self.palette.neutral,
        })
    }

    #[must_use]
    pub const fn status(&self, status: Status) -> Option<Color> {
        self.paint(match status {
            Status::Active => self.palette.good,
            Status::Pending => self.palette.warning,
            Status::Archived => self.palette.muted,
            Status::Critical => self.palette.danger,
        })
    }

    #[must_use]
    pub const fn mode(&self, mode: RenderMode) -> Option<Color> {
        self.paint(match mode {
            RenderMode::Optimized => self.palette.optimized,
            RenderMode::Unoptimized => self.palette.unoptimized,
        })
    }
}
