//! Zoom-dependent styles for points and labels.
//!
//! A [`StyleSet`] maps the zoom at which a style starts to apply onto the
//! style itself. Lookups pick the entry with the greatest starting zoom that
//! does not exceed the requested one, so a style stays active until a later
//! entry replaces it.
//!
//! # Examples
//! ```
//! use waymark_core::{PointStyle, StyleSet};
//!
//! let styles = StyleSet::new()
//!     .with_style(5, PointStyle::new(6.0, 0xff00_00ff))
//!     .with_style(12, PointStyle::new(10.0, 0xff00_00ff));
//!
//! assert_eq!(styles.first_zoom(), Some(5));
//! assert!(styles.style_for_zoom(4).is_none());
//! assert_eq!(styles.style_for_zoom(9).map(|s| s.size), Some(6.0));
//! assert_eq!(styles.style_for_zoom(18).map(|s| s.size), Some(10.0));
//! ```

use std::collections::BTreeMap;

/// Appearance of a rendered point marker.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointStyle {
    /// Marker size in screen pixels.
    pub size: f32,
    /// Packed `0xAARRGGBB` colour.
    pub color: u32,
    /// Optional icon resource name.
    pub icon: Option<String>,
}

impl PointStyle {
    /// A plain marker without an icon.
    pub const fn new(size: f32, color: u32) -> Self {
        Self {
            size,
            color,
            icon: None,
        }
    }

    /// Use the named icon resource for the marker.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Appearance of label text.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabelStyle {
    /// Text size in points.
    pub font_size: f32,
    /// Packed `0xAARRGGBB` colour.
    pub color: u32,
    /// Outline drawn around glyphs, if any.
    pub halo: Option<u32>,
}

impl LabelStyle {
    /// Label text without a halo.
    pub const fn new(font_size: f32, color: u32) -> Self {
        Self {
            font_size,
            color,
            halo: None,
        }
    }

    /// Draw a halo of the given colour behind the text.
    #[must_use]
    pub const fn with_halo(mut self, color: u32) -> Self {
        self.halo = Some(color);
        self
    }
}

/// Styles keyed by the zoom level at which they start to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSet<T> {
    styles: BTreeMap<u8, T>,
}

impl<T> Default for StyleSet<T> {
    fn default() -> Self {
        Self {
            styles: BTreeMap::new(),
        }
    }
}

impl<T> StyleSet<T> {
    /// An empty set; no zoom level has a style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `style` from `zoom` upwards, replacing any entry at that zoom.
    #[must_use]
    pub fn with_style(mut self, zoom: u8, style: T) -> Self {
        self.styles.insert(zoom, style);
        self
    }

    /// Style active at `zoom`, if any.
    pub fn style_for_zoom(&self, zoom: u8) -> Option<&T> {
        self.styles.range(..=zoom).next_back().map(|(_, style)| style)
    }

    /// Smallest zoom level with a style.
    pub fn first_zoom(&self) -> Option<u8> {
        self.styles.keys().next().copied()
    }

    /// Whether no zoom level has a style.
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}
