use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// True when the vertical band `[top, bottom)` intersects this rect.
    pub fn overlaps_band(&self, top: f32, bottom: f32) -> bool {
        self.y < bottom && self.bottom() > top
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn zero() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
        }
    }
}

/// Physical page dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub w: f32,
    pub h: f32,
}

impl PageSize {
    pub const LETTER: PageSize = PageSize { w: 816.0, h: 1056.0 };

    pub fn new(w: f32, h: f32) -> Self {
        Self { w, h }
    }

    /// Swaps the dimensions so that they match `orientation`.
    pub fn oriented(self, orientation: Orientation) -> Self {
        let landscape = self.w > self.h;
        match orientation {
            Orientation::Landscape if !landscape => Self::new(self.h, self.w),
            Orientation::Portrait if landscape => Self::new(self.h, self.w),
            _ => self,
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::LETTER
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Page margins. `header` and `footer` are the distances from the page edge
/// to the header and footer bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<f32>,
}

impl Margins {
    pub fn all(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
            header: None,
            footer: None,
        }
    }

    pub fn zero() -> Self {
        Self::all(0.0)
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::all(96.0)
    }
}

/// Declared column configuration of a section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub count: u32,
    pub gap: f32,
}

impl ColumnLayout {
    pub fn single() -> Self {
        Self { count: 1, gap: 0.0 }
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::single()
    }
}

/// Constraints handed to the external text measurer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasureConstraints {
    pub max_width: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<f32>,
}

impl MeasureConstraints {
    pub fn width(max_width: f32) -> Self {
        Self {
            max_width,
            max_height: None,
        }
    }
}
