//! Coordinate transforms between workspace and native document space
//!
//! Fields are stored in workspace pixels: origin at the top-left of the
//! design canvas, y growing downward, canvas width fixed per template.
//! Documents use native points with the origin at the bottom-left.
//! The flip between the two happens here and nowhere else.

use crate::types::NativeDimensions;
use serde::{Deserialize, Serialize};

/// A point in workspace pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A rectangle in workspace pixels, anchored top-left
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkspaceRect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl WorkspaceRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Right edge x coordinate
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge y coordinate
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// A rectangle in native document units, anchored bottom-left
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NativeRect {
    /// Left edge
    pub x: f32,
    /// Bottom edge
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NativeRect {
    /// Top edge y coordinate
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// Center x coordinate
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Center y coordinate
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// Native units per workspace pixel for a side.
///
/// One scalar covers both axes: the canvas height is derived from the
/// same ratio, so aspect ratio is preserved.
pub fn workspace_to_native_ratio(dimensions: NativeDimensions, workspace_width: f32) -> f32 {
    dimensions.width_native / workspace_width
}

/// Canvas height in workspace pixels for a side
pub fn workspace_height(dimensions: NativeDimensions, workspace_width: f32) -> f32 {
    dimensions.height_native / workspace_to_native_ratio(dimensions, workspace_width)
}

/// Maps one side's workspace onto a page of the output document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideTransform {
    /// Native units per workspace pixel
    pub ratio: f32,
    /// Height of the target page in native units
    pub page_height: f32,
}

impl SideTransform {
    /// Transform onto a page with exactly the side's recorded dimensions
    pub fn new(dimensions: NativeDimensions, workspace_width: f32) -> Self {
        Self {
            ratio: workspace_to_native_ratio(dimensions, workspace_width),
            page_height: dimensions.height_native,
        }
    }

    /// Same ratio, different target page height (e.g. a back side drawn
    /// onto the front page of a single-page document)
    pub fn with_page_height(self, page_height: f32) -> Self {
        Self {
            page_height,
            ..self
        }
    }

    /// Scale a workspace length (font size, stroke width) to native units
    pub fn scale_length(&self, length: f32) -> f32 {
        length * self.ratio
    }

    /// Convert a top-left anchored workspace rectangle to a bottom-left
    /// anchored native rectangle
    pub fn to_native(&self, rect: &WorkspaceRect) -> NativeRect {
        let width = rect.width * self.ratio;
        let height = rect.height * self.ratio;
        NativeRect {
            x: rect.x * self.ratio,
            y: self.page_height - rect.y * self.ratio - height,
            width,
            height,
        }
    }

    /// Inverse of [`SideTransform::to_native`]
    pub fn to_workspace(&self, rect: &NativeRect) -> WorkspaceRect {
        WorkspaceRect {
            x: rect.x / self.ratio,
            y: (self.page_height - rect.y - rect.height) / self.ratio,
            width: rect.width / self.ratio,
            height: rect.height / self.ratio,
        }
    }
}
