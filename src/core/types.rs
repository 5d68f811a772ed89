//! Core value types for the adjustment pipeline.
//!
//! The type system uses closed enums rather than stringly-typed keys:
//! - The adjustment catalog is a finite set, so unknown identifiers are
//!   unrepresentable once parsing has succeeded
//! - Parameter values are a small tagged union, so a stage can reject a
//!   wrong-kind write with a typed error instead of a runtime cast
//! - serde handles both natively for state transfer to a frontend

use crate::core::error::ConfigurationError;
use image::{DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Identifier of one adjustment in the closed catalog.
///
/// Extending the pipeline means adding a variant here plus a registry
/// entry in [`crate::filters::builtin`]; chain logic never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentId {
    /// White-balance shift toward a target neutral temperature.
    Temperature,
    /// Saturation boost weighted toward muted colors.
    Vibrance,
    /// Hue rotation around the luminance axis.
    Hue,
    /// Luminance sharpening.
    Sharpness,
}

impl AdjustmentId {
    /// Every catalog entry, in canonical registration order.
    pub const ALL: [AdjustmentId; 4] = [
        AdjustmentId::Temperature,
        AdjustmentId::Vibrance,
        AdjustmentId::Hue,
        AdjustmentId::Sharpness,
    ];

    /// The stable lowercase name used in configuration and state files.
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentId::Temperature => "temperature",
            AdjustmentId::Vibrance => "vibrance",
            AdjustmentId::Hue => "hue",
            AdjustmentId::Sharpness => "sharpness",
        }
    }
}

impl fmt::Display for AdjustmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdjustmentId {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperature" => Ok(AdjustmentId::Temperature),
            "vibrance" => Ok(AdjustmentId::Vibrance),
            "hue" => Ok(AdjustmentId::Hue),
            "sharpness" => Ok(AdjustmentId::Sharpness),
            other => Err(ConfigurationError::UnknownFilter(other.to_string())),
        }
    }
}

/// Kind tag for [`ParamValue`], used in mismatch reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// A single float.
    Scalar,
    /// A two-component float vector.
    Vector2,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Scalar => write!(f, "scalar"),
            ParamKind::Vector2 => write!(f, "vector2"),
        }
    }
}

/// A tunable parameter value.
///
/// Most adjustments take a plain scalar; temperature takes a 2D vector
/// (kelvin, tint). The closed union replaces the dynamic key/value bag
/// of a generic property system with something the registry table can
/// guarantee at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ParamValue {
    /// Single float value.
    Scalar(f64),
    /// Two-component vector, e.g. (kelvin, tint).
    Vector2(f64, f64),
}

impl ParamValue {
    /// Get the kind tag of this value.
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Scalar(_) => ParamKind::Scalar,
            ParamValue::Vector2(_, _) => ParamKind::Vector2,
        }
    }

    /// Try to get this value as a scalar.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ParamValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get this value as a 2D vector.
    pub fn as_vector2(&self) -> Option<(f64, f64)> {
        match self {
            ParamValue::Vector2(x, y) => Some((*x, *y)),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Scalar(v) => write!(f, "{v:.4}"),
            ParamValue::Vector2(x, y) => write!(f, "({x:.2}, {y:.2})"),
        }
    }
}

/// Pixel extent of an image, the coordinate space a recompute renders into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Extent {
    /// Create a new extent.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether this extent covers zero pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Immutable RGBA8 image handle.
///
/// Pixel data is stored behind an `Arc` so a bitmap can flow through the
/// stage slots of a chain without copying; nothing mutates a bitmap in
/// place, every kernel produces a fresh one.
#[derive(Debug, Clone)]
pub struct Bitmap {
    data: Arc<RgbaImage>,
}

impl Bitmap {
    /// Wrap an RGBA buffer.
    pub fn new(image: RgbaImage) -> Self {
        Self {
            data: Arc::new(image),
        }
    }

    /// Convert any decoded image into an RGBA bitmap.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self::new(image.to_rgba8())
    }

    /// Decode a bitmap from a file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, image::ImageError> {
        Ok(Self::from_dynamic(image::open(path)?))
    }

    /// A zero-sized blank bitmap, the defined result of recomputing
    /// before any source image has been set.
    pub fn empty() -> Self {
        Self::new(RgbaImage::new(0, 0))
    }

    /// A solid-color bitmap.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    /// Encode to a file. JPEG output drops the alpha channel.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if matches!(ext.as_str(), "jpg" | "jpeg") {
            DynamicImage::ImageRgba8((*self.data).clone()).to_rgb8().save(path)
        } else {
            self.data.save(path)
        }
    }

    /// Borrow the underlying pixel buffer.
    pub fn pixels(&self) -> &RgbaImage {
        &self.data
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.data.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.data.height()
    }

    /// The extent this bitmap occupies.
    pub fn extent(&self) -> Extent {
        Extent::new(self.width(), self.height())
    }

    /// Whether this bitmap has zero pixels.
    pub fn is_empty(&self) -> bool {
        self.extent().is_empty()
    }

    /// Whether two handles share the same underlying buffer.
    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.extent() == other.extent() && self.data.as_raw() == other.data.as_raw())
    }
}
