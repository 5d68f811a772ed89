//! Color adjustments: temperature, vibrance, hue.

use crate::core::error::ParamError;
use crate::core::stage::AdjustmentStage;
use crate::core::types::{AdjustmentId, Bitmap, ParamKind, ParamValue};
use crate::filters::registry::{FilterRegistry, FilterSpec};
use image::RgbaImage;
use rayon::prelude::*;

/// Register the color adjustments.
pub fn register(registry: &mut FilterRegistry) {
    registry.register(Temperature::spec());
    registry.register(Vibrance::spec());
    registry.register(Hue::spec());
}

/// Reference illuminant; the default target, and an exact identity.
const REFERENCE_KELVIN: f64 = 6500.0;

/// Green/magenta span covered by one unit of tint.
const TINT_SCALE: f64 = 150.0;

/// White-balance shift toward a target neutral point.
///
/// The parameter is a (kelvin, tint) vector. Slider conversion only
/// drives the kelvin component; tint stays reachable for callers going
/// through [`AdjustmentStage::set_parameter`] directly.
#[derive(Debug, Clone)]
pub struct Temperature {
    target_neutral: (f64, f64),
    input: Option<Bitmap>,
}

impl Temperature {
    /// Name of the tunable parameter.
    pub const PARAMETER: &'static str = "target_neutral";
    /// Documented default: the reference illuminant, zero tint.
    pub const DEFAULT: ParamValue = ParamValue::Vector2(REFERENCE_KELVIN, 0.0);

    /// Create a stage at its default.
    pub fn new() -> Self {
        Self {
            target_neutral: (REFERENCE_KELVIN, 0.0),
            input: None,
        }
    }

    pub(crate) fn spec() -> FilterSpec {
        FilterSpec::new(
            AdjustmentId::Temperature,
            Self::PARAMETER,
            || Some(Box::new(Temperature::new())),
            |scalar| ParamValue::Vector2(scalar, 0.0),
            Self::DEFAULT,
        )
    }
}

impl Default for Temperature {
    fn default() -> Self {
        Self::new()
    }
}

impl AdjustmentStage for Temperature {
    fn id(&self) -> AdjustmentId {
        AdjustmentId::Temperature
    }

    fn parameter(&self) -> ParamValue {
        ParamValue::Vector2(self.target_neutral.0, self.target_neutral.1)
    }

    fn set_parameter(&mut self, value: ParamValue) -> Result<(), ParamError> {
        match value {
            ParamValue::Vector2(kelvin, tint) => {
                self.target_neutral = (kelvin, tint);
                Ok(())
            }
            other => Err(ParamError::KindMismatch {
                expected: ParamKind::Vector2,
                got: other.kind(),
            }),
        }
    }

    fn set_input(&mut self, image: Bitmap) {
        self.input = Some(image);
    }

    fn input(&self) -> Option<&Bitmap> {
        self.input.as_ref()
    }

    fn output(&self) -> Option<Bitmap> {
        let input = self.input.as_ref()?;
        let (kelvin, tint) = self.target_neutral;
        if kelvin == REFERENCE_KELVIN && tint == 0.0 {
            return Some(input.clone());
        }
        Some(Bitmap::new(white_balance(input.pixels(), kelvin, tint)))
    }
}

/// Saturation boost weighted toward muted colors.
///
/// Already-saturated pixels move less than muted ones, which is what
/// separates vibrance from a plain saturation multiplier.
#[derive(Debug, Clone)]
pub struct Vibrance {
    amount: f64,
    input: Option<Bitmap>,
}

impl Vibrance {
    /// Name of the tunable parameter.
    pub const PARAMETER: &'static str = "amount";
    /// Documented default: no boost.
    pub const DEFAULT: ParamValue = ParamValue::Scalar(0.0);

    /// Create a stage at its default.
    pub fn new() -> Self {
        Self {
            amount: 0.0,
            input: None,
        }
    }

    pub(crate) fn spec() -> FilterSpec {
        FilterSpec::new(
            AdjustmentId::Vibrance,
            Self::PARAMETER,
            || Some(Box::new(Vibrance::new())),
            ParamValue::Scalar,
            Self::DEFAULT,
        )
    }
}

impl Default for Vibrance {
    fn default() -> Self {
        Self::new()
    }
}

impl AdjustmentStage for Vibrance {
    fn id(&self) -> AdjustmentId {
        AdjustmentId::Vibrance
    }

    fn parameter(&self) -> ParamValue {
        ParamValue::Scalar(self.amount)
    }

    fn set_parameter(&mut self, value: ParamValue) -> Result<(), ParamError> {
        match value {
            ParamValue::Scalar(amount) => {
                self.amount = amount;
                Ok(())
            }
            other => Err(ParamError::KindMismatch {
                expected: ParamKind::Scalar,
                got: other.kind(),
            }),
        }
    }

    fn set_input(&mut self, image: Bitmap) {
        self.input = Some(image);
    }

    fn input(&self) -> Option<&Bitmap> {
        self.input.as_ref()
    }

    fn output(&self) -> Option<Bitmap> {
        let input = self.input.as_ref()?;
        if self.amount == 0.0 {
            return Some(input.clone());
        }
        Some(Bitmap::new(vibrance(input.pixels(), self.amount)))
    }
}

/// Hue rotation around the luminance axis, in radians.
#[derive(Debug, Clone)]
pub struct Hue {
    angle: f64,
    input: Option<Bitmap>,
}

impl Hue {
    /// Name of the tunable parameter.
    pub const PARAMETER: &'static str = "angle";
    /// Documented default: no rotation.
    pub const DEFAULT: ParamValue = ParamValue::Scalar(0.0);

    /// Create a stage at its default.
    pub fn new() -> Self {
        Self {
            angle: 0.0,
            input: None,
        }
    }

    pub(crate) fn spec() -> FilterSpec {
        FilterSpec::new(
            AdjustmentId::Hue,
            Self::PARAMETER,
            || Some(Box::new(Hue::new())),
            ParamValue::Scalar,
            Self::DEFAULT,
        )
    }
}

impl Default for Hue {
    fn default() -> Self {
        Self::new()
    }
}

impl AdjustmentStage for Hue {
    fn id(&self) -> AdjustmentId {
        AdjustmentId::Hue
    }

    fn parameter(&self) -> ParamValue {
        ParamValue::Scalar(self.angle)
    }

    fn set_parameter(&mut self, value: ParamValue) -> Result<(), ParamError> {
        match value {
            ParamValue::Scalar(angle) => {
                self.angle = angle;
                Ok(())
            }
            other => Err(ParamError::KindMismatch {
                expected: ParamKind::Scalar,
                got: other.kind(),
            }),
        }
    }

    fn set_input(&mut self, image: Bitmap) {
        self.input = Some(image);
    }

    fn input(&self) -> Option<&Bitmap> {
        self.input.as_ref()
    }

    fn output(&self) -> Option<Bitmap> {
        let input = self.input.as_ref()?;
        if self.angle == 0.0 {
            return Some(input.clone());
        }
        Some(Bitmap::new(hue_rotate(input.pixels(), self.angle)))
    }
}

// ============================================================================
// Kernels
// ============================================================================

/// Planckian white point for a color temperature, normalized to [0, 1].
///
/// Tanner Helland's piecewise fit, clamped to its 1000..40000 K validity
/// range.
fn kelvin_to_rgb(kelvin: f64) -> [f64; 3] {
    let t = kelvin.clamp(1000.0, 40000.0) / 100.0;

    let r = if t <= 66.0 {
        255.0
    } else {
        329.698727446 * (t - 60.0).powf(-0.1332047592)
    };
    let g = if t <= 66.0 {
        99.4708025861 * t.ln() - 161.1195681661
    } else {
        288.1221695283 * (t - 60.0).powf(-0.0755148492)
    };
    let b = if t >= 66.0 {
        255.0
    } else if t <= 19.0 {
        0.0
    } else {
        138.5177312231 * (t - 10.0).ln() - 305.0447927307
    };

    [
        r.clamp(0.0, 255.0) / 255.0,
        g.clamp(0.0, 255.0) / 255.0,
        b.clamp(0.0, 255.0) / 255.0,
    ]
}

/// Per-channel multiplicative white balance.
///
/// Gains are the target white against the reference white, so targets
/// below the reference warm the image and targets above cool it; the
/// reference itself yields unit gains. Tint trades green for magenta.
fn white_balance(image: &RgbaImage, kelvin: f64, tint: f64) -> RgbaImage {
    let reference = kelvin_to_rgb(REFERENCE_KELVIN);
    let target = kelvin_to_rgb(kelvin);
    let mut gain = [
        target[0] / reference[0],
        target[1] / reference[1],
        target[2] / reference[2],
    ];
    gain[1] *= (1.0 - tint / TINT_SCALE).max(0.0);

    let mut out = image.clone();
    let buffer: &mut [u8] = &mut out;
    buffer.par_chunks_exact_mut(4).for_each(|pixel| {
        for c in 0..3 {
            pixel[c] = (pixel[c] as f64 * gain[c]).round().clamp(0.0, 255.0) as u8;
        }
    });
    out
}

/// Saturation boost scaled by how muted each pixel already is.
fn vibrance(image: &RgbaImage, amount: f64) -> RgbaImage {
    let amount = amount.clamp(-1.0, 1.0);

    let mut out = image.clone();
    let buffer: &mut [u8] = &mut out;
    buffer.par_chunks_exact_mut(4).for_each(|pixel| {
        let r = pixel[0] as f64 / 255.0;
        let g = pixel[1] as f64 / 255.0;
        let b = pixel[2] as f64 / 255.0;

        let saturation = r.max(g).max(b) - r.min(g).min(b);
        let factor = (1.0 + amount * (1.0 - saturation)).max(0.0);
        let luma = 0.299 * r + 0.587 * g + 0.114 * b;

        for (c, value) in [(0, r), (1, g), (2, b)] {
            let adjusted = luma + (value - luma) * factor;
            pixel[c] = (adjusted.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
    });
    out
}

/// Luminance-preserving hue rotation.
fn hue_rotate(image: &RgbaImage, angle: f64) -> RgbaImage {
    let (sinv, cosv) = angle.sin_cos();

    // Rotation around the luminance axis; rows sum to one, so neutral
    // grays are invariant under any angle.
    let matrix = [
        0.213 + cosv * 0.787 - sinv * 0.213,
        0.715 - cosv * 0.715 - sinv * 0.715,
        0.072 - cosv * 0.072 + sinv * 0.928,
        0.213 - cosv * 0.213 + sinv * 0.143,
        0.715 + cosv * 0.285 + sinv * 0.140,
        0.072 - cosv * 0.072 - sinv * 0.283,
        0.213 - cosv * 0.213 - sinv * 0.787,
        0.715 - cosv * 0.715 + sinv * 0.715,
        0.072 + cosv * 0.928 + sinv * 0.072,
    ];

    let mut out = image.clone();
    let buffer: &mut [u8] = &mut out;
    buffer.par_chunks_exact_mut(4).for_each(|pixel| {
        let r = pixel[0] as f64;
        let g = pixel[1] as f64;
        let b = pixel[2] as f64;
        for c in 0..3 {
            let rotated = matrix[c * 3] * r + matrix[c * 3 + 1] * g + matrix[c * 3 + 2] * b;
            pixel[c] = rotated.round().clamp(0.0, 255.0) as u8;
        }
    });
    out
}
