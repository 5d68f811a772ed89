//! Sharpening adjustment.

use crate::core::error::ParamError;
use crate::core::stage::AdjustmentStage;
use crate::core::types::{AdjustmentId, Bitmap, ParamKind, ParamValue};
use crate::filters::registry::{FilterRegistry, FilterSpec};
use image::{Rgba, RgbaImage};

/// Register the sharpening adjustment.
pub fn register(registry: &mut FilterRegistry) {
    registry.register(Sharpness::spec());
}

/// Edge sharpening via a 3x3 convolution.
///
/// Flat regions are invariant for any amount; the default of 0.4 is
/// deliberately not an identity, matching the adjustment's documented
/// baseline.
#[derive(Debug, Clone)]
pub struct Sharpness {
    sharpness: f64,
    input: Option<Bitmap>,
}

impl Sharpness {
    /// Name of the tunable parameter.
    pub const PARAMETER: &'static str = "sharpness";
    /// Documented default amount.
    pub const DEFAULT: ParamValue = ParamValue::Scalar(0.4);

    /// Create a stage at its default.
    pub fn new() -> Self {
        Self {
            sharpness: 0.4,
            input: None,
        }
    }

    pub(crate) fn spec() -> FilterSpec {
        FilterSpec::new(
            AdjustmentId::Sharpness,
            Self::PARAMETER,
            || Some(Box::new(Sharpness::new())),
            ParamValue::Scalar,
            Self::DEFAULT,
        )
    }
}

impl Default for Sharpness {
    fn default() -> Self {
        Self::new()
    }
}

impl AdjustmentStage for Sharpness {
    fn id(&self) -> AdjustmentId {
        AdjustmentId::Sharpness
    }

    fn parameter(&self) -> ParamValue {
        ParamValue::Scalar(self.sharpness)
    }

    fn set_parameter(&mut self, value: ParamValue) -> Result<(), ParamError> {
        match value {
            ParamValue::Scalar(sharpness) => {
                self.sharpness = sharpness;
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
        if self.sharpness == 0.0 {
            return Some(input.clone());
        }
        Some(Bitmap::new(sharpen(input.pixels(), self.sharpness)))
    }
}

/// 3x3 sharpening convolution.
///
/// Kernel weights sum to one, so flat regions pass through unchanged:
/// ```text
///  0    -a    0
/// -a  1+4a   -a
///  0    -a    0
/// ```
fn sharpen(image: &RgbaImage, amount: f64) -> RgbaImage {
    let a = amount as f32;
    #[rustfmt::skip]
    let kernel = [
        0.0,          -a, 0.0,
         -a, 1.0 + 4.0 * a, -a,
        0.0,          -a, 0.0,
    ];
    imageproc::filter::filter3x3::<Rgba<u8>, f32, u8>(image, &kernel)
}
