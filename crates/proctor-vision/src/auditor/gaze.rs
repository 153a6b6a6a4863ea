//! Horizontal gaze estimation from iris and eye-corner landmarks.

use crate::landmarks::{
    LandmarkSet, FIRST_EYE_INNER, FIRST_EYE_OUTER, FIRST_IRIS, SECOND_EYE_INNER,
    SECOND_EYE_OUTER, SECOND_IRIS,
};

/// Ratio reported when an eye cannot be measured.
pub const CENTERED: f64 = 0.5;

/// Landmark indices describing one eye.
#[derive(Debug, Clone, Copy)]
pub struct EyeIndices {
    pub inner: usize,
    pub outer: usize,
    pub iris: usize,
}

pub const FIRST_EYE: EyeIndices = EyeIndices {
    inner: FIRST_EYE_INNER,
    outer: FIRST_EYE_OUTER,
    iris: FIRST_IRIS,
};

pub const SECOND_EYE: EyeIndices = EyeIndices {
    inner: SECOND_EYE_INNER,
    outer: SECOND_EYE_OUTER,
    iris: SECOND_IRIS,
};

/// Iris position between the inner (0.0) and outer (1.0) eye corner.
///
/// Falls back to [`CENTERED`] when a landmark is missing or the eye has no
/// horizontal width.
pub fn eye_ratio(face: &LandmarkSet, eye: EyeIndices) -> f64 {
    let (Some(inner), Some(outer), Some(iris)) =
        (face.get(eye.inner), face.get(eye.outer), face.get(eye.iris))
    else {
        return CENTERED;
    };

    let width = outer.x - inner.x;
    if width == 0.0 {
        return CENTERED;
    }
    (iris.x - inner.x) / width
}

/// Average gaze ratio over both eyes.
pub fn gaze_ratio(face: &LandmarkSet) -> f64 {
    (eye_ratio(face, FIRST_EYE) + eye_ratio(face, SECOND_EYE)) / 2.0
}

/// Whether a ratio falls outside the open band `(lower, upper)`.
///
/// The band edges themselves count as looking away.
pub fn is_looking_away(ratio: f64, lower: f64, upper: f64) -> bool {
    ratio <= lower || ratio >= upper
}
