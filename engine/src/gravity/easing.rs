//! Easing curves for gravity flips.

use serde::{Deserialize, Serialize};

/// Shape of a flip's progress over time.
///
/// Every curve satisfies `evaluate(0) == 0` and `evaluate(1) == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EasingCurve {
    Linear,
    #[default]
    SmoothStep,
    EaseInOutCubic,
    EaseOutQuad,
}

impl EasingCurve {
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingCurve::Linear => t,
            EasingCurve::SmoothStep => t * t * (3.0 - 2.0 * t),
            EasingCurve::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - u * u * u / 2.0
                }
            }
            EasingCurve::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}
