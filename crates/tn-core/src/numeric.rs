use crate::TnError;

/// Floating point type used throughout the engine
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, TnError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(TnError::NonFinite { what, value: v })
    }
}

/// Linear blend: `t = 0` gives `x0`, `t = 1` gives `x1`.
#[inline]
pub fn lerp(x0: Real, x1: Real, t: Real) -> Real {
    x0 * (1.0 - t) + x1 * t
}

/// Relative change `|new - old| / |old|`.
///
/// Falls back to the absolute change when `|old|` is below the default
/// absolute tolerance, so a zero reference never yields infinity.
pub fn relative_residual(old: Real, new: Real) -> Real {
    let diff = (new - old).abs();
    let scale = old.abs();
    if scale <= Tolerances::default().abs {
        diff
    } else {
        diff / scale
    }
}

/// Larger of `a` and `b`, where NaN on either side wins.
///
/// `f64::max` drops a NaN operand, which would hide a non-finite residual.
#[inline]
pub fn max_nan(a: Real, b: Real) -> Real {
    if a.is_nan() || b <= a { a } else { b }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn lerp_endpoints() {
        assert_eq!(lerp(2.0, 6.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 6.0, 1.0), 6.0);
        assert_eq!(lerp(2.0, 6.0, 0.25), 3.0);
    }

    #[test]
    fn relative_residual_cases() {
        assert!(nearly_equal(
            relative_residual(100.0, 101.0),
            0.01,
            Tolerances::default()
        ));
        assert!(nearly_equal(
            relative_residual(-100.0, -101.0),
            0.01,
            Tolerances::default()
        ));
        assert_eq!(relative_residual(0.0, 0.5), 0.5);
        assert_eq!(relative_residual(3.0, 3.0), 0.0);
    }

    #[test]
    fn max_nan_keeps_nan_from_either_side() {
        assert_eq!(max_nan(1.0, 2.0), 2.0);
        assert_eq!(max_nan(2.0, 1.0), 2.0);
        assert!(max_nan(Real::NAN, 2.0).is_nan());
        assert!(max_nan(2.0, Real::NAN).is_nan());
        assert!(max_nan(0.0, relative_residual(Real::INFINITY, Real::INFINITY)).is_nan());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn relative_residual_is_nonnegative(a in -1e6_f64..1e6, b in -1e6_f64..1e6) {
            prop_assert!(relative_residual(a, b) >= 0.0);
        }

        #[test]
        fn lerp_stays_between_endpoints(a in -1e3_f64..1e3, b in -1e3_f64..1e3, t in 0.0_f64..=1.0) {
            let v = lerp(a, b, t);
            let tol = Tolerances { abs: 1e-9, rel: 1e-9 };
            prop_assert!(v >= a.min(b) || nearly_equal(v, a.min(b), tol));
            prop_assert!(v <= a.max(b) || nearly_equal(v, a.max(b), tol));
        }
    }
}
