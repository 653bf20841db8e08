//! Adaptive 2-D quadrature of complex-valued integrands
//!
//! The beam amplitude is a double integral over the angular spectrum. The
//! integrand is complex, so the real and imaginary parts are integrated
//! independently (two full 2-D passes) and recombined. The 1-D primitive is
//! an adaptive Gauss-Kronrod (G7, K15) rule with interval bisection, with
//! the QUADPACK default tolerances.

use std::cell::RefCell;
use std::fmt;

use num_complex::Complex64;
use thiserror::Error;

/// Default absolute tolerance (QUADPACK / scipy default).
pub const DEFAULT_EPSABS: f64 = 1.49e-8;
/// Default relative tolerance.
pub const DEFAULT_EPSREL: f64 = 1.49e-8;
/// Default bisection depth cap per interval.
pub const DEFAULT_MAX_DEPTH: u32 = 40;

/// 15-point Kronrod abscissae (positive half, descending; last entry is 0).
/// Odd indices are the embedded 7-point Gauss nodes.
const XGK: [f64; 8] = [
    0.991455371120813,
    0.949107912342759,
    0.864864423359769,
    0.741531185599394,
    0.586087235467691,
    0.405845151377397,
    0.207784955007898,
    0.000000000000000,
];

/// Kronrod weights matching `XGK`.
const WGK: [f64; 8] = [
    0.022935322010529,
    0.063092092629979,
    0.104790010322250,
    0.140653259715525,
    0.169004726639267,
    0.190350578064785,
    0.204432940075298,
    0.209482141084728,
];

/// Gauss weights for the embedded nodes (XGK[1], XGK[3], XGK[5], XGK[7]).
const WG: [f64; 4] = [
    0.129484966168870,
    0.279705391489277,
    0.381830050505119,
    0.417959183673469,
];

/// Failure class of a partial (real or imaginary) quadrature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationErrorKind {
    /// Error estimate still above tolerance at the subdivision depth cap.
    NonConvergence,
    /// The integrand produced a non-finite value.
    DomainError,
}

impl fmt::Display for IntegrationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrationErrorKind::NonConvergence => write!(f, "NonConvergence"),
            IntegrationErrorKind::DomainError => write!(f, "DomainError"),
        }
    }
}

/// One or both partial quadratures failed. Never retried internally; the
/// caller decides whether this aborts the whole sampling run.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct IntegrationError {
    pub kind: IntegrationErrorKind,
    pub message: String,
}

/// Result of one complex double integral.
#[derive(Debug, Clone, Copy)]
pub struct IntegrationResult {
    /// Integral value, real + i*imag.
    pub value: Complex64,
    /// Estimated absolute error of the real-part quadrature.
    pub real_error: f64,
    /// Estimated absolute error of the imaginary-part quadrature.
    pub imag_error: f64,
}

/// Adaptive quadrature settings.
#[derive(Debug, Clone, Copy)]
pub struct Quadrature {
    /// Absolute tolerance per integral.
    pub epsabs: f64,
    /// Relative tolerance per integral.
    pub epsrel: f64,
    /// Bisection depth cap; exceeding it is a `NonConvergence` error.
    pub max_depth: u32,
}

impl Default for Quadrature {
    fn default() -> Self {
        Self {
            epsabs: DEFAULT_EPSABS,
            epsrel: DEFAULT_EPSREL,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// One G7/K15 evaluation over [a, b]: returns the K15 value and the
/// |K15 - G7| error estimate.
fn gauss_kronrod<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64) -> (f64, f64) {
    let half = 0.5 * (b - a);
    let mid = 0.5 * (a + b);

    let f_mid = f(mid);
    let mut kronrod = WGK[7] * f_mid;
    let mut gauss = WG[3] * f_mid;

    for j in 0..7 {
        let dx = half * XGK[j];
        let pair = f(mid - dx) + f(mid + dx);
        kronrod += WGK[j] * pair;
        if j % 2 == 1 {
            gauss += WG[j / 2] * pair;
        }
    }

    let kronrod = kronrod * half;
    let gauss = gauss * half;
    (kronrod, (kronrod - gauss).abs())
}

impl Quadrature {
    /// Adaptive 1-D integral of `f` over [a, b].
    ///
    /// Returns the value and the accumulated error estimate.
    pub fn quad<F: Fn(f64) -> f64>(&self, f: F, a: f64, b: f64) -> Result<(f64, f64), IntegrationError> {
        self.adapt(&f, a, b, self.epsabs, self.max_depth)
    }

    fn adapt<F: Fn(f64) -> f64>(
        &self,
        f: &F,
        a: f64,
        b: f64,
        tol: f64,
        depth: u32,
    ) -> Result<(f64, f64), IntegrationError> {
        let (value, err) = gauss_kronrod(f, a, b);

        if !value.is_finite() {
            return Err(IntegrationError {
                kind: IntegrationErrorKind::DomainError,
                message: format!("integrand is not finite on [{a:.6e}, {b:.6e}]"),
            });
        }

        if err <= tol || err <= self.epsrel * value.abs() {
            return Ok((value, err));
        }

        if depth == 0 {
            return Err(IntegrationError {
                kind: IntegrationErrorKind::NonConvergence,
                message: format!(
                    "error estimate {err:.3e} above tolerance {tol:.3e} on [{a:.6e}, {b:.6e}] at depth cap"
                ),
            });
        }

        let mid = 0.5 * (a + b);
        let (left, left_err) = self.adapt(f, a, mid, 0.5 * tol, depth - 1)?;
        let (right, right_err) = self.adapt(f, mid, b, 0.5 * tol, depth - 1)?;
        Ok((left + right, left_err + right_err))
    }

    /// Adaptive 2-D integral of a real integrand `f(inner, outer)`.
    ///
    /// The outer variable ranges over the fixed interval [a, b]; the inner
    /// variable over [gfun(outer), hfun(outer)].
    pub fn dblquad<F, G, H>(
        &self,
        f: F,
        a: f64,
        b: f64,
        gfun: G,
        hfun: H,
    ) -> Result<(f64, f64), IntegrationError>
    where
        F: Fn(f64, f64) -> f64,
        G: Fn(f64) -> f64,
        H: Fn(f64) -> f64,
    {
        // Closures passed to `quad` return plain f64, so an inner failure is
        // parked here and re-raised once the outer pass unwinds.
        let inner_failure: RefCell<Option<IntegrationError>> = RefCell::new(None);

        let outer = |y: f64| match self.quad(|x| f(x, y), gfun(y), hfun(y)) {
            Ok((value, _)) => value,
            Err(e) => {
                inner_failure.borrow_mut().get_or_insert(e);
                f64::NAN
            }
        };

        let result = self.quad(outer, a, b);
        if let Some(e) = inner_failure.into_inner() {
            return Err(e);
        }
        result
    }

    /// Integrate the real and imaginary parts of `f(inner, outer)`
    /// independently over [a, b] x [gfun, hfun].
    pub fn complex_dblquad<F, G, H>(
        &self,
        f: F,
        a: f64,
        b: f64,
        gfun: G,
        hfun: H,
    ) -> Result<IntegrationResult, IntegrationError>
    where
        F: Fn(f64, f64) -> Complex64,
        G: Fn(f64) -> f64 + Copy,
        H: Fn(f64) -> f64 + Copy,
    {
        let (re, real_error) = self.dblquad(|x, y| f(x, y).re, a, b, gfun, hfun)?;
        let (im, imag_error) = self.dblquad(|x, y| f(x, y).im, a, b, gfun, hfun)?;

        Ok(IntegrationResult {
            value: Complex64::new(re, im),
            real_error,
            imag_error,
        })
    }
}

/// Convenience wrapper with default tolerances.
pub fn complex_dblquad<F, G, H>(
    f: F,
    a: f64,
    b: f64,
    gfun: G,
    hfun: H,
) -> Result<IntegrationResult, IntegrationError>
where
    F: Fn(f64, f64) -> Complex64,
    G: Fn(f64) -> f64 + Copy,
    H: Fn(f64) -> f64 + Copy,
{
    Quadrature::default().complex_dblquad(f, a, b, gfun, hfun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_quad_polynomial() {
        let q = Quadrature::default();
        let (value, err) = q.quad(|x| x * x, 0.0, 2.0).unwrap();
        assert!((value - 8.0 / 3.0).abs() < 1e-10);
        assert!(err < 1e-8);
    }

    #[test]
    fn test_quad_sine() {
        let q = Quadrature::default();
        let (value, _) = q.quad(|x| x.sin(), 0.0, PI).unwrap();
        assert!((value - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_dblquad_triangle() {
        // Unit right triangle: inner bound depends on the outer variable.
        let q = Quadrature::default();
        let (value, _) = q.dblquad(|_, _| 1.0, 0.0, 1.0, |_| 0.0, |y| y).unwrap();
        assert!((value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_complex_dblquad_separable() {
        // Integral of exp(i(x + y)) over [0, pi/2]^2 equals (1 + i)^2 = 2i.
        let result = complex_dblquad(
            |x, y| Complex64::new(0.0, x + y).exp(),
            0.0,
            FRAC_PI_2,
            |_| 0.0,
            |_| FRAC_PI_2,
        )
        .unwrap();
        assert!(result.value.re.abs() < 1e-9);
        assert!((result.value.im - 2.0).abs() < 1e-9);
        assert!(result.real_error < 1e-7);
        assert!(result.imag_error < 1e-7);
    }

    #[test]
    fn test_domain_error_is_reported() {
        let q = Quadrature::default();
        let err = q.quad(|x| (x - 0.5).sqrt(), 0.0, 1.0).unwrap_err();
        assert_eq!(err.kind, IntegrationErrorKind::DomainError);
    }

    #[test]
    fn test_depth_cap_reports_non_convergence() {
        let q = Quadrature {
            max_depth: 2,
            ..Quadrature::default()
        };
        // Sharp peak that two bisections cannot resolve to 1.49e-8.
        let err = q
            .quad(|x| 1.0 / (1e-12 + (x - 0.3).powi(2)), 0.0, 1.0)
            .unwrap_err();
        assert_eq!(err.kind, IntegrationErrorKind::NonConvergence);
    }

    #[test]
    fn test_inner_failure_propagates_through_dblquad() {
        let q = Quadrature::default();
        let err = q
            .dblquad(|x, _| (x - 0.5).sqrt(), 0.0, 1.0, |_| 0.0, |_| 1.0)
            .unwrap_err();
        assert_eq!(err.kind, IntegrationErrorKind::DomainError);
    }
}
