//! Values with first-order (linear) uncertainty propagation.
//!
//! An [`Uncertain`] carries a nominal value plus its linear expansion over
//! independent error sources:
//!
//! ```text
//! f ≈ f0 + Σ_i (∂f/∂u_i) · δu_i        σ_f² = Σ_i (∂f/∂u_i)² σ_i²
//! ```
//!
//! Every arithmetic operation applies the chain rule to the derivative
//! coefficients, so a quantity that appears more than once in an expression
//! (e.g. `a` in `cosh(a·x + b) / a`) is correlated with itself correctly.
//!
//! Sources are identified by a process-wide counter; two values created with
//! [`Uncertain::new`] are always independent.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::DMatrix;

use crate::error::AppError;

static NEXT_SOURCE: AtomicU64 = AtomicU64::new(1);

/// Identifier of an independent error source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(u64);

impl SourceId {
    fn fresh() -> Self {
        Self(NEXT_SOURCE.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Term {
    sigma: f64,
    derivative: f64,
}

/// A nominal value with linearly propagated standard deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct Uncertain {
    nominal: f64,
    terms: BTreeMap<SourceId, Term>,
}

impl Uncertain {
    /// Create a value backed by a fresh independent source.
    ///
    /// The magnitude of `std_dev` is used; a zero deviation yields an exact value.
    pub fn new(nominal: f64, std_dev: f64) -> Self {
        let mut terms = BTreeMap::new();
        let sigma = std_dev.abs();
        if sigma > 0.0 {
            terms.insert(
                SourceId::fresh(),
                Term {
                    sigma,
                    derivative: 1.0,
                },
            );
        }
        Self { nominal, terms }
    }

    /// A value without uncertainty.
    pub fn exact(nominal: f64) -> Self {
        Self {
            nominal,
            terms: BTreeMap::new(),
        }
    }

    /// Create a value whose deviation is `relative · |nominal|`.
    pub fn with_relative(nominal: f64, relative: f64) -> Self {
        Self::new(nominal, (nominal * relative).abs())
    }

    /// Build a correlated vector from nominal values and their covariance.
    ///
    /// The covariance is decomposed as `C = V Λ Vᵀ`; each eigen-direction with
    /// a positive eigenvalue becomes one independent source shared by all
    /// returned values. Non-positive eigenvalues (rank deficiency or rounding)
    /// contribute nothing.
    pub fn correlated(values: &[f64], covariance: &DMatrix<f64>) -> Result<Vec<Uncertain>, AppError> {
        let n = values.len();
        if covariance.nrows() != n || covariance.ncols() != n {
            return Err(AppError::input(format!(
                "Covariance shape {}x{} does not match {n} values.",
                covariance.nrows(),
                covariance.ncols()
            )));
        }
        if covariance.iter().any(|v| !v.is_finite()) {
            return Err(AppError::runtime("Covariance matrix contains non-finite entries."));
        }

        // Symmetrize before decomposing; callers often pass (JᵀJ)⁻¹ products
        // that are symmetric only up to rounding.
        let sym = (covariance + covariance.transpose()) * 0.5;
        let eigen = sym.symmetric_eigen();

        let mut out: Vec<Uncertain> = values.iter().map(|&v| Uncertain::exact(v)).collect();
        for k in 0..n {
            let lambda = eigen.eigenvalues[k];
            if lambda <= 0.0 || !lambda.is_finite() {
                continue;
            }
            let id = SourceId::fresh();
            let sigma = lambda.sqrt();
            for (i, value) in out.iter_mut().enumerate() {
                let derivative = eigen.eigenvectors[(i, k)];
                if derivative != 0.0 {
                    value.terms.insert(id, Term { sigma, derivative });
                }
            }
        }
        Ok(out)
    }

    pub fn nominal(&self) -> f64 {
        self.nominal
    }

    pub fn variance(&self) -> f64 {
        self.terms
            .values()
            .map(|t| {
                let s = t.sigma * t.derivative;
                s * s
            })
            .sum()
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Covariance between two values through their shared sources.
    pub fn covariance(&self, other: &Uncertain) -> f64 {
        self.terms
            .iter()
            .filter_map(|(id, t)| {
                other
                    .terms
                    .get(id)
                    .map(|o| t.sigma * t.sigma * t.derivative * o.derivative)
            })
            .sum()
    }

    /// Independent sources this value depends on, with their standard deviations.
    pub fn sources(&self) -> impl Iterator<Item = (SourceId, f64)> + '_ {
        self.terms.iter().map(|(id, t)| (*id, t.sigma))
    }

    /// Linear value for the given source deviations (missing sources count as zero).
    pub fn at(&self, deviations: &BTreeMap<SourceId, f64>) -> f64 {
        self.nominal
            + self
                .terms
                .iter()
                .map(|(id, t)| t.derivative * deviations.get(id).copied().unwrap_or(0.0))
                .sum::<f64>()
    }

    pub fn cosh(&self) -> Self {
        self.chain(self.nominal.cosh(), self.nominal.sinh())
    }

    pub fn sinh(&self) -> Self {
        self.chain(self.nominal.sinh(), self.nominal.cosh())
    }

    /// `g(self)` where `g(nominal) = value` and `g'(nominal) = derivative`.
    fn chain(&self, value: f64, derivative: f64) -> Self {
        let terms = self
            .terms
            .iter()
            .map(|(id, t)| {
                (
                    *id,
                    Term {
                        sigma: t.sigma,
                        derivative: t.derivative * derivative,
                    },
                )
            })
            .collect();
        Self {
            nominal: value,
            terms,
        }
    }

    /// `g(a, b)` with partial derivatives `da = ∂g/∂a`, `db = ∂g/∂b`.
    fn combine(value: f64, a: &Uncertain, da: f64, b: &Uncertain, db: f64) -> Self {
        let mut terms = BTreeMap::new();
        for (id, t) in &a.terms {
            terms.insert(
                *id,
                Term {
                    sigma: t.sigma,
                    derivative: t.derivative * da,
                },
            );
        }
        for (id, t) in &b.terms {
            terms
                .entry(*id)
                .and_modify(|e: &mut Term| e.derivative += t.derivative * db)
                .or_insert(Term {
                    sigma: t.sigma,
                    derivative: t.derivative * db,
                });
        }
        Self {
            nominal: value,
            terms,
        }
    }
}

impl From<f64> for Uncertain {
    fn from(value: f64) -> Self {
        Uncertain::exact(value)
    }
}

impl Add<&Uncertain> for &Uncertain {
    type Output = Uncertain;
    fn add(self, rhs: &Uncertain) -> Uncertain {
        Uncertain::combine(self.nominal + rhs.nominal, self, 1.0, rhs, 1.0)
    }
}

impl Sub<&Uncertain> for &Uncertain {
    type Output = Uncertain;
    fn sub(self, rhs: &Uncertain) -> Uncertain {
        Uncertain::combine(self.nominal - rhs.nominal, self, 1.0, rhs, -1.0)
    }
}

impl Mul<&Uncertain> for &Uncertain {
    type Output = Uncertain;
    fn mul(self, rhs: &Uncertain) -> Uncertain {
        Uncertain::combine(self.nominal * rhs.nominal, self, rhs.nominal, rhs, self.nominal)
    }
}

impl Div<&Uncertain> for &Uncertain {
    type Output = Uncertain;
    fn div(self, rhs: &Uncertain) -> Uncertain {
        let q = self.nominal / rhs.nominal;
        Uncertain::combine(q, self, 1.0 / rhs.nominal, rhs, -q / rhs.nominal)
    }
}

impl Add<f64> for &Uncertain {
    type Output = Uncertain;
    fn add(self, rhs: f64) -> Uncertain {
        self.chain(self.nominal + rhs, 1.0)
    }
}

impl Sub<f64> for &Uncertain {
    type Output = Uncertain;
    fn sub(self, rhs: f64) -> Uncertain {
        self.chain(self.nominal - rhs, 1.0)
    }
}

impl Mul<f64> for &Uncertain {
    type Output = Uncertain;
    fn mul(self, rhs: f64) -> Uncertain {
        self.chain(self.nominal * rhs, rhs)
    }
}

impl Div<f64> for &Uncertain {
    type Output = Uncertain;
    fn div(self, rhs: f64) -> Uncertain {
        self.chain(self.nominal / rhs, 1.0 / rhs)
    }
}

impl Add<&Uncertain> for f64 {
    type Output = Uncertain;
    fn add(self, rhs: &Uncertain) -> Uncertain {
        rhs.chain(self + rhs.nominal, 1.0)
    }
}

impl Sub<&Uncertain> for f64 {
    type Output = Uncertain;
    fn sub(self, rhs: &Uncertain) -> Uncertain {
        rhs.chain(self - rhs.nominal, -1.0)
    }
}

impl Mul<&Uncertain> for f64 {
    type Output = Uncertain;
    fn mul(self, rhs: &Uncertain) -> Uncertain {
        rhs.chain(self * rhs.nominal, self)
    }
}

impl Div<&Uncertain> for f64 {
    type Output = Uncertain;
    fn div(self, rhs: &Uncertain) -> Uncertain {
        rhs.chain(self / rhs.nominal, -self / (rhs.nominal * rhs.nominal))
    }
}

impl Neg for &Uncertain {
    type Output = Uncertain;
    fn neg(self) -> Uncertain {
        self.chain(-self.nominal, -1.0)
    }
}

impl Neg for Uncertain {
    type Output = Uncertain;
    fn neg(self) -> Uncertain {
        -&self
    }
}

/// Owned-operand variants delegate to the reference implementations above.
macro_rules! forward_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<Uncertain> for Uncertain {
            type Output = Uncertain;
            fn $method(self, rhs: Uncertain) -> Uncertain {
                $imp::$method(&self, &rhs)
            }
        }

        impl $imp<&Uncertain> for Uncertain {
            type Output = Uncertain;
            fn $method(self, rhs: &Uncertain) -> Uncertain {
                $imp::$method(&self, rhs)
            }
        }

        impl $imp<Uncertain> for &Uncertain {
            type Output = Uncertain;
            fn $method(self, rhs: Uncertain) -> Uncertain {
                $imp::$method(self, &rhs)
            }
        }

        impl $imp<f64> for Uncertain {
            type Output = Uncertain;
            fn $method(self, rhs: f64) -> Uncertain {
                $imp::$method(&self, rhs)
            }
        }

        impl $imp<Uncertain> for f64 {
            type Output = Uncertain;
            fn $method(self, rhs: Uncertain) -> Uncertain {
                $imp::$method(self, &rhs)
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);
forward_binop!(Div, div);

/// Round a standard deviation with the Particle Data Group rule.
///
/// The three leading digits of σ decide the number of significant digits kept:
/// `100..=354` → 2, `355..=949` → 1, `950..=999` → round up to the next power
/// of ten and keep 2.
///
/// Returns the rounded σ and the power of ten of its last kept digit.
fn pdg_round(std_dev: f64) -> Option<(f64, i32)> {
    if !(std_dev.is_finite() && std_dev > 0.0) {
        return None;
    }
    let mut exponent = std_dev.log10().floor() as i32;
    let mut leading = (std_dev / 10f64.powi(exponent - 2)).round();
    if leading >= 1000.0 {
        exponent += 1;
        leading = (std_dev / 10f64.powi(exponent - 2)).round();
    }

    let (digits, exponent) = if leading <= 354.0 {
        (2, exponent)
    } else if leading <= 949.0 {
        (1, exponent)
    } else {
        (2, exponent + 1)
    };

    let place = exponent - (digits - 1);
    let unit = 10f64.powi(place);
    Some(((std_dev / unit).round() * unit, place))
}

/// Significant digits shown for a value without uncertainty.
const EXACT_DIGITS: i32 = 6;

/// `value` to [`EXACT_DIGITS`] significant digits, trailing zeros dropped.
fn fmt_exact(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{value}");
    }
    let exponent = value.abs().log10().floor() as i32;
    let decimals = (EXACT_DIGITS - 1 - exponent).max(0) as usize;
    let text = format!("{value:.decimals$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

impl fmt::Display for Uncertain {
    /// `nominal+/-std_dev`, both rounded to the last significant digit of σ.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let std_dev = self.std_dev();
        if std_dev == 0.0 {
            return write!(f, "{}+/-0", fmt_exact(self.nominal));
        }
        match pdg_round(std_dev) {
            Some((rounded, place)) => {
                let unit = 10f64.powi(place);
                let nominal = (self.nominal / unit).round() * unit;
                let decimals = if place < 0 { (-place) as usize } else { 0 };
                write!(f, "{nominal:.decimals$}+/-{rounded:.decimals$}")
            }
            None => write!(f, "{}+/-{}", self.nominal, std_dev),
        }
    }
}
