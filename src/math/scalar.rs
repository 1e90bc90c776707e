//! Numeric abstraction shared by plain and uncertain evaluation.
//!
//! Model formulas are written once against [`Scalar`] and evaluated either on
//! `f64` (fitting, residuals) or [`Uncertain`] (reporting with propagated σ).

use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::math::Uncertain;

pub trait Scalar:
    Clone
    + From<f64>
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    fn cosh(&self) -> Self;
    fn sinh(&self) -> Self;
}

impl Scalar for f64 {
    fn cosh(&self) -> Self {
        f64::cosh(*self)
    }

    fn sinh(&self) -> Self {
        f64::sinh(*self)
    }
}

impl Scalar for Uncertain {
    fn cosh(&self) -> Self {
        Uncertain::cosh(self)
    }

    fn sinh(&self) -> Self {
        Uncertain::sinh(self)
    }
}
