//! Minimal single-precision complex number used by the real FFT.

use libm::{cos, sin};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Complex32 {
    pub re: f32,
    pub im: f32,
}

impl Complex32 {
    pub const fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }

    pub const fn zero() -> Self {
        Self { re: 0.0, im: 0.0 }
    }

    /// `exp(i * theta)`, evaluated in double precision before narrowing so
    /// that precomputed twiddle tables stay accurate for long transforms.
    #[inline]
    pub fn expi(theta: f64) -> Self {
        Self {
            re: cos(theta) as f32,
            im: sin(theta) as f32,
        }
    }

    #[inline(always)]
    pub fn conj(self) -> Self {
        Self {
            re: self.re,
            im: -self.im,
        }
    }

    #[inline(always)]
    pub fn norm_sqr(self) -> f32 {
        self.re * self.re + self.im * self.im
    }
}

impl core::ops::Add for Complex32 {
    type Output = Self;
    #[inline(always)]
    fn add(self, other: Self) -> Self {
        Self {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }
}

impl core::ops::Sub for Complex32 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, other: Self) -> Self {
        Self {
            re: self.re - other.re,
            im: self.im - other.im,
        }
    }
}

impl core::ops::Mul for Complex32 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, other: Self) -> Self {
        Self {
            re: self.re * other.re - self.im * other.im,
            im: self.re * other.im + self.im * other.re,
        }
    }
}

impl core::ops::Mul<f32> for Complex32 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, scale: f32) -> Self {
        Self {
            re: self.re * scale,
            im: self.im * scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;
    use libm::fabsf;

    #[test]
    fn expi_quarter_turn() {
        let c = Complex32::expi(PI / 2.0);
        assert!(fabsf(c.re) < 1e-7);
        assert!(fabsf(c.im - 1.0) < 1e-7);
    }

    #[test]
    fn mul_matches_definition() {
        let a = Complex32::new(1.0, 2.0);
        let b = Complex32::new(3.0, -1.0);
        assert_eq!(a * b, Complex32::new(5.0, 5.0));
        assert_eq!((a * b).norm_sqr(), 50.0);
        assert_eq!(a.conj(), Complex32::new(1.0, -2.0));
    }
}
