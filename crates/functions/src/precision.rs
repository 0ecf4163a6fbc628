//! Double-double arithmetic: a value is the unevaluated sum `hi + lo` of two
//! `f64`s with `|lo| <= ulp(hi) / 2`, giving roughly 106 bits of mantissa.
//!
//! Numeric accumulators keep their running state in [`DoubleDouble`] so that
//! long streams of `iterate`/`delete` calls do not drift.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DoubleDouble {
    hi: f64,
    lo: f64,
}

#[inline]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bb = s - a;
    let err = (a - (s - bb)) + (b - bb);
    (s, err)
}

#[inline]
fn quick_two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let err = b - (s - a);
    (s, err)
}

#[inline]
fn two_prod(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    let err = a.mul_add(b, -p);
    (p, err)
}

impl DoubleDouble {
    pub const ZERO: DoubleDouble = DoubleDouble { hi: 0.0, lo: 0.0 };
    pub const ONE: DoubleDouble = DoubleDouble { hi: 1.0, lo: 0.0 };

    pub fn new(hi: f64, lo: f64) -> Self {
        let (hi, lo) = two_sum(hi, lo);
        Self { hi, lo }
    }

    fn from_parts(hi: f64, lo: f64) -> Self {
        let (hi, lo) = quick_two_sum(hi, lo);
        Self { hi, lo }
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn to_f64(&self) -> f64 {
        self.hi + self.lo
    }

    pub fn is_zero(&self) -> bool {
        self.hi == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.hi.is_finite() && self.lo.is_finite()
    }

    pub fn is_negative(&self) -> bool {
        self.hi < 0.0 || (self.hi == 0.0 && self.lo < 0.0)
    }

    pub fn abs(&self) -> Self {
        if self.is_negative() { -*self } else { *self }
    }

    pub fn add_f64(&self, b: f64) -> Self {
        let (s, e) = two_sum(self.hi, b);
        Self::from_parts(s, e + self.lo)
    }

    pub fn mul_f64(&self, b: f64) -> Self {
        let (p, e) = two_prod(self.hi, b);
        Self::from_parts(p, e + self.lo * b)
    }

    pub fn recip(&self) -> Self {
        Self::ONE / *self
    }

    pub fn sqr(&self) -> Self {
        *self * *self
    }

    pub fn sqrt(&self) -> Self {
        if self.is_zero() {
            return Self::ZERO;
        }
        if self.is_negative() {
            return Self::from(f64::NAN);
        }
        // One Newton step on the f64 estimate doubles the precision.
        let x = self.hi.sqrt();
        let ax = Self::from(x);
        let residual = (*self - ax.sqr()).hi;
        ax.add_f64(residual / (2.0 * x))
    }

    pub fn powi(&self, n: u32) -> Self {
        let mut result = Self::ONE;
        let mut base = *self;
        let mut exp = n;
        while exp > 0 {
            if exp & 1 == 1 {
                result *= base;
            }
            base = base.sqr();
            exp >>= 1;
        }
        result
    }

    /// The positive real `n`th root. Negative inputs only have one for odd `n`.
    pub fn nth_root(&self, n: u32) -> Self {
        match n {
            0 => return Self::from(f64::NAN),
            1 => return *self,
            2 => return self.sqrt(),
            _ => {}
        }
        if self.is_zero() {
            return Self::ZERO;
        }
        if self.is_negative() {
            if n % 2 == 0 {
                return Self::from(f64::NAN);
            }
            return -(-*self).nth_root(n);
        }

        let mut x = Self::from(self.hi.powf(1.0 / n as f64));
        if !x.is_finite() || x.is_zero() {
            return x;
        }
        for _ in 0..2 {
            // x <- x - (x^n - a) / (n * x^(n-1))
            let x_n_minus_1 = x.powi(n - 1);
            let f = x_n_minus_1 * x - *self;
            let df = x_n_minus_1.mul_f64(n as f64);
            if df.is_zero() || !df.is_finite() {
                break;
            }
            x -= f / df;
        }
        x
    }
}

impl From<f64> for DoubleDouble {
    fn from(v: f64) -> Self {
        Self { hi: v, lo: 0.0 }
    }
}

impl From<i64> for DoubleDouble {
    fn from(v: i64) -> Self {
        let hi = v as f64;
        // i64 values beyond 2^53 lose bits in `hi`; keep them in `lo`.
        let lo = (v as i128 - hi as i128) as f64;
        Self::new(hi, lo)
    }
}

impl Add for DoubleDouble {
    type Output = Self;

    fn add(self, b: Self) -> Self {
        let (s, e) = two_sum(self.hi, b.hi);
        let (t, f) = two_sum(self.lo, b.lo);
        let (s, e) = quick_two_sum(s, e + t);
        Self::from_parts(s, e + f)
    }
}

impl Sub for DoubleDouble {
    type Output = Self;

    fn sub(self, b: Self) -> Self {
        self + (-b)
    }
}

impl Mul for DoubleDouble {
    type Output = Self;

    fn mul(self, b: Self) -> Self {
        let (p, e) = two_prod(self.hi, b.hi);
        let e = e + (self.hi * b.lo + self.lo * b.hi);
        Self::from_parts(p, e)
    }
}

impl Div for DoubleDouble {
    type Output = Self;

    fn div(self, b: Self) -> Self {
        let q1 = self.hi / b.hi;
        if !q1.is_finite() {
            return Self::from(q1);
        }
        let r = self - b.mul_f64(q1);
        let q2 = r.hi / b.hi;
        let r = r - b.mul_f64(q2);
        let q3 = r.hi / b.hi;
        Self::from_parts(q1, q2).add_f64(q3)
    }
}

impl Neg for DoubleDouble {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            hi: -self.hi,
            lo: -self.lo,
        }
    }
}

impl AddAssign for DoubleDouble {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for DoubleDouble {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for DoubleDouble {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl DivAssign for DoubleDouble {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl PartialOrd for DoubleDouble {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.hi.partial_cmp(&other.hi)? {
            Ordering::Equal => self.lo.partial_cmp(&other.lo),
            ord => Some(ord),
        }
    }
}

impl fmt::Display for DoubleDouble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}
