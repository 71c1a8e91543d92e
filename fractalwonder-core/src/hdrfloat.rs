//! High Dynamic Range Float: ~48-bit mantissa precision with extended exponent.
//!
//! Uses double-single arithmetic where the value = (head + tail) × 2^exp.
//! This provides ~48 bits of mantissa precision using two f32 values,
//! enabling arithmetic at magnitudes (~10^±300 and beyond) that f64 cannot
//! represent, without paying for full arbitrary-precision arithmetic on
//! every pixel.

use crate::bigfloat::BigFloat;

/// High Dynamic Range Float with ~48-bit mantissa precision.
/// Value = (head + tail) × 2^exp
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HDRFloat {
    /// Primary mantissa, normalized to [0.5, 1.0) in absolute value.
    pub head: f32,
    /// Error term, |tail| ≤ 0.5 × ulp(head)
    pub tail: f32,
    /// Binary exponent (base 2)
    pub exp: i32,
}

impl HDRFloat {
    /// Zero constant.
    pub const ZERO: Self = Self {
        head: 0.0,
        tail: 0.0,
        exp: 0,
    };

    /// Check if value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.head == 0.0
    }

    /// Check the sign without materializing the full value.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.head < 0.0
    }

    /// Create from f32 value.
    pub fn from_f32(val: f32) -> Self {
        if val == 0.0 {
            return Self::ZERO;
        }
        // Extract mantissa and exponent using bit manipulation
        let bits = val.to_bits();
        let sign = bits & 0x8000_0000;
        let biased_exp = ((bits >> 23) & 0xFF) as i32;

        if biased_exp == 0 {
            // Subnormal - handle via normalize
            return Self {
                head: val,
                tail: 0.0,
                exp: 0,
            }
            .normalize();
        }

        // Normal number: extract exponent, set mantissa to [0.5, 1.0)
        let exp = biased_exp - 126; // -126 gives [0.5, 1.0) range
        let mantissa_bits = (bits & 0x007F_FFFF) | 0x3F00_0000 | sign;
        let head = f32::from_bits(mantissa_bits);

        Self {
            head,
            tail: 0.0,
            exp,
        }
    }

    /// Convert to f32. Returns 0 on underflow, ±f32::MAX on overflow.
    ///
    /// Never clamps the exponent and recomputes the mantissa from it —
    /// that silently corrupts the ratio between components when they're
    /// used for a direction vector. Underflow/overflow simply collapse
    /// to 0 / ±MAX.
    pub fn to_f32(&self) -> f32 {
        if self.head == 0.0 {
            return 0.0;
        }
        let mantissa = self.head + self.tail;
        if self.exp > 127 {
            return if mantissa > 0.0 {
                f32::MAX
            } else {
                -f32::MAX
            };
        }
        if self.exp < -149 {
            return 0.0;
        }
        mantissa * exp2_i32(self.exp)
    }

    /// Create from f64, splitting into head + tail for ~48-bit precision.
    pub fn from_f64(val: f64) -> Self {
        if val == 0.0 {
            return Self::ZERO;
        }

        // Extract mantissa and exponent from f64
        let (mantissa, exp) = frexp_f64(val);

        // Split 53-bit mantissa into head (24 bits) + tail (remaining ~29 bits)
        let head = mantissa as f32;
        let tail = (mantissa - head as f64) as f32;

        Self { head, tail, exp }.normalize()
    }

    /// Convert to f64.
    pub fn to_f64(&self) -> f64 {
        if self.head == 0.0 {
            return 0.0;
        }
        let mantissa = self.head as f64 + self.tail as f64;
        libm::ldexp(mantissa, self.exp)
    }

    /// Approximate base-2 logarithm of the absolute value, valid across the
    /// entire HDR range (unlike `to_f64().log2()`, which underflows/overflows
    /// whenever `exp` is outside f64's exponent range).
    pub fn log2(&self) -> f64 {
        if self.is_zero() {
            return f64::NEG_INFINITY;
        }
        let mantissa = (self.head as f64 + self.tail as f64).abs();
        self.exp as f64 + mantissa.log2()
    }

    /// Construct from a BigFloat (HPFloat), handling magnitudes that would
    /// overflow or underflow a direct f64 conversion.
    ///
    /// Tries the fast path first (`to_f64` then `from_f64`); if that
    /// underflows to zero or overflows to infinity, estimates the order of
    /// magnitude via `log2_approx` and reconstructs head/exp directly rather
    /// than attempting a lossy round-trip through f64.
    pub fn from_bigfloat(value: &BigFloat) -> Self {
        let direct = value.to_f64();
        if direct.is_finite() && direct != 0.0 {
            return Self::from_f64(direct);
        }

        let log2 = value.log2_approx();
        if log2 == f64::NEG_INFINITY {
            return Self::ZERO;
        }

        let exp = log2.floor() as i32 + 1;
        let mantissa = libm::exp2(log2 - exp as f64);
        let signed_mantissa = if direct.is_sign_negative() || value.to_f64().is_sign_negative() {
            -mantissa
        } else {
            mantissa
        };

        Self {
            head: signed_mantissa as f32,
            tail: 0.0,
            exp,
        }
        .normalize()
    }

    /// Convert back to a BigFloat at the requested working precision.
    ///
    /// Reconstructs the value by scaling the mantissa by 2^exp in chunks of
    /// 512 bits rather than via a single `f64` power, so magnitudes far
    /// beyond f64's exponent range round-trip without overflowing.
    pub fn to_bigfloat(&self, precision_bits: usize) -> BigFloat {
        if self.is_zero() {
            return BigFloat::zero(precision_bits);
        }
        let mantissa = BigFloat::with_precision(self.head as f64, precision_bits)
            .add(&BigFloat::with_precision(self.tail as f64, precision_bits));

        const CHUNK: i32 = 512;
        let big_scale = BigFloat::with_precision(2f64.powi(CHUNK), precision_bits);
        let small_scale = BigFloat::with_precision(2f64.powi(-CHUNK), precision_bits);

        let mut result = mantissa;
        let mut remaining = self.exp;
        while remaining >= CHUNK {
            result = result.mul(&big_scale);
            remaining -= CHUNK;
        }
        while remaining <= -CHUNK {
            result = result.mul(&small_scale);
            remaining += CHUNK;
        }
        if remaining != 0 {
            result = result.mul(&BigFloat::with_precision(2f64.powi(remaining), precision_bits));
        }
        result
    }

    /// Normalize head to [0.5, 1.0) range.
    #[inline]
    pub fn normalize(self) -> Self {
        if self.head == 0.0 {
            // If head is zero but tail is not, promote tail to head
            if self.tail != 0.0 {
                return Self {
                    head: self.tail,
                    tail: 0.0,
                    exp: self.exp,
                }
                .normalize();
            }
            return Self::ZERO;
        }

        let abs_head = self.head.abs();
        // Fast path: already in [0.5, 1.0)
        if (0.5..1.0).contains(&abs_head) {
            return self;
        }

        // Extract exponent via bit manipulation
        let bits = self.head.to_bits();
        let sign = bits & 0x8000_0000;
        let biased_exp = ((bits >> 23) & 0xFF) as i32;

        if biased_exp == 0 {
            // Subnormal: use slower path
            let (m, e) = frexp_f32(self.head);
            let scale = exp2_i32(-e);
            return Self {
                head: m,
                tail: self.tail * scale,
                exp: self.exp + e,
            };
        }

        // Normal: adjust to [0.5, 1.0) range
        let exp_adjust = biased_exp - 126;
        let new_mantissa_bits = (bits & 0x807F_FFFF) | 0x3F00_0000;
        let new_head = f32::from_bits(new_mantissa_bits | sign);
        let scale = exp2_i32(-exp_adjust);
        let new_tail = self.tail * scale;

        Self {
            head: new_head,
            tail: new_tail,
            exp: self.exp + exp_adjust,
        }
    }

    /// Multiply two HDRFloat values with error tracking.
    #[inline]
    pub fn mul(&self, other: &Self) -> Self {
        if self.head == 0.0 || other.head == 0.0 {
            return Self::ZERO;
        }

        // Primary product
        let p = self.head * other.head;

        // Error from primary product using FMA: err = fma(a, b, -p) = a*b - p
        let err = self.head.mul_add(other.head, -p);

        // Cross terms: h1·t2 + t1·h2 (t1·t2 is negligible)
        let tail = err + self.head * other.tail + self.tail * other.head;

        Self {
            head: p,
            tail,
            exp: self.exp.saturating_add(other.exp),
        }
        .normalize()
    }

    /// Multiply by a plain f64 scalar.
    #[inline]
    pub fn mul_f64(&self, scalar: f64) -> Self {
        self.mul(&Self::from_f64(scalar))
    }

    /// Divide by a plain f64 scalar.
    #[inline]
    pub fn div_f64(&self, scalar: f64) -> Self {
        self.mul_f64(1.0 / scalar)
    }

    /// Square value (optimized: fewer operations than mul).
    #[inline]
    pub fn square(&self) -> Self {
        if self.head == 0.0 {
            return Self::ZERO;
        }

        let p = self.head * self.head;
        let err = self.head.mul_add(self.head, -p);
        let tail = err + 2.0 * self.head * self.tail;

        Self {
            head: p,
            tail,
            exp: self.exp.saturating_mul(2),
        }
        .normalize()
    }

    /// Square root. Halves the exponent, adjusting the mantissa by √2 when
    /// the exponent is odd so the result stays exact.
    pub fn sqrt(&self) -> Self {
        if self.head <= 0.0 {
            return Self::ZERO;
        }
        let mantissa = (self.head as f64 + self.tail as f64).abs();
        if self.exp % 2 == 0 {
            Self::from_f64(mantissa.sqrt()).scaled_by_exp(self.exp / 2)
        } else {
            Self::from_f64((mantissa * 2.0).sqrt()).scaled_by_exp((self.exp - 1) / 2)
        }
    }

    /// Multiply by 2^n exactly (exponent shift only, no rounding).
    #[inline]
    fn scaled_by_exp(&self, n: i32) -> Self {
        Self {
            head: self.head,
            tail: self.tail,
            exp: self.exp.saturating_add(n),
        }
    }

    /// Add two HDRFloat values with error tracking.
    #[inline]
    pub fn add(&self, other: &Self) -> Self {
        if self.head == 0.0 {
            return *other;
        }
        if other.head == 0.0 {
            return *self;
        }

        let exp_diff = self.exp - other.exp;

        // If difference > ~48 bits, smaller value is negligible
        if exp_diff > 48 {
            return *self;
        }
        if exp_diff < -48 {
            return *other;
        }

        // Align to larger exponent
        let (a_head, a_tail, b_head, b_tail, result_exp) = if exp_diff >= 0 {
            let scale = exp2_i32(-exp_diff);
            (
                self.head,
                self.tail,
                other.head * scale,
                other.tail * scale,
                self.exp,
            )
        } else {
            let scale = exp2_i32(exp_diff);
            (
                self.head * scale,
                self.tail * scale,
                other.head,
                other.tail,
                other.exp,
            )
        };

        // Two-sum: error-free addition of heads
        let sum = a_head + b_head;
        let err = two_sum_err(a_head, b_head, sum);

        // Combine tails with error term
        let tail = err + a_tail + b_tail;

        Self {
            head: sum,
            tail,
            exp: result_exp,
        }
        .normalize()
    }

    /// Subtract other from self.
    #[inline]
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    /// Negate value.
    #[inline]
    pub fn neg(&self) -> Self {
        Self {
            head: -self.head,
            tail: -self.tail,
            exp: self.exp,
        }
    }

    /// `self > other`, via subtraction rather than comparing `(head, exp)`
    /// pairs directly, so it stays correct across differing exponents
    /// without a separate alignment step.
    #[inline]
    pub fn gt(&self, other: &Self) -> bool {
        let diff = self.sub(other);
        !diff.is_negative() && !diff.is_zero()
    }

    /// `self < other`.
    #[inline]
    pub fn lt(&self, other: &Self) -> bool {
        other.gt(self)
    }
}

/// Compute 2^n for integer n within f32 exponent range.
#[inline]
fn exp2_i32(n: i32) -> f32 {
    if n < -149 {
        return 0.0;
    }
    if n > 127 {
        return f32::INFINITY;
    }
    if n >= -126 {
        // Normal range
        f32::from_bits(((n + 127) as u32) << 23)
    } else {
        // Subnormal range
        f32::from_bits(1u32 << (n + 149))
    }
}

/// Extract mantissa and exponent: val = mantissa × 2^exp, mantissa in [0.5, 1.0)
#[inline]
fn frexp_f32(val: f32) -> (f32, i32) {
    if val == 0.0 {
        return (0.0, 0);
    }
    let bits = val.to_bits();
    let sign = bits & 0x8000_0000;
    let biased_exp = ((bits >> 23) & 0xFF) as i32;

    if biased_exp == 0 {
        // Subnormal: normalize first
        let normalized = val * (1u64 << 23) as f32;
        let (m, e) = frexp_f32(normalized);
        return (m, e - 23);
    }

    let exp = biased_exp - 126;
    let mantissa_bits = (bits & 0x007F_FFFF) | 0x3F00_0000 | sign;
    (f32::from_bits(mantissa_bits), exp)
}

/// Extract mantissa and exponent from f64: val = mantissa × 2^exp, mantissa in [0.5, 1.0)
#[inline]
fn frexp_f64(val: f64) -> (f64, i32) {
    if val == 0.0 {
        return (0.0, 0);
    }
    let (m, e) = libm::frexp(val);
    (m, e)
}

/// Compute error term from addition: a + b = sum + err (Knuth's two-sum)
#[inline]
fn two_sum_err(a: f32, b: f32, sum: f32) -> f32 {
    let b_virtual = sum - a;
    let a_virtual = sum - b_virtual;
    let b_roundoff = b - b_virtual;
    let a_roundoff = a - a_virtual;
    a_roundoff + b_roundoff
}
