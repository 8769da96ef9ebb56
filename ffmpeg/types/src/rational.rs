/*!
    Rational number type for time bases and frame rates.
*/

use std::fmt;

/**
    A rational number represented as a numerator and denominator.

    Used for time bases (e.g., 1/90000 for MPEG-TS) and frame rates
    (e.g., 24000/1001 for 23.976 fps).
*/
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /**
        Create a new rational number.

        # Panics

        Panics if `den` is zero.
    */
    #[inline]
    pub const fn new(num: i32, den: i32) -> Self {
        assert!(den != 0, "denominator cannot be zero");
        Self { num, den }
    }

    /**
        Convert to f64.
    */
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /**
        Invert the rational (swap numerator and denominator).

        # Panics

        Panics if numerator is zero.
    */
    #[inline]
    pub const fn invert(self) -> Self {
        assert!(self.num != 0, "cannot invert zero");
        Self {
            num: self.den,
            den: self.num,
        }
    }

    /**
        Returns true if both terms are non-zero.

        FFmpeg reports unknown rates and time bases as `0/0` or `0/1`.
    */
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.num != 0 && self.den != 0
    }

    /**
        Multiply two rationals, reducing the result.

        Products that no longer fit in 32-bit terms are approximated.
    */
    pub fn mul(self, other: Self) -> Self {
        let num = self.num as i64 * other.num as i64;
        let den = self.den as i64 * other.den as i64;
        Self::reduce(num, den)
    }

    /**
        Approximate a real number with a rational whose terms do not exceed `max`.

        Uses continued fractions, so exact values like `0.5` or `1/3` come back
        as `1/2` and `1/3`.
    */
    pub fn approximate(value: f64, max: i32) -> Self {
        if value.is_nan() || value == 0.0 {
            return Self { num: 0, den: 1 };
        }

        let sign = if value < 0.0 { -1 } else { 1 };
        let max = i64::from(max.max(1));
        let mut x = value.abs();

        // Convergents h/k, seeded with h(-2)=0, h(-1)=1, k(-2)=1, k(-1)=0
        let (mut h_prev, mut h) = (0i64, 1i64);
        let (mut k_prev, mut k) = (1i64, 0i64);

        for _ in 0..64 {
            let whole = x.floor();
            if whole > max as f64 {
                break;
            }
            let a = whole as i64;
            let h_next = a * h + h_prev;
            let k_next = a * k + k_prev;
            if h_next > max || k_next > max {
                break;
            }
            (h_prev, h) = (h, h_next);
            (k_prev, k) = (k, k_next);

            let frac = x - whole;
            if frac < 1e-12 {
                break;
            }
            x = 1.0 / frac;
        }

        if k == 0 {
            // Larger than max, saturate
            return Self {
                num: sign * max as i32,
                den: 1,
            };
        }

        Self {
            num: sign * h as i32,
            den: k as i32,
        }
    }

    fn reduce(num: i64, den: i64) -> Self {
        if den == 0 {
            return Self { num: 0, den: 1 };
        }
        let divisor = gcd(num.unsigned_abs(), den.unsigned_abs()).max(1) as i64;
        let (mut num, mut den) = (num / divisor, den / divisor);
        if den < 0 {
            num = -num;
            den = -den;
        }
        match (i32::try_from(num), i32::try_from(den)) {
            (Ok(num), Ok(den)) => Self { num, den },
            _ => Self::approximate(num as f64 / den as f64, i32::MAX),
        }
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/**
    Rescale `value` from time base `from` into time base `to`.

    Rounds to the nearest integer with halfway cases away from zero, the
    same rounding FFmpeg uses for `av_rescale_q`. An invalid target time
    base yields zero.
*/
pub fn rescale(value: i64, from: Rational, to: Rational) -> i64 {
    let mut num = value as i128 * from.num as i128 * to.den as i128;
    let mut den = from.den as i128 * to.num as i128;
    if den == 0 {
        return 0;
    }
    if den < 0 {
        num = -num;
        den = -den;
    }
    let half = den / 2;
    let rounded = if num >= 0 {
        (num + half) / den
    } else {
        -((-num + half) / den)
    };
    rounded as i64
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl From<(i32, i32)> for Rational {
    fn from((num, den): (i32, i32)) -> Self {
        Self::new(num, den)
    }
}

impl From<i32> for Rational {
    fn from(num: i32) -> Self {
        Self::new(num, 1)
    }
}
