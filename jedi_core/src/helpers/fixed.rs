use lazy_static::lazy_static;
use ultraviolet::Vec2;

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

pub const FRAC_BITS: u32 = 16;

/// Angle units per full turn.
pub const ANGLE_UNITS: i32 = 16384;
const ANGLE_MASK: i32 = ANGLE_UNITS - 1;

/// 16.16 fixed-point number.
///
/// Multiplication and division go through `i64`. Results that do not fit
/// saturate, including division by zero, so nothing in the frame loop can
/// panic on bad geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fixed16(pub i32);

fn saturate(v: i64) -> Fixed16 {
    Fixed16(v.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
}

impl Fixed16 {
    pub const ZERO: Self = Fixed16(0);
    pub const ONE: Self = Fixed16(1 << FRAC_BITS);
    pub const HALF: Self = Fixed16(1 << (FRAC_BITS - 1));
    pub const MAX: Self = Fixed16(i32::MAX);
    pub const MIN: Self = Fixed16(i32::MIN);

    pub fn from_int(v: i32) -> Self {
        saturate((v as i64) << FRAC_BITS)
    }

    pub fn from_f32(v: f32) -> Self {
        // `as` saturates, NaN becomes zero.
        Fixed16((v as f64 * (1 << FRAC_BITS) as f64).round() as i32)
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / (1 << FRAC_BITS) as f32
    }

    pub fn floor(self) -> i32 {
        self.0 >> FRAC_BITS
    }

    pub fn ceil(self) -> i32 {
        ((self.0 as i64 + 0xffff) >> FRAC_BITS) as i32
    }

    pub fn round(self) -> i32 {
        ((self.0 as i64 + 0x8000) >> FRAC_BITS) as i32
    }

    pub fn abs(self) -> Self {
        Fixed16(self.0.saturating_abs())
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `self * mul / div` with a single rounding step.
    pub fn mul_div(self, mul: Fixed16, div: Fixed16) -> Self {
        let num = self.0 as i64 * mul.0 as i64;
        if div.0 == 0 {
            return if num >= 0 { Fixed16::MAX } else { Fixed16::MIN };
        }
        saturate(num / div.0 as i64)
    }

    pub fn mul_int(self, v: i32) -> Self {
        saturate(self.0 as i64 * v as i64)
    }

    pub fn recip(self) -> Self {
        Fixed16::ONE / self
    }

    pub fn sqrt(self) -> Self {
        if self.0 <= 0 {
            return Fixed16::ZERO;
        }
        Fixed16(isqrt((self.0 as u64) << FRAC_BITS) as i32)
    }
}

fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }

    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

impl Add for Fixed16 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Fixed16(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Fixed16 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Fixed16 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Fixed16(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Fixed16 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Fixed16 {
    type Output = Self;

    fn neg(self) -> Self {
        Fixed16(self.0.saturating_neg())
    }
}

impl Mul for Fixed16 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        saturate((self.0 as i64 * rhs.0 as i64) >> FRAC_BITS)
    }
}

impl Div for Fixed16 {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        if rhs.0 == 0 {
            return if self.0 >= 0 { Fixed16::MAX } else { Fixed16::MIN };
        }
        saturate(((self.0 as i64) << FRAC_BITS) / rhs.0 as i64)
    }
}

/// Ground-plane vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Vec2Fixed {
    pub x: Fixed16,
    pub z: Fixed16,
}

impl Vec2Fixed {
    pub const ZERO: Self = Vec2Fixed {
        x: Fixed16::ZERO,
        z: Fixed16::ZERO,
    };

    pub fn new(x: Fixed16, z: Fixed16) -> Self {
        Self { x, z }
    }

    pub fn from_f32(x: f32, z: f32) -> Self {
        Self {
            x: Fixed16::from_f32(x),
            z: Fixed16::from_f32(z),
        }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x.to_f32(), self.z.to_f32())
    }

    pub fn scale(self, s: Fixed16) -> Self {
        Self {
            x: self.x * s,
            z: self.z * s,
        }
    }

    pub fn length(self) -> Fixed16 {
        let sq = self.x.0 as i64 * self.x.0 as i64 + self.z.0 as i64 * self.z.0 as i64;
        Fixed16(isqrt(sq as u64).min(i32::MAX as u64) as i32)
    }

    /// Cross product in 32.32, exact.
    pub fn cross_wide(self, other: Self) -> i64 {
        self.x.0 as i64 * other.z.0 as i64 - other.x.0 as i64 * self.z.0 as i64
    }

    /// Rotates clockwise (seen from above) by `angle`.
    pub fn rotate(self, angle: Angle14) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: self.x * cos + self.z * sin,
            z: self.z * cos - self.x * sin,
        }
    }
}

impl Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.z - rhs.z)
    }
}

lazy_static! {
    static ref SIN_TABLE: Vec<Fixed16> = (0..ANGLE_UNITS)
        .map(|i| {
            let radians = i as f64 * std::f64::consts::TAU / ANGLE_UNITS as f64;
            Fixed16((radians.sin() * (1 << FRAC_BITS) as f64).round() as i32)
        })
        .collect();
}

/// Angle with 16384 units per turn, clockwise from +Z seen from above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Angle14(pub i32);

impl Angle14 {
    pub fn from_degrees(degrees: f32) -> Self {
        let units = (degrees as f64 / 360.0 * ANGLE_UNITS as f64).round() as i64;
        Angle14(units.rem_euclid(ANGLE_UNITS as i64) as i32)
    }

    pub fn to_degrees(self) -> f32 {
        (self.0 & ANGLE_MASK) as f32 * 360.0 / ANGLE_UNITS as f32
    }

    pub fn sin(self) -> Fixed16 {
        SIN_TABLE[(self.0 & ANGLE_MASK) as usize]
    }

    pub fn cos(self) -> Fixed16 {
        SIN_TABLE[((self.0 + ANGLE_UNITS / 4) & ANGLE_MASK) as usize]
    }

    pub fn sin_cos(self) -> (Fixed16, Fixed16) {
        (self.sin(), self.cos())
    }
}

impl Add for Angle14 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Angle14((self.0 + rhs.0) & ANGLE_MASK)
    }
}
