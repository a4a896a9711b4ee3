use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

//--------------------------------------      Points       -----------------------------------------------------------
/// A quantity of loyalty points with two decimal places of precision.
///
/// Points are stored as integer hundredths so that balances can be summed and compared exactly. On the wire they are
/// plain JSON numbers (`42.5`), which is also how the external accrual service reports them.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[sqlx(transparent)]
pub struct Points(i64);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as points: {0}")]
pub struct PointsConversionError(String);

impl Points {
    /// The raw value in hundredths of a point.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// A whole number of points.
    pub fn from_points(points: i64) -> Self {
        Self(points * 100)
    }

    /// Hundredths of a point, exactly as stored.
    pub fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Add for Points {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Points {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Points {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl AddAssign for Points {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Points {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Points {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl From<i64> for Points {
    fn from(hundredths: i64) -> Self {
        Self(hundredths)
    }
}

impl TryFrom<f64> for Points {
    type Error = PointsConversionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(PointsConversionError(format!("{value} is not a finite number")));
        }
        let hundredths = (value * 100.0).round();
        if hundredths.abs() >= i64::MAX as f64 {
            return Err(PointsConversionError(format!("{value} is too large")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(hundredths as i64))
    }
}

impl Display for Points {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0 as f64 / 100.0)
    }
}

impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0 as f64 / 100.0)
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Points::try_from(value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic_is_exact() {
        let a = Points::from_points(42);
        let b = Points::try_from(0.1).unwrap();
        assert_eq!((a + b).value(), 4210);
        assert_eq!((a - b).value(), 4190);
        let mut c = a;
        c -= b;
        assert_eq!(c.value(), 4190);
        assert_eq!((-b).value(), -10);
        let total: Points = [a, b, b].into_iter().sum();
        assert_eq!(total.value(), 4220);
    }

    #[test]
    fn fractional_round_trip() {
        let p: Points = serde_json::from_str("729.98").unwrap();
        assert_eq!(p.value(), 72998);
        assert_eq!(serde_json::to_string(&p).unwrap(), "729.98");
        let whole: Points = serde_json::from_str("42").unwrap();
        assert_eq!(whole, Points::from_points(42));
    }

    #[test]
    fn rejects_non_finite_values() {
        assert!(Points::try_from(f64::NAN).is_err());
        assert!(Points::try_from(f64::INFINITY).is_err());
        assert!(serde_json::from_str::<Points>("\"abc\"").is_err());
    }

    #[test]
    fn display_has_two_decimals() {
        assert_eq!(Points::from_points(5).to_string(), "5.00");
        assert_eq!(Points::from_hundredths(1234).to_string(), "12.34");
    }
}
