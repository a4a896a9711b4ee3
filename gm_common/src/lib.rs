pub mod luhn;
mod points;

pub use points::{Points, PointsConversionError};
