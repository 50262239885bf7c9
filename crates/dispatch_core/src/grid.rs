//! City grid coordinates.
//!
//! The map is a fixed `GRID_SIZE` × `GRID_SIZE` grid of blocks. Columns are
//! labelled with letters and rows with 1-based numbers, so the block at
//! `(17, 13)` reads as `R14`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::math::{fixed_sqrt, Fixed, Vec2Fixed};

/// Number of blocks along each axis of the city grid.
pub const GRID_SIZE: i32 = 20;

/// A block on the city grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    /// Column, `0..GRID_SIZE`.
    pub x: i32,
    /// Row, `0..GRID_SIZE`.
    pub y: i32,
}

impl GridPos {
    /// Create a grid position. Bounds are not checked.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether this position lies on the map.
    #[must_use]
    pub const fn in_bounds(self) -> bool {
        self.x >= 0 && self.x < GRID_SIZE && self.y >= 0 && self.y < GRID_SIZE
    }

    /// Squared Euclidean distance in blocks.
    ///
    /// Exact integer arithmetic; hit tests compare this against the squared
    /// acceptance radius.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }

    /// Euclidean distance in blocks, for display.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(Fixed::from_num(self.distance_squared(other)))
    }

    /// Position as a fixed-point vector (block corner coordinates).
    #[must_use]
    pub fn to_vec2(self) -> Vec2Fixed {
        Vec2Fixed::new(Fixed::from_num(self.x), Fixed::from_num(self.y))
    }

    /// Map label, e.g. `R14`.
    #[must_use]
    pub fn label(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.in_bounds() {
            // in_bounds guarantees 0..20, so the cast cannot truncate
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            let column = char::from(b'A' + self.x as u8);
            write!(f, "{}{}", column, self.y + 1)
        } else {
            write!(f, "({}, {})", self.x, self.y)
        }
    }
}

impl FromStr for GridPos {
    type Err = DispatchError;

    /// Parse a map label such as `R14` or `r14`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DispatchError::InvalidGridLabel(s.to_string());

        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let column = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
        if !column.is_ascii_uppercase() {
            return Err(invalid());
        }
        let row: i32 = chars.as_str().parse().map_err(|_| invalid())?;

        let pos = Self::new(column as i32 - 'A' as i32, row - 1);
        if pos.in_bounds() {
            Ok(pos)
        } else {
            Err(invalid())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(GridPos::new(0, 0).in_bounds());
        assert!(GridPos::new(19, 19).in_bounds());
        assert!(!GridPos::new(20, 0).in_bounds());
        assert!(!GridPos::new(0, -1).in_bounds());
    }

    #[test]
    fn test_distance_squared_is_symmetric() {
        let a = GridPos::new(8, 10);
        let b = GridPos::new(17, 13);
        assert_eq!(a.distance_squared(b), 90);
        assert_eq!(b.distance_squared(a), 90);
    }

    #[test]
    fn test_label() {
        assert_eq!(GridPos::new(17, 13).label(), "R14");
        assert_eq!(GridPos::new(0, 0).label(), "A1");
        assert_eq!(GridPos::new(19, 19).label(), "T20");
    }

    #[test]
    fn test_parse_label() {
        assert_eq!("R14".parse::<GridPos>().unwrap(), GridPos::new(17, 13));
        assert_eq!(" a1 ".parse::<GridPos>().unwrap(), GridPos::new(0, 0));
        assert!("U1".parse::<GridPos>().is_err());
        assert!("A21".parse::<GridPos>().is_err());
        assert!("A0".parse::<GridPos>().is_err());
        assert!("14".parse::<GridPos>().is_err());
        assert!("".parse::<GridPos>().is_err());
    }
}
