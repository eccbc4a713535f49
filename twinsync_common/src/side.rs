use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// One of the two folder trees being compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// A value held once per side
///
/// Every per-side field in the comparison tree is stored as a `SidePair`, so that
/// left and right always go through the same code path: `pair[side]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SidePair<T> {
    pub left: T,
    pub right: T,
}

impl<T> SidePair<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    /// Builds a pair where only `side` gets `value`, the other side its default
    pub fn one_sided(side: Side, value: T) -> Self
    where
        T: Default,
    {
        match side {
            Side::Left => Self::new(value, T::default()),
            Side::Right => Self::new(T::default(), value),
        }
    }

    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.left, &mut self.right);
    }
}

impl<T> Index<Side> for SidePair<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        self.get(side)
    }
}

impl<T> IndexMut<Side> for SidePair<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        self.get_mut(side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_side() {
        assert_eq!(Side::Left.other(), Side::Right);
        assert_eq!(Side::Right.other(), Side::Left);
    }

    #[test]
    fn test_side_pair_indexing() {
        let mut pair = SidePair::new(1, 2);
        assert_eq!(pair[Side::Left], 1);
        assert_eq!(pair[Side::Right], 2);

        pair[Side::Right] = 5;
        pair.swap();
        assert_eq!(pair, SidePair::new(5, 1));
    }

    #[test]
    fn test_one_sided() {
        let pair = SidePair::one_sided(Side::Right, String::from("a"));
        assert!(pair.left.is_empty());
        assert_eq!(pair.right, "a");
    }
}
