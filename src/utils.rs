use std::ops::Add;

/// maps any integer onto `[0, modulus)`, wrapping negatives around.
/// every ring and torus lookup goes through here.
pub fn wrap(value: isize, modulus: usize) -> usize {
    assert!(modulus > 0, "wrap modulus must be positive");
    value.rem_euclid(modulus as isize) as usize
}

/// a lattice position, `x` is the column and `y` the row.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub struct Pos {
    pub x: isize,
    pub y: isize,
}

#[macro_export]
macro_rules! pos {
    ($x:expr, $y:expr) => {
        $crate::Pos { x: $x, y: $y }
    };
}

impl Pos {
    /// folds the position back onto a `size`-sized torus.
    pub fn wrapped(self, size: usize) -> (usize, usize) {
        (wrap(self.x, size), wrap(self.y, size))
    }
}

impl Add for Pos {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        pos!(self.x + rhs.x, self.y + rhs.y)
    }
}

#[test]
fn test_wrap() {
    assert_eq!(wrap(0, 8), 0);
    assert_eq!(wrap(7, 8), 7);
    assert_eq!(wrap(8, 8), 0);
    assert_eq!(wrap(-1, 8), 7);
    assert_eq!(wrap(-9, 8), 7);
    assert_eq!(wrap(-1, 1), 0);
}

#[test]
fn test_pos_wrapped() {
    let pos = pos!(-1, 4) + pos!(0, 1);
    assert_eq!(pos.wrapped(4), (3, 1));
    assert_eq!((pos + pos!(-3, -3)).wrapped(4), (0, 2));
}

#[cfg(test)]
mod props {
    use super::wrap;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn wrap_lands_in_range(value in -10_000isize..10_000, modulus in 1usize..500) {
            let wrapped = wrap(value, modulus);
            prop_assert!(wrapped < modulus);
        }

        #[test]
        fn wrap_is_periodic(value in -10_000isize..10_000, modulus in 1usize..500) {
            prop_assert_eq!(wrap(value + modulus as isize, modulus), wrap(value, modulus));
        }
    }
}
