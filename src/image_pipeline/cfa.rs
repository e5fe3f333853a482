//! Bayer color filter array description

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CfaColor {
    Red,
    Green,
    Blue,
}

impl CfaColor {
    /// Channel index inside an RGB(A) pixel.
    pub fn channel(self) -> usize {
        match self {
            CfaColor::Red => 0,
            CfaColor::Green => 1,
            CfaColor::Blue => 2,
        }
    }
}

/// The 2x2 color pattern repeated over the sensor, indexed `[y & 1][x & 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CfaDesc {
    pub desc: [[CfaColor; 2]; 2],
}

impl CfaDesc {
    pub const RGGB: CfaDesc = CfaDesc::new([
        [CfaColor::Red, CfaColor::Green],
        [CfaColor::Green, CfaColor::Blue],
    ]);
    pub const BGGR: CfaDesc = CfaDesc::new([
        [CfaColor::Blue, CfaColor::Green],
        [CfaColor::Green, CfaColor::Red],
    ]);
    pub const GRBG: CfaDesc = CfaDesc::new([
        [CfaColor::Green, CfaColor::Red],
        [CfaColor::Blue, CfaColor::Green],
    ]);
    pub const GBRG: CfaDesc = CfaDesc::new([
        [CfaColor::Green, CfaColor::Blue],
        [CfaColor::Red, CfaColor::Green],
    ]);

    pub const fn new(desc: [[CfaColor; 2]; 2]) -> Self {
        Self { desc }
    }

    pub fn color(&self, x: i64, y: i64) -> CfaColor {
        self.desc[(y & 1) as usize][(x & 1) as usize]
    }

    pub fn color_at(&self, x: usize, y: usize) -> CfaColor {
        self.desc[y & 1][x & 1]
    }

    /// One red, one blue and two greens on the diagonal.
    pub fn is_conventional(&self) -> bool {
        *self == Self::RGGB || *self == Self::BGGR || *self == Self::GRBG || *self == Self::GBRG
    }
}

impl Default for CfaDesc {
    fn default() -> Self {
        Self::RGGB
    }
}

impl fmt::Display for CfaDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = |c: CfaColor| match c {
            CfaColor::Red => 'R',
            CfaColor::Green => 'G',
            CfaColor::Blue => 'B',
        };
        for row in &self.desc {
            for c in row {
                write!(f, "{}", letter(*c))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_is_two_periodic() {
        for cfa in [CfaDesc::RGGB, CfaDesc::BGGR, CfaDesc::GRBG, CfaDesc::GBRG] {
            for y in -6i64..6 {
                for x in -6i64..6 {
                    assert_eq!(cfa.color(x, y), cfa.color(x + 2, y + 2));
                    assert_eq!(cfa.color(x, y), cfa.color(x + 2, y));
                    assert_eq!(cfa.color(x, y), cfa.color(x, y + 2));
                }
            }
        }
    }

    #[test]
    fn test_rggb_layout() {
        let cfa = CfaDesc::RGGB;
        assert_eq!(cfa.color_at(0, 0), CfaColor::Red);
        assert_eq!(cfa.color_at(1, 0), CfaColor::Green);
        assert_eq!(cfa.color_at(0, 1), CfaColor::Green);
        assert_eq!(cfa.color_at(1, 1), CfaColor::Blue);
        assert_eq!(cfa.color(-1, -1), CfaColor::Blue);
        assert_eq!(cfa.to_string(), "RGGB");
    }

    #[test]
    fn test_unconventional_pattern() {
        let cfa = CfaDesc::new([
            [CfaColor::Red, CfaColor::Red],
            [CfaColor::Green, CfaColor::Blue],
        ]);
        assert!(!cfa.is_conventional());
        assert!(CfaDesc::GBRG.is_conventional());
    }
}
