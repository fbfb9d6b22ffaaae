use crate::SPACEDIM;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Low,
    High,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Low, Side::High];

    /// Row of a `2 x SPACEDIM` boundary table
    pub fn index(&self) -> usize {
        match self {
            Side::Low => 0,
            Side::High => 1,
        }
    }

    /// The outward direction of the face normal along its axis
    pub fn outward(&self) -> isize {
        match self {
            Side::Low => -1,
            Side::High => 1,
        }
    }
}

/// One of the six faces of the box domain
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Face {
    pub side: Side,
    pub axis: usize,
}

impl Face {
    pub fn new(side: Side, axis: usize) -> Self {
        debug_assert!(axis < SPACEDIM);
        Self { side, axis }
    }

    /// All six faces, low faces first
    pub fn all() -> impl Iterator<Item = Face> {
        Side::ALL
            .into_iter()
            .flat_map(|side| (0..SPACEDIM).map(move |axis| Face::new(side, axis)))
    }
}

impl std::fmt::Display for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let axis = ["x", "y", "z"][self.axis];
        match self.side {
            Side::Low => write!(f, "low-{axis}"),
            Side::High => write!(f, "high-{axis}"),
        }
    }
}
