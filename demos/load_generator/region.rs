use rand::Rng;

/// Sales region a shopper belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    NW,
    SW,
    MN,
    MS,
    NE,
    SE,
}

impl Region {
    pub const ALL: [Region; 6] = [Region::NW, Region::SW, Region::MN, Region::MS, Region::NE, Region::SE];

    /// Pick a region from the caller's random source
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Region {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
