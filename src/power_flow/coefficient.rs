use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString};

/// Named scalar of the flow vector.
///
/// Sign convention: `Ess` positive = discharging, negative = charging;
/// `Grid` positive = buying, negative = selling. The declaration order is the
/// ordinal used by every dense row and solution vector.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumCount,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Coefficient {
    Prod,
    Cons,
    Ess,
    Grid,
    ProdToCons,
    ProdToGrid,
    ProdToEss,
    GridToCons,
    EssToCons,
    GridToEss,
}

/// Dimension of the flow vector.
pub const COEFFICIENT_COUNT: usize = Coefficient::COUNT;

/// Dense vector indexed by [`Coefficient::index`].
pub type Row = [f64; COEFFICIENT_COUNT];

impl Coefficient {
    /// All coefficients in ordinal order.
    pub const ALL: [Coefficient; COEFFICIENT_COUNT] = [
        Coefficient::Prod,
        Coefficient::Cons,
        Coefficient::Ess,
        Coefficient::Grid,
        Coefficient::ProdToCons,
        Coefficient::ProdToGrid,
        Coefficient::ProdToEss,
        Coefficient::GridToCons,
        Coefficient::EssToCons,
        Coefficient::GridToEss,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Split terms (`*_TO_*`) as opposed to the four node totals.
    pub fn is_split(self) -> bool {
        self.index() >= Coefficient::ProdToCons.index()
    }
}
