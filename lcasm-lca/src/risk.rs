//! Lookup tables behind the thematic instructions.
//!
//! Every lookup clamps its index into range. Out-of-range operands are never
//! an error.

use std::fmt;

/// Abnormality risk level, from least to most dangerous.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskTier {
    Zayin,
    Teth,
    He,
    Waw,
    Aleph,
}

impl RiskTier {
    pub const ALL: [RiskTier; 5] = [
        RiskTier::Zayin,
        RiskTier::Teth,
        RiskTier::He,
        RiskTier::Waw,
        RiskTier::Aleph,
    ];

    /// Extraction yield multipliers: riskier abnormalities give less per draw.
    const FAVORABLE: [f32; 5] = [1.0, 0.9, 0.8, 0.6, 0.5];
    /// Suppression difficulty multipliers applied to the abnormality's power,
    /// as `(numerator, denominator)` so that large powers scale exactly.
    const PUNITIVE: [(i64, i64); 5] = [(1, 1), (6, 5), (3, 2), (2, 1), (3, 1)];

    pub fn clamped(index: i32) -> Self {
        Self::ALL[clamp_index(index, Self::ALL.len())]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn extraction_multiplier(&self) -> f32 {
        Self::FAVORABLE[self.index()]
    }

    pub fn suppression_ratio(&self) -> (i64, i64) {
        Self::PUNITIVE[self.index()]
    }

    /// `power` scaled by the suppression multiplier, truncated toward zero.
    pub fn suppression_threshold(&self, power: i32) -> i64 {
        let (numerator, denominator) = self.suppression_ratio();
        i64::from(power) * numerator / denominator
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskTier::Zayin => "ZAYIN",
            RiskTier::Teth => "TETH",
            RiskTier::He => "HE",
            RiskTier::Waw => "WAW",
            RiskTier::Aleph => "ALEPH",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OrdealLevel {
    Dawn,
    Noon,
    Dusk,
    Midnight,
}

impl OrdealLevel {
    pub const ALL: [OrdealLevel; 4] = [
        OrdealLevel::Dawn,
        OrdealLevel::Noon,
        OrdealLevel::Dusk,
        OrdealLevel::Midnight,
    ];

    const SEVERITY: [i32; 4] = [5, 10, 20, 40];

    pub fn clamped(index: i32) -> Self {
        Self::ALL[clamp_index(index, Self::ALL.len())]
    }

    /// Damage dealt to the struck agent.
    pub fn severity(&self) -> i32 {
        Self::SEVERITY[*self as usize]
    }
}

const EGO_BONUS: [i32; 5] = [1, 2, 3, 5, 8];

/// Stat bonus granted by equipping E.G.O `id`.
pub fn ego_bonus(id: i32) -> i32 {
    EGO_BONUS[clamp_index(id, EGO_BONUS.len())]
}

fn clamp_index(index: i32, len: usize) -> usize {
    index.clamp(0, len as i32 - 1) as usize
}
