//! Crates and the loot they yield.

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LootKind {
    /// "armor" and "shield" in the source denote the same stacking
    /// resource (SPEC_FULL.md section 9, open question).
    Shield,
    Ammo,
    DamageBoost,
    FireRateBoost,
    WeaponUpgrade,
}

impl LootKind {
    /// Weighted draw for crate contents.
    pub fn random(rng: &mut impl Rng) -> LootKind {
        let weights: [(LootKind, u32); 5] = [
            (LootKind::Shield, 30),
            (LootKind::Ammo, 20),
            (LootKind::DamageBoost, 20),
            (LootKind::FireRateBoost, 20),
            (LootKind::WeaponUpgrade, 10),
        ];
        let total: u32 = weights.iter().map(|(_, w)| w).sum();
        let mut roll = rng.gen_range(0..total);
        for (kind, weight) in weights {
            if roll < weight {
                return kind;
            }
            roll -= weight;
        }
        unreachable!("weights sum to total")
    }
}

#[derive(Debug, Clone)]
pub struct LootItem {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub kind: LootKind,
}

#[derive(Debug, Clone)]
pub struct Crate {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub opened: bool,
}

impl Crate {
    /// Open the crate, yielding exactly one loot item. The crate
    /// transitions opened -> gone within one tick after this call; the
    /// caller is responsible for removing it from the match state.
    pub fn open(&mut self, rng: &mut impl Rng) -> LootItem {
        self.opened = true;
        LootItem {
            id: format!("loot-{}", self.id),
            x: self.x,
            y: self.y,
            kind: LootKind::random(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn opening_a_crate_marks_it_opened() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut c = Crate { id: "c1".into(), x: 0.0, y: 0.0, opened: false };
        let loot = c.open(&mut rng);
        assert!(c.opened);
        assert_eq!(loot.x, 0.0);
    }
}
