//! Projectile entity. Owned by exactly one match and exactly one
//! shooter; removed on range/lifetime expiry or collision.

use crate::config;
use crate::model::player::Weapon;

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: String,
    pub owner_id: String,
    pub weapon: Weapon,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub damage: f64,
    pub spawn_x: f64,
    pub spawn_y: f64,
    /// Client-declared fire timestamp, ms since match start.
    pub spawn_timestamp_ms: u64,
    pub max_range: f64,
    /// Match tick the projectile was spawned on, for the separate
    /// time-based expiry check (SPEC_FULL.md section 3 lists max range
    /// and expiration time as distinct fields).
    pub spawn_tick: u64,
}

impl Projectile {
    pub fn distance_traveled(&self) -> f64 {
        let dx = self.x - self.spawn_x;
        let dy = self.y - self.spawn_y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn out_of_range(&self) -> bool {
        self.distance_traveled() > self.max_range
    }

    /// True once `PROJECTILE_MAX_LIFETIME_TICKS` have elapsed since
    /// spawn, independent of distance travelled — a backstop against a
    /// projectile that never leaves range (e.g. a near-zero speed).
    pub fn expired(&self, current_tick: u64) -> bool {
        current_tick.saturating_sub(self.spawn_tick) >= config::PROJECTILE_MAX_LIFETIME_TICKS
    }

    pub fn advance_one_tick(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Projectile {
        Projectile {
            id: "proj-1".into(),
            owner_id: "p1".into(),
            weapon: Weapon::Shotgun,
            x: 0.0,
            y: 0.0,
            vx: 8.0,
            vy: 0.0,
            damage: 35.0,
            spawn_x: 0.0,
            spawn_y: 0.0,
            spawn_timestamp_ms: 0,
            max_range: 400.0,
            spawn_tick: 0,
        }
    }

    #[test]
    fn out_of_range_after_enough_ticks() {
        let mut proj = sample();
        for _ in 0..49 {
            proj.advance_one_tick();
            assert!(!proj.out_of_range(), "should still be in range");
        }
        proj.advance_one_tick(); // tick 50: travelled 400, at the boundary
        proj.advance_one_tick(); // tick 51: travelled 408, past it
        assert!(proj.out_of_range());
    }

    #[test]
    fn expires_by_lifetime_even_without_leaving_range() {
        let mut proj = sample();
        proj.vx = 0.0; // never leaves range on its own
        proj.max_range = 1_000_000.0;
        assert!(!proj.expired(config::PROJECTILE_MAX_LIFETIME_TICKS - 1));
        assert!(proj.expired(config::PROJECTILE_MAX_LIFETIME_TICKS));
    }
}
