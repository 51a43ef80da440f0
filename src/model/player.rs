//! In-match player entity. Created at match start, mutated only by the
//! tick loop, destroyed with the match.

use serde::{Deserialize, Serialize};

use crate::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weapon {
    Pistol,
    Rifle,
    Shotgun,
    Sniper,
}

#[derive(Debug, Clone, Copy)]
pub struct WeaponStats {
    pub base_damage: f64,
    pub interval_ms: u64,
    pub speed: f64,
    pub range: f64,
}

impl Weapon {
    pub fn base_stats(self) -> WeaponStats {
        match self {
            Weapon::Pistol => WeaponStats { base_damage: 15.0, interval_ms: 500, speed: 10.0, range: 600.0 },
            Weapon::Rifle => WeaponStats { base_damage: 20.0, interval_ms: 400, speed: 12.0, range: 800.0 },
            Weapon::Shotgun => WeaponStats { base_damage: 35.0, interval_ms: 800, speed: 8.0, range: 400.0 },
            Weapon::Sniper => WeaponStats { base_damage: 50.0, interval_ms: 1200, speed: 15.0, range: 1200.0 },
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlayerInput {
    pub owner_id: String,
    pub declared_tick: u64,
    /// Server wall-clock receive time, in milliseconds since match start.
    pub client_timestamp_ms: u64,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub aim_angle: f64,
    pub shoot: bool,
    pub interact: bool,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub body_rotation: f64,
    pub turret_rotation: f64,
    pub vx: f64,
    pub vy: f64,
    pub health: f64,
    pub shield: f64,
    pub alive: bool,
    pub kills: u32,
    pub damage_dealt: f64,
    pub weapon: Weapon,
    pub last_fire_ms: u64,
    pub damage_stacks: u8,
    pub fire_rate_stacks: u8,
    /// Last input the tick loop cached for this player; applied every
    /// tick until replaced. `None` before the first input arrives.
    pub last_input: Option<PlayerInput>,
    pub disconnected_at_ms: Option<u64>,
    pub spawn_time_ms: u64,
}

impl Player {
    pub fn new(id: String, name: String, x: f64, y: f64) -> Self {
        Self {
            id,
            name,
            x,
            y,
            body_rotation: 0.0,
            turret_rotation: 0.0,
            vx: 0.0,
            vy: 0.0,
            health: config::DEFAULT_MAX_HEALTH,
            shield: 0.0,
            alive: true,
            kills: 0,
            damage_dealt: 0.0,
            weapon: Weapon::Pistol,
            last_fire_ms: 0,
            damage_stacks: 0,
            fire_rate_stacks: 0,
            last_input: None,
            disconnected_at_ms: None,
            spawn_time_ms: 0,
        }
    }

    pub fn fire_interval_ms(&self) -> u64 {
        let base = self.weapon.base_stats().interval_ms as f64;
        let divisor = 1.0 + config::FIRE_RATE_STACK_BONUS * self.fire_rate_stacks as f64;
        (base / divisor).round() as u64
    }

    pub fn current_damage(&self) -> f64 {
        self.weapon.base_stats().base_damage + config::DAMAGE_STACK_BONUS * self.damage_stacks as f64
    }

    pub fn can_fire(&self, now_ms: u64) -> bool {
        self.alive && now_ms.saturating_sub(self.last_fire_ms) >= self.fire_interval_ms()
    }

    /// Apply damage, absorbing into shield first. Returns true if the
    /// player died from this hit.
    pub fn apply_damage(&mut self, raw_damage: f64) -> bool {
        let mut remaining = raw_damage;
        let shield_absorbed = self.shield.min(remaining);
        self.shield -= shield_absorbed;
        remaining -= shield_absorbed;
        self.health = (self.health - remaining).max(0.0);
        if self.health <= 0.0 {
            self.alive = false;
            true
        } else {
            false
        }
    }

    pub fn add_shield_stack(&mut self) {
        self.shield = (self.shield + config::SHIELD_STACK_VALUE)
            .min(config::MAX_STACKS as f64 * config::SHIELD_STACK_VALUE);
    }

    pub fn add_damage_stack(&mut self) {
        self.damage_stacks = (self.damage_stacks + 1).min(config::MAX_STACKS);
    }

    pub fn add_fire_rate_stack(&mut self) {
        self.fire_rate_stacks = (self.fire_rate_stacks + 1).min(config::MAX_STACKS);
    }
}
