//! Weapon fire handling and lag-compensated projectile spawning
//! (SPEC_FULL.md section 4.3). Grounded in the base server's
//! `systems/weapon.rs` projectile-creation pattern, adapted so the
//! shot originates from a historical snapshot instead of the live state.

use tracing::debug;

use crate::config;
use crate::history::StateHistoryRing;
use crate::match_engine::state::GameState;
use crate::model::player::PlayerInput;
use crate::model::projectile::Projectile;
use crate::physics;

const MUZZLE_OFFSET: f64 = 30.0;

/// Attempt to fire on behalf of `shooter_id`. Silently does nothing if
/// the shooter is dead or still on cooldown (SPEC_FULL.md 4.3). On
/// success, spawns the projectile at the historical shooter position
/// and fast-forwards it through `min(now - client_timestamp, lag
/// budget)` worth of ticks against the *current* player map, so any
/// hit lands on the present-day victim.
pub fn try_fire(state: &mut GameState, history: &StateHistoryRing, shooter_id: &str, input: &PlayerInput, now_ms: u64) {
    let Some(shooter) = state.players.get(shooter_id) else { return };
    if !shooter.can_fire(now_ms) {
        return;
    }
    let weapon = shooter.weapon;
    let damage = shooter.current_damage();

    let historical = history.state_at(input.client_timestamp_ms, state);
    let Some(historical_shooter) = historical.players.get(shooter_id) else { return };
    let stats = weapon.base_stats();
    let angle = historical_shooter.turret_rotation;
    let spawn_x = historical_shooter.x + angle.cos() * MUZZLE_OFFSET;
    let spawn_y = historical_shooter.y + angle.sin() * MUZZLE_OFFSET;
    let vx = angle.cos() * stats.speed;
    let vy = angle.sin() * stats.speed;

    let id = state.next_projectile_id();
    let mut projectile = Projectile {
        id,
        owner_id: shooter_id.to_string(),
        weapon,
        x: spawn_x,
        y: spawn_y,
        vx,
        vy,
        damage,
        spawn_x,
        spawn_y,
        spawn_timestamp_ms: input.client_timestamp_ms,
        max_range: stats.range,
        spawn_tick: state.tick,
    };

    if let Some(s) = state.players.get_mut(shooter_id) {
        s.last_fire_ms = now_ms;
    }

    let rewind_ms = now_ms.saturating_sub(input.client_timestamp_ms).min(config::LAG_BUDGET_MS);
    let fast_forward_ticks = (rewind_ms as f64 / config::TICK_INTERVAL_MS as f64).round() as u32;
    debug!(shooter_id, fast_forward_ticks, "lag-compensated fire");

    let mut consumed = false;
    for _ in 0..fast_forward_ticks {
        projectile.advance_one_tick();
        if projectile.out_of_range() {
            consumed = true;
            break;
        }
        if let Some(victim_id) = find_current_hit(state, &projectile) {
            apply_projectile_hit(state, &projectile, &victim_id);
            consumed = true;
            break;
        }
    }

    if !consumed {
        state.projectiles.insert(projectile.id.clone(), projectile);
    }
}

/// Find a living, non-owner player whose circle overlaps the
/// projectile at its current position, against the *current* map.
fn find_current_hit(state: &GameState, projectile: &Projectile) -> Option<String> {
    state
        .players
        .values()
        .find(|p| {
            p.alive
                && p.id != projectile.owner_id
                && physics::circles_overlap(
                    projectile.x,
                    projectile.y,
                    p.x,
                    p.y,
                    config::PLAYER_RADIUS + config::PROJECTILE_RADIUS,
                )
        })
        .map(|p| p.id.clone())
}

pub fn apply_projectile_hit(state: &mut GameState, projectile: &Projectile, victim_id: &str) {
    let damage = projectile.damage;
    if let Some(victim) = state.players.get_mut(victim_id) {
        let died = victim.apply_damage(damage);
        if let Some(shooter) = state.players.get_mut(&projectile.owner_id) {
            shooter.damage_dealt += damage;
            if died {
                shooter.kills += 1;
            }
        }
        if died {
            crate::match_engine::lifecycle::mark_death(state, victim_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::player::{Player, Weapon};

    fn make_input(timestamp_ms: u64, angle: f64) -> PlayerInput {
        PlayerInput {
            owner_id: "a".into(),
            declared_tick: 0,
            client_timestamp_ms: timestamp_ms,
            up: false,
            down: false,
            left: false,
            right: false,
            aim_angle: angle,
            shoot: true,
            interact: false,
        }
    }

    #[test]
    fn fire_rejected_when_dead() {
        let mut state = GameState::new("m1".into());
        let mut shooter = Player::new("a".into(), "A".into(), 0.0, 0.0);
        shooter.apply_damage(1000.0);
        state.players.insert("a".into(), shooter);
        let history = StateHistoryRing::new();
        try_fire(&mut state, &history, "a", &make_input(0, 0.0), 0);
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn lag_compensated_spawn_uses_historical_position() {
        // Scenario 3: shooter's current pos (300,300); at client
        // timestamp 100ms ago it was at (100,100) facing angle 0.
        let mut state = GameState::new("m1".into());
        state.players.insert("a".into(), Player::new("a".into(), "A".into(), 300.0, 300.0));
        state.players.get_mut("a").unwrap().weapon = Weapon::Rifle;

        let mut history = StateHistoryRing::new();
        let mut historical = GameState::new("m1".into());
        let mut historical_player = Player::new("a".into(), "A".into(), 100.0, 100.0);
        historical_player.turret_rotation = 0.0;
        historical.players.insert("a".into(), historical_player);
        history.push(0, historical);

        try_fire(&mut state, &history, "a", &make_input(0, 0.0), 100);

        // No victim present, so the projectile should survive and sit
        // near the historical spawn point plus a few ticks of travel.
        assert_eq!(state.projectiles.len(), 1);
        let proj = state.projectiles.values().next().unwrap();
        assert!(proj.x > 100.0 && proj.x < 300.0, "spawn should be near historical position, got {}", proj.x);
        assert!((proj.y - 100.0).abs() < 1.0);
    }

    #[test]
    fn two_player_dodge_and_hit_scenario() {
        // Scenario 1: A at (100,500) facing +X with rifle fires at B
        // (300,500) stationary; B's health should drop within 25 ticks
        // of forward simulation once the shot is in the live state.
        let mut state = GameState::new("m1".into());
        let mut a = Player::new("a".into(), "A".into(), 100.0, 500.0);
        a.weapon = Weapon::Rifle;
        a.turret_rotation = 0.0;
        state.players.insert("a".into(), a);
        state.players.insert("b".into(), Player::new("b".into(), "B".into(), 300.0, 500.0));

        let history = StateHistoryRing::new(); // empty -> falls back to live
        try_fire(&mut state, &history, "a", &make_input(0, 0.0), 0);
        assert_eq!(state.projectiles.len(), 1);
        let proj = state.projectiles.values().next().unwrap();
        assert!((proj.x - 130.0).abs() < 1e-9, "spawn should sit ~30 units ahead of the shooter, got {}", proj.x);
        assert_eq!(proj.y, 500.0);

        let mut hit = false;
        for _ in 0..25 {
            let mut to_remove = Vec::new();
            for proj in state.projectiles.values_mut() {
                proj.advance_one_tick();
            }
            let ids: Vec<String> = state.projectiles.keys().cloned().collect();
            for id in ids {
                let proj = state.projectiles.get(&id).unwrap().clone();
                if let Some(victim) = find_current_hit(&state, &proj) {
                    apply_projectile_hit(&mut state, &proj, &victim);
                    to_remove.push(id);
                    hit = true;
                }
            }
            for id in to_remove {
                state.projectiles.remove(&id);
            }
            if hit {
                break;
            }
        }
        assert!(hit, "B should have been hit within 25 ticks");
        assert!(state.players["b"].health < 100.0);
    }
}
