//! The nine-step per-tick pipeline (SPEC_FULL.md section 4.1).

use rand::Rng;

use crate::config;
use crate::history::StateHistoryRing;
use crate::match_engine::state::GameState;
use crate::model::player::PlayerInput;
use crate::physics;
use crate::weapon;

/// Runs one tick. Returns `true` if the win condition is met this tick.
pub fn run_tick(
    state: &mut GameState,
    history: &StateHistoryRing,
    inputs: Vec<PlayerInput>,
    now_ms: u64,
    elapsed_secs: f64,
    rng: &mut impl Rng,
) -> bool {
    // (0) Remove crates opened on the previous tick, so the tick where a
    // crate is opened still broadcasts it with opened = true.
    for id in std::mem::take(&mut state.pending_crate_removals) {
        state.crates.remove(&id);
    }

    // (1) Drain inputs: fire/interact apply immediately; movement is cached.
    for input in inputs {
        let owner = input.owner_id.clone();
        if input.shoot {
            weapon::try_fire(state, history, &owner, &input, now_ms);
        }
        if input.interact {
            try_collect_crate(state, &owner, rng);
        }
        if let Some(p) = state.players.get_mut(&owner) {
            p.last_input = Some(input);
        }
    }

    // (2) Advance movement for every alive player.
    let obstacles = state.obstacles.clone();
    for player in state.players.values_mut() {
        if player.alive {
            physics::advance_player(player, &obstacles);
        }
    }

    // (3) Player-player push-apart.
    resolve_player_collisions(state);

    // (4) Advance projectiles, retire expired/out-of-range.
    let mut expired = Vec::new();
    let current_tick = state.tick;
    for projectile in state.projectiles.values_mut() {
        projectile.advance_one_tick();
        if projectile.out_of_range() || projectile.expired(current_tick) {
            expired.push(projectile.id.clone());
        }
    }
    for id in &expired {
        state.projectiles.remove(id);
    }

    // (5) Projectile-player / projectile-obstacle collisions.
    resolve_projectile_collisions(state);

    // (6) Safe zone update + tick damage.
    state.safe_zone.tick(elapsed_secs);
    apply_zone_damage(state);

    // (7) Win condition.
    let win = state.alive_count() <= 1 || elapsed_secs >= config::MATCH_HARD_CAP_SECS as f64;

    state.tick += 1;
    win
}

fn resolve_player_collisions(state: &mut GameState) {
    let ids: Vec<String> = state.players.values().filter(|p| p.alive).map(|p| p.id.clone()).collect();
    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            let (ax, ay) = {
                let p = &state.players[&ids[i]];
                (p.x, p.y)
            };
            let (bx, by) = {
                let p = &state.players[&ids[j]];
                (p.x, p.y)
            };
            if let Some((dax, day, dbx, dby)) = physics::resolve_player_overlap(ax, ay, bx, by) {
                if let Some(p) = state.players.get_mut(&ids[i]) {
                    p.x += dax;
                    p.y += day;
                }
                if let Some(p) = state.players.get_mut(&ids[j]) {
                    p.x += dbx;
                    p.y += dby;
                }
            }
        }
    }
}

fn resolve_projectile_collisions(state: &mut GameState) {
    let projectile_ids: Vec<String> = state.projectiles.keys().cloned().collect();
    for pid in projectile_ids {
        let Some(projectile) = state.projectiles.get(&pid).cloned() else { continue };

        let victim = state.players.values().find(|p| {
            p.alive
                && p.id != projectile.owner_id
                && physics::circles_overlap(
                    projectile.x,
                    projectile.y,
                    p.x,
                    p.y,
                    config::PLAYER_RADIUS + config::PROJECTILE_RADIUS,
                )
        }).map(|p| p.id.clone());

        if let Some(victim_id) = victim {
            weapon::apply_projectile_hit(state, &projectile, &victim_id);
            state.projectiles.remove(&pid);
            continue;
        }

        if state.obstacles.iter().any(|o| o.contains_point(projectile.x, projectile.y)) {
            state.projectiles.remove(&pid);
        }
    }
}

fn apply_zone_damage(state: &mut GameState) {
    let zone = state.safe_zone.clone();
    let dead: Vec<String> = state
        .players
        .values_mut()
        .filter(|p| p.alive && zone.is_outside(p.x, p.y))
        .filter_map(|p| {
            if p.apply_damage(config::ZONE_DAMAGE_PER_TICK) {
                Some(p.id.clone())
            } else {
                None
            }
        })
        .collect();
    for id in dead {
        crate::match_engine::lifecycle::mark_death(state, &id);
    }
}

fn try_collect_crate(state: &mut GameState, player_id: &str, rng: &mut impl Rng) {
    let Some(player) = state.players.get(player_id) else { return };
    let (px, py) = (player.x, player.y);
    let nearby_crate_id = state
        .crates
        .values()
        .find(|c| !c.opened && physics::circles_overlap(px, py, c.x, c.y, config::PLAYER_RADIUS + 20.0))
        .map(|c| c.id.clone());

    let Some(crate_id) = nearby_crate_id else { return };
    let loot = {
        let c = state.crates.get_mut(&crate_id).unwrap();
        c.open(rng)
    };
    // opened -> removed at the start of next tick, so this tick's
    // broadcast still shows it opened (SPEC_FULL.md section 3).
    state.pending_crate_removals.push(crate_id);
    apply_loot(state, player_id, &loot.kind);
    state.loot.remove(&loot.id);
}

fn apply_loot(state: &mut GameState, player_id: &str, kind: &crate::model::loot::LootKind) {
    use crate::model::loot::LootKind;
    let Some(player) = state.players.get_mut(player_id) else { return };
    match kind {
        LootKind::Shield => player.add_shield_stack(),
        LootKind::DamageBoost => player.add_damage_stack(),
        LootKind::FireRateBoost => player.add_fire_rate_stack(),
        LootKind::Ammo | LootKind::WeaponUpgrade => {} // consumed client-side / cosmetic in this core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::obstacle::Obstacle;
    use crate::model::player::{Player, Weapon};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn shotgun_expires_without_collision_at_tick_fifty() {
        // Scenario 2: shooter at (0,0) facing +X, shotgun range 400 speed 8.
        let mut state = GameState::new("m1".into());
        let mut shooter = Player::new("a".into(), "A".into(), 0.0, 0.0);
        shooter.weapon = Weapon::Shotgun;
        shooter.turret_rotation = 0.0;
        state.players.insert("a".into(), shooter);
        let history = StateHistoryRing::new();
        let input = crate::model::player::PlayerInput {
            owner_id: "a".into(),
            declared_tick: 0,
            client_timestamp_ms: 0,
            up: false,
            down: false,
            left: false,
            right: false,
            aim_angle: 0.0,
            shoot: true,
            interact: false,
        };
        weapon::try_fire(&mut state, &history, "a", &input, 0);
        assert_eq!(state.projectiles.len(), 1);

        let mut rng = StdRng::seed_from_u64(1);
        for t in 1..=50 {
            run_tick(&mut state, &history, vec![], t * 33, t as f64 * 0.033, &mut rng);
        }
        assert!(state.projectiles.is_empty(), "projectile should be gone by tick 50");
    }

    #[test]
    fn obstacle_collision_removes_projectile() {
        let mut state = GameState::new("m1".into());
        state.obstacles.push(Obstacle { id: 1, min_x: 50.0, min_y: -50.0, max_x: 150.0, max_y: 50.0, is_static: true, hit_points: 0.0 });
        let mut shooter = Player::new("a".into(), "A".into(), 0.0, 0.0);
        shooter.weapon = Weapon::Sniper;
        state.players.insert("a".into(), shooter);
        let history = StateHistoryRing::new();
        let input = crate::model::player::PlayerInput {
            owner_id: "a".into(), declared_tick: 0, client_timestamp_ms: 0,
            up: false, down: false, left: false, right: false,
            aim_angle: 0.0, shoot: true, interact: false,
        };
        weapon::try_fire(&mut state, &history, "a", &input, 0);
        let mut rng = StdRng::seed_from_u64(1);
        for t in 1..=10 {
            run_tick(&mut state, &history, vec![], t * 33, t as f64 * 0.033, &mut rng);
        }
        assert!(state.projectiles.is_empty());
    }
}
