//! Movement and collision primitives shared by the tick pipeline.
//! Dead players are skipped by callers before any of these run.

use crate::config;
use crate::model::obstacle::Obstacle;
use crate::model::player::{Player, PlayerInput};

pub const MOVE_SPEED: f64 = 5.0; // units/tick

/// Desired velocity from input flags, normalized so diagonal movement
/// equals cardinal speed.
pub fn desired_velocity(input: &PlayerInput) -> (f64, f64) {
    let mut dx = 0.0;
    let mut dy = 0.0;
    if input.up {
        dy -= 1.0;
    }
    if input.down {
        dy += 1.0;
    }
    if input.left {
        dx -= 1.0;
    }
    if input.right {
        dx += 1.0;
    }
    if dx == 0.0 && dy == 0.0 {
        return (0.0, 0.0);
    }
    let len = (dx * dx + dy * dy).sqrt();
    (dx / len * MOVE_SPEED, dy / len * MOVE_SPEED)
}

/// True if a player-radius circle centered at (x, y) overlaps `obstacle`.
pub fn collides_with_obstacle(x: f64, y: f64, obstacle: &Obstacle) -> bool {
    obstacle.expanded(config::PLAYER_RADIUS).contains_point(x, y)
}

fn collides_with_any(x: f64, y: f64, obstacles: &[Obstacle]) -> bool {
    obstacles.iter().any(|o| collides_with_obstacle(x, y, o))
    || x < config::PLAYER_RADIUS
    || y < config::PLAYER_RADIUS
    || x > config::MAP_WIDTH - config::PLAYER_RADIUS
    || y > config::MAP_HEIGHT - config::PLAYER_RADIUS
}

/// Advance one player by its cached input, resolving obstacle and
/// boundary collisions with axis-sliding: try the combined move, then
/// X-only, then Y-only; if all three collide, stay put.
pub fn advance_player(player: &mut Player, obstacles: &[Obstacle]) {
    let Some(input) = player.last_input.clone() else {
        return;
    };
    let (vx, vy) = desired_velocity(&input);
    player.vx = vx;
    player.vy = vy;
    player.turret_rotation = input.aim_angle;

    let (combined_x, combined_y) = (player.x + vx, player.y + vy);
    if !collides_with_any(combined_x, combined_y, obstacles) {
        player.x = combined_x;
        player.y = combined_y;
    } else if !collides_with_any(player.x + vx, player.y, obstacles) {
        player.x += vx;
    } else if !collides_with_any(player.x, player.y + vy, obstacles) {
        player.y += vy;
    }
    // else: both axes collide, velocity effectively zeroed this tick.

    if vx != 0.0 || vy != 0.0 {
        player.body_rotation = vy.atan2(vx);
    }
}

/// Symmetric push-apart for two overlapping player circles. Returns the
/// displacement to apply to each, split evenly.
pub fn resolve_player_overlap(ax: f64, ay: f64, bx: f64, by: f64) -> Option<(f64, f64, f64, f64)> {
    let dx = bx - ax;
    let dy = by - ay;
    let dist = (dx * dx + dy * dy).sqrt();
    let min_dist = 2.0 * config::PLAYER_RADIUS;
    if dist >= min_dist || dist == 0.0 {
        if dist == 0.0 {
            // Degenerate case: identical positions, push along +X.
            let overlap = min_dist / 2.0;
            return Some((-overlap, 0.0, overlap, 0.0));
        }
        return None;
    }
    let overlap = (min_dist - dist) / 2.0;
    let nx = dx / dist;
    let ny = dy / dist;
    Some((-nx * overlap, -ny * overlap, nx * overlap, ny * overlap))
}

pub fn circles_overlap(ax: f64, ay: f64, bx: f64, by: f64, combined_radius: f64) -> bool {
    let dx = bx - ax;
    let dy = by - ay;
    dx * dx + dy * dy <= combined_radius * combined_radius
}
