//! Procedural map generation: obstacle placement, loot crates, and
//! spawn-circle assignment at match start.

use rand::Rng;

use crate::config;
use crate::model::loot::Crate;
use crate::model::obstacle::Obstacle;

const OBSTACLE_COUNT: usize = 12;
const CRATE_COUNT: usize = 10;
const OBSTACLE_SIZE: f64 = 150.0;

pub struct GeneratedMap {
    pub obstacles: Vec<Obstacle>,
    pub crates: Vec<Crate>,
}

pub fn generate(rng: &mut impl Rng) -> GeneratedMap {
    let mut obstacles = Vec::with_capacity(OBSTACLE_COUNT);
    for id in 0..OBSTACLE_COUNT as u32 {
        let min_x = rng.gen_range(0.0..config::MAP_WIDTH - OBSTACLE_SIZE);
        let min_y = rng.gen_range(0.0..config::MAP_HEIGHT - OBSTACLE_SIZE);
        obstacles.push(Obstacle {
            id,
            min_x,
            min_y,
            max_x: min_x + OBSTACLE_SIZE,
            max_y: min_y + OBSTACLE_SIZE,
            is_static: true,
            hit_points: 0.0,
        });
    }

    let mut crates = Vec::with_capacity(CRATE_COUNT);
    for i in 0..CRATE_COUNT {
        crates.push(Crate {
            id: format!("crate-{i}"),
            x: rng.gen_range(0.0..config::MAP_WIDTH),
            y: rng.gen_range(0.0..config::MAP_HEIGHT),
            opened: false,
        });
    }

    GeneratedMap { obstacles, crates }
}

/// Spawn positions on a circle centered on the map, with uniform
/// angular spacing for `player_count` players.
pub fn spawn_circle(player_count: usize) -> Vec<(f64, f64)> {
    let center_x = config::MAP_WIDTH / 2.0;
    let center_y = config::MAP_HEIGHT / 2.0;
    let radius = config::ZONE_INITIAL_RADIUS * 0.8;
    (0..player_count)
        .map(|i| {
            let angle = 2.0 * std::f64::consts::PI * i as f64 / player_count as f64;
            (center_x + radius * angle.cos(), center_y + radius * angle.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_circle_has_uniform_angular_spacing() {
        let points = spawn_circle(8);
        assert_eq!(points.len(), 8);
        let center = (config::MAP_WIDTH / 2.0, config::MAP_HEIGHT / 2.0);
        let radius = ((points[0].0 - center.0).powi(2) + (points[0].1 - center.1).powi(2)).sqrt();
        for (x, y) in &points {
            let r = ((x - center.0).powi(2) + (y - center.1).powi(2)).sqrt();
            assert!((r - radius).abs() < 1e-6);
        }
    }
}
