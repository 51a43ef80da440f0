//! Static (and optionally destructible) map geometry. Populated by the
//! map generator at match start.

#[derive(Debug, Clone)]
pub struct Obstacle {
    pub id: u32,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub is_static: bool,
    pub hit_points: f64,
}

impl Obstacle {
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Expand the AABB by `radius` on every side, used for player-obstacle
    /// collision so a circular player can be tested as a point.
    pub fn expanded(&self, radius: f64) -> Obstacle {
        Obstacle {
            id: self.id,
            min_x: self.min_x - radius,
            min_y: self.min_y - radius,
            max_x: self.max_x + radius,
            max_y: self.max_y + radius,
            is_static: self.is_static,
            hit_points: self.hit_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expanded_obstacle_grows_by_radius() {
        let obstacle = Obstacle { id: 1, min_x: 0.0, min_y: 0.0, max_x: 100.0, max_y: 100.0, is_static: true, hit_points: 0.0 };
        let expanded = obstacle.expanded(20.0);
        assert_eq!(expanded.min_x, -20.0);
        assert_eq!(expanded.max_x, 120.0);
        assert!(expanded.contains_point(-10.0, 50.0));
        assert!(!obstacle.contains_point(-10.0, 50.0));
    }
}
