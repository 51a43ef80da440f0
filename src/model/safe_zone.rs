//! Shrinking safe zone. Mutated only by the tick loop.

use crate::config;

#[derive(Debug, Clone)]
pub struct SafeZone {
    pub center_x: f64,
    pub center_y: f64,
    pub current_radius: f64,
    pub target_radius: f64,
    pub is_shrinking: bool,
}

impl SafeZone {
    pub fn new(center_x: f64, center_y: f64) -> Self {
        Self {
            center_x,
            center_y,
            current_radius: config::ZONE_INITIAL_RADIUS,
            target_radius: config::ZONE_MIN_RADIUS,
            is_shrinking: false,
        }
    }

    /// Advance the zone schedule by one tick. `elapsed_secs` is the
    /// total match elapsed time, measured from match start.
    pub fn tick(&mut self, elapsed_secs: f64) {
        let grace = config::ZONE_GRACE_PERIOD_SECS as f64;
        let shrink_duration = config::ZONE_SHRINK_DURATION_SECS as f64;

        if elapsed_secs < grace {
            self.is_shrinking = false;
            return;
        }

        let shrink_elapsed = (elapsed_secs - grace).min(shrink_duration);
        let fraction = shrink_elapsed / shrink_duration;
        self.is_shrinking = fraction < 1.0;
        self.current_radius =
            config::ZONE_INITIAL_RADIUS + (self.target_radius - config::ZONE_INITIAL_RADIUS) * fraction;
    }

    pub fn distance_outside(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.center_x;
        let dy = y - self.center_y;
        let dist = (dx * dx + dy * dy).sqrt();
        (dist - self.current_radius).max(0.0)
    }

    pub fn is_outside(&self, x: f64, y: f64) -> bool {
        self.distance_outside(x, y) > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_inactive_during_grace_period() {
        let mut zone = SafeZone::new(0.0, 0.0);
        zone.tick(60.0);
        assert!(!zone.is_shrinking);
        assert_eq!(zone.current_radius, config::ZONE_INITIAL_RADIUS);
    }

    #[test]
    fn zone_shrinks_linearly_after_grace() {
        let mut zone = SafeZone::new(0.0, 0.0);
        // One shrink-duration minute (60s) into the 180s shrink window.
        zone.tick(config::ZONE_GRACE_PERIOD_SECS as f64 + 60.0);
        let expected_fraction = 60.0 / config::ZONE_SHRINK_DURATION_SECS as f64;
        let expected = config::ZONE_INITIAL_RADIUS
            + (config::ZONE_MIN_RADIUS - config::ZONE_INITIAL_RADIUS) * expected_fraction;
        assert!((zone.current_radius - expected).abs() < 1e-6);
        assert!(zone.is_shrinking);
    }

    #[test]
    fn zone_reaches_minimum_radius_after_full_shrink() {
        let mut zone = SafeZone::new(0.0, 0.0);
        let full = config::ZONE_GRACE_PERIOD_SECS as f64 + config::ZONE_SHRINK_DURATION_SECS as f64 + 10.0;
        zone.tick(full);
        assert_eq!(zone.current_radius, config::ZONE_MIN_RADIUS);
        assert!(!zone.is_shrinking);
    }

    #[test]
    fn outside_player_takes_no_damage_once_inside() {
        let mut zone = SafeZone::new(0.0, 0.0);
        zone.tick(200.0);
        assert!(!zone.is_outside(0.0, 0.0));
    }
}
