use shared::{
    PlayerState, ShipClass, FULL_HEALTH, SHIP_DRAG, SHIP_MAX_SPEED, SHIP_THRUST, SHIP_TURN_RATE,
    WORLD_HEIGHT, WORLD_WIDTH,
};

/// Movement keys sampled for one simulation tick.
#[derive(Debug, Clone, Default)]
pub struct ShipInput {
    pub left: bool,
    pub right: bool,
    pub thrust: bool,
}

/// The local player's ship. This is the authoritative copy of our own
/// state; nothing received from the network ever writes to it.
#[derive(Debug, Clone)]
pub struct LocalShip {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub ship: ShipClass,
    pub health: u32,
}

impl LocalShip {
    pub fn spawn(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            angle: 0.0,
            vel_x: 0.0,
            vel_y: 0.0,
            ship: ShipClass::default(),
            health: FULL_HEALTH,
        }
    }

    pub fn apply_input(&mut self, input: &ShipInput, dt: f32) {
        if input.left {
            self.angle -= SHIP_TURN_RATE * dt;
        }
        if input.right {
            self.angle += SHIP_TURN_RATE * dt;
        }
        if input.thrust {
            self.vel_x += self.angle.cos() * SHIP_THRUST * dt;
            self.vel_y += self.angle.sin() * SHIP_THRUST * dt;
        }
    }

    pub fn integrate(&mut self, dt: f32) {
        let damping = (1.0 - SHIP_DRAG * dt).max(0.0);
        self.vel_x *= damping;
        self.vel_y *= damping;

        let speed = (self.vel_x * self.vel_x + self.vel_y * self.vel_y).sqrt();
        if speed > SHIP_MAX_SPEED {
            let scale = SHIP_MAX_SPEED / speed;
            self.vel_x *= scale;
            self.vel_y *= scale;
        }

        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;

        // Flying off one edge comes back on the opposite one.
        self.x = self.x.rem_euclid(WORLD_WIDTH);
        self.y = self.y.rem_euclid(WORLD_HEIGHT);
    }

    pub fn set_class(&mut self, ship: ShipClass) {
        self.ship = ship;
    }

    /// The snapshot the publisher sends. A fresh value every call.
    pub fn state(&self) -> PlayerState {
        PlayerState::new(self.x, self.y, self.angle, self.ship, self.health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const DT: f32 = 1.0 / 20.0;

    #[test]
    fn test_spawn_defaults() {
        let ship = LocalShip::spawn(100.0, 200.0);
        assert_approx_eq!(ship.x, 100.0);
        assert_approx_eq!(ship.y, 200.0);
        assert_approx_eq!(ship.angle, 0.0);
        assert_eq!(ship.ship, ShipClass::Scout);
        assert_eq!(ship.health, FULL_HEALTH);
    }

    #[test]
    fn test_thrust_accelerates_along_heading() {
        let mut ship = LocalShip::spawn(100.0, 100.0);
        let input = ShipInput {
            thrust: true,
            ..Default::default()
        };

        ship.apply_input(&input, DT);

        // Heading 0 points along +x.
        assert!(ship.vel_x > 0.0);
        assert_approx_eq!(ship.vel_y, 0.0, 0.001);

        let x_before = ship.x;
        ship.integrate(DT);
        assert!(ship.x > x_before);
    }

    #[test]
    fn test_turn_directions() {
        let mut ship = LocalShip::spawn(0.0, 0.0);

        ship.apply_input(
            &ShipInput {
                left: true,
                ..Default::default()
            },
            DT,
        );
        assert!(ship.angle < 0.0);

        let mut ship = LocalShip::spawn(0.0, 0.0);
        ship.apply_input(
            &ShipInput {
                right: true,
                ..Default::default()
            },
            DT,
        );
        assert!(ship.angle > 0.0);
    }

    #[test]
    fn test_drag_slows_coasting_ship() {
        let mut ship = LocalShip::spawn(0.0, 0.0);
        ship.vel_x = 100.0;

        ship.integrate(DT);
        assert!(ship.vel_x < 100.0);
        assert!(ship.vel_x > 0.0);
    }

    #[test]
    fn test_speed_is_capped() {
        let mut ship = LocalShip::spawn(0.0, 0.0);
        ship.vel_x = SHIP_MAX_SPEED * 10.0;

        ship.integrate(DT);
        let speed = (ship.vel_x * ship.vel_x + ship.vel_y * ship.vel_y).sqrt();
        assert!(speed <= SHIP_MAX_SPEED + 0.001);
    }

    #[test]
    fn test_world_edges_wrap() {
        let mut ship = LocalShip::spawn(WORLD_WIDTH - 1.0, 1.0);
        ship.vel_x = 100.0;
        ship.vel_y = -100.0;

        ship.integrate(DT);

        assert!(ship.x < WORLD_WIDTH);
        assert!(ship.x >= 0.0);
        assert!(ship.y < WORLD_HEIGHT);
        assert!(ship.y >= 0.0);
    }

    #[test]
    fn test_state_mirrors_ship() {
        let mut ship = LocalShip::spawn(50.0, 60.0);
        ship.angle = 1.2;
        ship.set_class(ShipClass::Tank);
        ship.health = 73;

        let state = ship.state();
        assert_approx_eq!(state.x, 50.0);
        assert_approx_eq!(state.y, 60.0);
        assert_approx_eq!(state.angle, 1.2);
        assert_eq!(state.ship, ShipClass::Tank);
        assert_eq!(state.health, 73);
    }
}
