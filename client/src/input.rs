//! Client input sampling with edge detection for control keys

use crate::game::ShipInput;
use macroquad::prelude::*;
use shared::ShipClass;

/// One-shot control events for a tick, separate from held movement keys.
#[derive(Debug, Clone, Default)]
pub struct ControlEvents {
    pub quit: bool,
    pub reconnect: bool,
    pub leave: bool,
    pub join: bool,
    pub ship_class: Option<ShipClass>,
    pub quick_chat: Option<&'static str>,
    pub react: bool,
}

pub struct InputManager {
    // Previous frame key states for edge detection
    prev_key_1: bool,
    prev_key_2: bool,
    prev_key_3: bool,
    prev_key_4: bool,
    prev_key_r: bool,
    prev_key_l: bool,
    prev_key_j: bool,
    prev_key_h: bool,
    prev_key_g: bool,
    prev_key_e: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            prev_key_1: false,
            prev_key_2: false,
            prev_key_3: false,
            prev_key_4: false,
            prev_key_r: false,
            prev_key_l: false,
            prev_key_j: false,
            prev_key_h: false,
            prev_key_g: false,
            prev_key_e: false,
        }
    }

    /// Samples the keyboard once. Movement keys report their held state;
    /// everything else fires only on the press edge.
    pub fn update(&mut self) -> (ControlEvents, ShipInput) {
        // Movement (both WASD and arrows)
        let input = ShipInput {
            left: is_key_down(KeyCode::A) || is_key_down(KeyCode::Left),
            right: is_key_down(KeyCode::D) || is_key_down(KeyCode::Right),
            thrust: is_key_down(KeyCode::W) || is_key_down(KeyCode::Up),
        };

        let key_1 = is_key_down(KeyCode::Key1);
        let key_2 = is_key_down(KeyCode::Key2);
        let key_3 = is_key_down(KeyCode::Key3);
        let key_4 = is_key_down(KeyCode::Key4);
        let key_r = is_key_down(KeyCode::R);
        let key_l = is_key_down(KeyCode::L);
        let key_j = is_key_down(KeyCode::J);
        let key_h = is_key_down(KeyCode::H);
        let key_g = is_key_down(KeyCode::G);
        let key_e = is_key_down(KeyCode::E);

        let mut events = ControlEvents {
            quit: is_key_down(KeyCode::Escape),
            ..Default::default()
        };

        if key_1 && !self.prev_key_1 {
            events.ship_class = Some(ShipClass::Scout);
        }
        if key_2 && !self.prev_key_2 {
            events.ship_class = Some(ShipClass::Sniper);
        }
        if key_3 && !self.prev_key_3 {
            events.ship_class = Some(ShipClass::Tank);
        }
        if key_4 && !self.prev_key_4 {
            events.ship_class = Some(ShipClass::Interceptor);
        }
        if key_r && !self.prev_key_r {
            events.reconnect = true;
        }
        if key_l && !self.prev_key_l {
            events.leave = true;
        }
        if key_j && !self.prev_key_j {
            events.join = true;
        }
        if key_h && !self.prev_key_h {
            events.quick_chat = Some("hello!");
        }
        if key_g && !self.prev_key_g {
            events.quick_chat = Some("gg");
        }
        if key_e && !self.prev_key_e {
            events.react = true;
        }

        self.prev_key_1 = key_1;
        self.prev_key_2 = key_2;
        self.prev_key_3 = key_3;
        self.prev_key_4 = key_4;
        self.prev_key_r = key_r;
        self.prev_key_l = key_l;
        self.prev_key_j = key_j;
        self.prev_key_h = key_h;
        self.prev_key_g = key_g;
        self.prev_key_e = key_e;

        (events, input)
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
