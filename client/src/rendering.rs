use crate::game::LocalShip;
use macroquad::prelude::*;
use shared::{ChatMessage, PeerId, PlayerState, ShipClass, FULL_HEALTH};
use std::collections::HashMap;

/// Draw styling for one ship archetype. The set is closed: every
/// `ShipClass` resolves to exactly one style through [`ship_style`].
pub struct ShipStyle {
    pub name: &'static str,
    pub color: Color,
    pub shape: &'static [(f32, f32)],
}

pub fn ship_style(class: ShipClass) -> ShipStyle {
    match class {
        ShipClass::Scout => ShipStyle {
            name: "Scout",
            color: Color::from_rgba(51, 255, 51, 255),
            shape: &[(18.0, 0.0), (-14.0, -12.0), (-14.0, 12.0)],
        },
        ShipClass::Sniper => ShipStyle {
            name: "Sniper",
            color: Color::from_rgba(0, 255, 136, 255),
            shape: &[(20.0, 0.0), (-10.0, -8.0), (-5.0, 0.0), (-10.0, 8.0)],
        },
        ShipClass::Tank => ShipStyle {
            name: "Tank",
            color: Color::from_rgba(255, 136, 0, 255),
            shape: &[(14.0, 0.0), (-12.0, -16.0), (-18.0, 0.0), (-12.0, 16.0)],
        },
        ShipClass::Interceptor => ShipStyle {
            name: "Interceptor",
            color: Color::from_rgba(0, 204, 255, 255),
            shape: &[(22.0, 0.0), (-8.0, -10.0), (-14.0, 0.0), (-8.0, 10.0)],
        },
    }
}

#[derive(Debug)]
pub struct HudConfig<'a> {
    pub connected: bool,
    pub player_id: Option<&'a PeerId>,
    pub room: &'a str,
    pub peer_count: usize,
    pub chat: &'a [ChatMessage],
}

pub struct Renderer {
    width: f32,
    height: f32,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Renderer {
            width: width as f32,
            height: height as f32,
        })
    }

    /// Draws one frame from a point-in-time room snapshot. Reads only;
    /// the snapshot is already detached from the store.
    pub fn render(
        &mut self,
        local: Option<&LocalShip>,
        remote: &HashMap<PeerId, PlayerState>,
        hud: HudConfig,
    ) {
        clear_background(Color::from_rgba(10, 10, 26, 255));

        for (player_id, state) in remote {
            self.draw_ship(state.x, state.y, state.angle, state.ship, false);
            self.draw_health_bar(state.x, state.y, state.health);
            self.draw_peer_label(state.x, state.y, player_id);
        }

        if let Some(ship) = local {
            self.draw_ship(ship.x, ship.y, ship.angle, ship.ship, true);
        }

        self.draw_hud(local, hud);
    }

    fn draw_ship(&self, x: f32, y: f32, angle: f32, class: ShipClass, is_local: bool) {
        let style = ship_style(class);
        let (sin, cos) = angle.sin_cos();
        let points: Vec<Vec2> = style
            .shape
            .iter()
            .map(|(px, py)| vec2(x + px * cos - py * sin, y + px * sin + py * cos))
            .collect();

        for i in 1..points.len() - 1 {
            draw_triangle(points[0], points[i], points[i + 1], style.color);
        }

        let outline = if is_local {
            WHITE
        } else {
            Color::from_rgba(255, 255, 255, 90)
        };
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            draw_line(a.x, a.y, b.x, b.y, 1.0, outline);
        }
    }

    fn draw_health_bar(&self, x: f32, y: f32, health: u32) {
        let bar_width = 40.0;
        let bar_height = 5.0;
        let fraction = (health.min(FULL_HEALTH) as f32) / FULL_HEALTH as f32;

        let bar_x = x - bar_width / 2.0;
        let bar_y = y - 30.0;

        draw_rectangle(
            bar_x,
            bar_y,
            bar_width,
            bar_height,
            Color::from_rgba(51, 51, 51, 255),
        );
        draw_rectangle(
            bar_x,
            bar_y,
            bar_width * fraction,
            bar_height,
            Color::from_rgba(51, 255, 51, 255),
        );
    }

    fn draw_peer_label(&self, x: f32, y: f32, player_id: &PeerId) {
        let short: String = player_id.as_str().chars().take(4).collect();
        draw_text(&short, x - 14.0, y - 34.0, 14.0, WHITE);
    }

    fn draw_hud(&self, local: Option<&LocalShip>, hud: HudConfig) {
        let connection_color = if hud.connected { GREEN } else { RED };
        draw_rectangle(10.0, 10.0, 8.0, 8.0, connection_color);

        let id_text = match hud.player_id {
            Some(id) => format!("room '{}' as {}", hud.room, id),
            None => format!("room '{}' (connecting...)", hud.room),
        };
        draw_text(&id_text, 24.0, 18.0, 14.0, WHITE);

        let peer_text = format!("{} peers", hud.peer_count);
        draw_text(&peer_text, self.width - 70.0, 18.0, 14.0, WHITE);

        if let Some(ship) = local {
            let style = ship_style(ship.ship);
            draw_text(style.name, 10.0, 50.0, 14.0, style.color);
        }

        let mut line_y = self.height - 12.0;
        for message in hud.chat.iter().rev() {
            let sender: String = message.sender.as_str().chars().take(4).collect();
            let mut line = format!("{}: {}", sender, message.text);
            if !message.reactions.is_empty() {
                let total: usize = message.reactions.values().map(Vec::len).sum();
                line.push_str(&format!(" (+{})", total));
            }
            draw_text(&line, 10.0, line_y, 14.0, Color::from_rgba(200, 200, 200, 255));
            line_y -= 16.0;
        }
    }
}
