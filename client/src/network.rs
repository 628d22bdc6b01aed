//! Client shell wiring the session, room tracker, publisher, chat log
//! and renderer into one cooperative loop
//!
//! Everything runs on one task: inbound events, the simulation tick and
//! the render tick interleave through `tokio::select!`, so each inbound
//! event's roster/state mutation completes before any render read.

use crate::chat::ChatLog;
use crate::game::LocalShip;
use crate::input::{ControlEvents, InputManager};
use crate::publisher::StatePublisher;
use crate::rendering::{HudConfig, Renderer};
use crate::room::RoomTracker;
use crate::session::{Event, Session};
use log::{info, warn};
use macroquad::window::next_frame;
use shared::{Packet, RENDER_TICK_MS, SIM_TICK_MS, WORLD_HEIGHT, WORLD_WIDTH};
use std::time::Duration;
use tokio::time::interval;

pub struct Client {
    session: Session,
    room: RoomTracker,
    chat: ChatLog,
    publisher: StatePublisher,
    input: InputManager,
    renderer: Renderer,
    ship: Option<LocalShip>,
    room_name: String,
    quit: bool,
}

impl Client {
    pub async fn new(
        relay_addr: &str,
        room_name: &str,
        width: usize,
        height: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = Session::bind(relay_addr).await?;
        let renderer = Renderer::new(width, height)?;

        Ok(Client {
            session,
            room: RoomTracker::new(),
            chat: ChatLog::new(),
            publisher: StatePublisher::new(),
            input: InputManager::new(),
            renderer,
            ship: None,
            room_name: room_name.to_string(),
            quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.session.connect().await;

        let mut sim_interval = interval(Duration::from_millis(SIM_TICK_MS));
        let mut render_interval = interval(Duration::from_millis(RENDER_TICK_MS));
        let mut buffer = [0u8; 2048];

        while !self.quit {
            tokio::select! {
                event = self.session.recv_event(&mut buffer) => {
                    if let Some(event) = event {
                        self.handle_event(event).await;
                    }
                },

                _ = sim_interval.tick() => {
                    self.simulation_tick().await;
                },

                _ = render_interval.tick() => {
                    self.render_tick().await;
                },
            }
        }

        // Best-effort goodbye; the relay's timeout sweep is the real
        // cleanup if these never arrive.
        self.leave_room().await;
        self.session.send(&Packet::Disconnect).await;

        Ok(())
    }

    /// Leaves the current room: flushes one last state so peers see the
    /// final position, announces the leave, and forgets every peer.
    async fn leave_room(&mut self) {
        if let Some(packet) = self.publisher.sample(self.ship.as_ref()) {
            self.session.send(&packet).await;
        }
        self.session.send(&Packet::Leave).await;
        self.room.clear();
    }

    async fn handle_event(&mut self, event: Event) {
        match event {
            Event::Connected { player_id } => {
                info!("Joining room '{}' as {}", self.room_name, player_id);
                if self.ship.is_none() {
                    self.ship = Some(LocalShip::spawn(WORLD_WIDTH / 2.0, WORLD_HEIGHT / 2.0));
                }
                self.session
                    .send(&Packet::Join {
                        room: self.room_name.clone(),
                    })
                    .await;
            }

            Event::Joined { players } => {
                self.room.apply_roster(&players, self.session.player_id());
            }

            Event::Left { player_id } => {
                self.room.remove_peer(&player_id);
            }

            Event::StateUpdate { player_id, state } => {
                self.room
                    .apply_state(player_id, state, self.session.player_id());
            }

            Event::Chat { message } => {
                self.chat.push(message);
            }

            Event::Reactions {
                message_id,
                reactions,
            } => {
                self.chat.apply_reactions(&message_id, reactions);
            }

            Event::Disconnected { reason } => {
                warn!("Connection lost: {}", reason);
                // The roster belonged to the dead identity. Press R to
                // come back as somebody new.
                self.room.clear();
            }
        }
    }

    async fn simulation_tick(&mut self) {
        let (events, ship_input) = self.input.update();
        self.handle_controls(events).await;

        let dt = SIM_TICK_MS as f32 / 1000.0;
        if let Some(ship) = self.ship.as_mut() {
            ship.apply_input(&ship_input, dt);
            ship.integrate(dt);
        }

        if let Some(packet) = self.publisher.sample(self.ship.as_ref()) {
            self.session.send(&packet).await;
        }
    }

    async fn handle_controls(&mut self, events: ControlEvents) {
        if events.quit {
            self.quit = true;
        }

        if events.reconnect {
            self.room.clear();
            self.session.connect().await;
        }

        if events.leave {
            self.leave_room().await;
        }

        if events.join {
            self.session
                .send(&Packet::Join {
                    room: self.room_name.clone(),
                })
                .await;
        }

        if let Some(class) = events.ship_class {
            if let Some(ship) = self.ship.as_mut() {
                ship.set_class(class);
            }
        }

        if let Some(text) = events.quick_chat {
            self.session
                .send(&Packet::Chat {
                    text: text.to_string(),
                })
                .await;
        }

        if events.react {
            if let Some(message) = self.chat.latest() {
                let packet = Packet::React {
                    message_id: message.id.clone(),
                    emoji: "\u{1f44d}".to_string(),
                };
                self.session.send(&packet).await;
            }
        }
    }

    async fn render_tick(&mut self) {
        let remote = self.room.snapshot();
        let hud = HudConfig {
            connected: self.session.is_connected(),
            player_id: self.session.player_id(),
            room: &self.room_name,
            peer_count: remote.len(),
            chat: self.chat.recent(4),
        };

        self.renderer.render(self.ship.as_ref(), &remote, hud);
        next_frame().await;
    }
}
