//! Scripted input for headless runs
//!
//! Flees the nearest swarm agent, matches its color and shoots at it.
//! Buttons are tapped on alternate frames so every press is a fresh edge.

use swarm_survival_core::game::entity::{palette_index, Entity};
use swarm_survival_core::game::input::{Button, InputState, Key};
use swarm_survival_core::game::state::World;
use swarm_survival_core::util::vec2::Vec2;

/// Agents closer than this trigger evasive movement
const FLEE_RADIUS: f32 = 220.0;

#[derive(Debug, Default)]
pub struct Autopilot {
    input: InputState,
    frame: u64,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input for the next frame
    pub fn next_input(&mut self, world: &World) -> &InputState {
        self.frame += 1;
        let tap = self.frame % 2 == 0;

        let Some(player) = world.player() else {
            self.input.update(&[], &[], Vec2::ZERO);
            return &self.input;
        };

        let mut keys = Vec::new();
        let mut buttons = Vec::new();
        let mut pointer = self.input.pointer();

        if let Some(target) = nearest_agent(world, player.position) {
            pointer = target.position;

            let away = player.position - target.position;
            if away.length() < FLEE_RADIUS {
                if away.x < -1.0 {
                    keys.push(Key::Left);
                } else if away.x > 1.0 {
                    keys.push(Key::Right);
                }
                if away.y < -1.0 {
                    keys.push(Key::Up);
                } else if away.y > 1.0 {
                    keys.push(Key::Down);
                }
            }

            let matching = palette_index(&player.color) == palette_index(&target.color);
            if tap {
                if matching {
                    buttons.push(Button::Primary);
                } else {
                    keys.push(Key::Cycle);
                }
            }
        }

        self.input.update(&keys, &buttons, pointer);
        &self.input
    }
}

fn nearest_agent(world: &World, from: Vec2) -> Option<&Entity> {
    world
        .swarm_indices()
        .into_iter()
        .map(|i| &world.entities()[i])
        .min_by(|a, b| {
            from.distance_to(a.position)
                .total_cmp(&from.distance_to(b.position))
        })
}
