use boats_shared::FlockSettings;
use rand::Rng;

use crate::boat::{AudioBinding, Sprite};
use crate::boid::{Boid, BoidConfig, Bounds, EdgePolicy};
use crate::render::{DrawCommand, Renderer};
use crate::vector::Vector2D;

/// A flock member: the steering body plus optional audio and sprite parts
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub boid: Boid,
    pub binding: Option<AudioBinding>,
    pub sprite: Option<Sprite>,
}

impl Agent {
    pub fn draw_command(&self) -> DrawCommand {
        match self.sprite {
            Some(sprite) => DrawCommand::Sprite {
                position: self.boid.position,
                size: self.boid.size,
                image: sprite.image,
                flipped: sprite.flipped,
            },
            None => self.boid.draw_command(),
        }
    }
}

impl From<Boid> for Agent {
    fn from(boid: Boid) -> Self {
        Self {
            boid,
            binding: None,
            sprite: None,
        }
    }
}

/// Membership change requested between ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlockCommand {
    Spawn { at: Vector2D },
    Erase { at: Vector2D, radius: f32 },
}

/// Net effect of applying the pending commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Applied {
    pub added: usize,
    pub removed: usize,
    /// Spawns dropped because the flock was full
    pub refused: usize,
}

impl Applied {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.refused == 0
    }

    /// True when the membership actually changed; refusals alone do not count
    pub fn changed_population(&self) -> bool {
        self.added + self.removed > 0
    }
}

/// An owned collection of agents advanced together once per frame
#[derive(Debug, Clone)]
pub struct Flock {
    pub agents: Vec<Agent>,
    pub config: BoidConfig,
    pub edge_policy: EdgePolicy,
    pub max_population: Option<usize>,
    spawn: FlockSettings,
    pending: Vec<FlockCommand>,
}

impl Flock {
    pub fn new(config: BoidConfig, edge_policy: EdgePolicy) -> Self {
        Self {
            agents: Vec::new(),
            config,
            edge_policy,
            max_population: None,
            spawn: FlockSettings::default(),
            pending: Vec::new(),
        }
    }

    /// Flock whose spawned birds and steering follow `settings`
    pub fn from_settings(settings: &FlockSettings, edge_policy: EdgePolicy) -> Self {
        Self {
            max_population: settings.max_population,
            spawn: settings.clone(),
            ..Self::new(BoidConfig::from(settings), edge_policy)
        }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.max_population
            .map_or(false, |cap| self.agents.len() >= cap)
    }

    pub fn boids(&self) -> impl Iterator<Item = &Boid> {
        self.agents.iter().map(|agent| &agent.boid)
    }

    /// Append a plain boid. A full flock hands it back.
    pub fn add_boid(&mut self, boid: Boid) -> Result<(), Boid> {
        if self.is_full() {
            return Err(boid);
        }
        self.agents.push(boid.into());
        Ok(())
    }

    pub fn add_agent(&mut self, agent: Agent) -> Result<(), Agent> {
        if self.is_full() {
            return Err(agent);
        }
        self.agents.push(agent);
        Ok(())
    }

    /// Remove every member within `radius` of `at`, returning how many went
    pub fn erase_near(&mut self, at: Vector2D, radius: f32) -> usize {
        let before = self.agents.len();
        self.agents
            .retain(|agent| agent.boid.position.distance(&at) > radius);
        before - self.agents.len()
    }

    /// Boids by value, for building a neighbourhood that outlives this borrow
    pub fn snapshot(&self) -> Vec<Boid> {
        self.boids().copied().collect()
    }

    pub fn queue(&mut self, command: FlockCommand) {
        self.pending.push(command);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Apply queued membership changes in arrival order. Call between ticks only.
    pub fn apply_pending<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Applied {
        let mut applied = Applied::default();
        for command in std::mem::take(&mut self.pending) {
            match command {
                FlockCommand::Spawn { at } => {
                    let boid = Boid::spawn(at, &self.spawn, rng);
                    match self.add_boid(boid) {
                        Ok(()) => applied.added += 1,
                        Err(_) => applied.refused += 1,
                    }
                }
                FlockCommand::Erase { at, radius } => {
                    applied.removed += self.erase_near(at, radius);
                }
            }
        }
        if !applied.is_empty() {
            log::debug!(
                "flock membership: +{} -{} ({} refused), now {}",
                applied.added,
                applied.removed,
                applied.refused,
                self.agents.len()
            );
        }
        applied
    }

    /// Advance every member one frame against `neighbors`, which must be a
    /// snapshot taken before this call (usually every flock's members combined)
    pub fn run(&mut self, neighbors: &[Boid], bounds: Bounds) {
        for agent in self.agents.iter_mut() {
            agent.boid.run(neighbors, &self.config, bounds, self.edge_policy);
        }
    }

    /// Advance against this flock's own membership only
    pub fn run_alone(&mut self, bounds: Bounds) {
        let neighbors = self.snapshot();
        self.run(&neighbors, bounds);
    }

    pub fn render(&self, renderer: &mut dyn Renderer) {
        for agent in &self.agents {
            renderer.draw(&agent.draw_command());
        }
    }
}
