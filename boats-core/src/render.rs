use rand::Rng;

use crate::vector::Vector2D;

/// Display hue in `[0, 256)` degrees, drawn at full saturation and brightness
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hue(pub f32);

impl Hue {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Hue(rng.gen_range(0.0..256.0))
    }

    /// CSS colour string for canvas fills
    pub fn css(&self) -> String {
        format!("hsl({:.0}, 100%, 50%)", self.0)
    }
}

/// Handle into the preloaded image pool. The pool owns the bitmaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(pub usize);

/// One primitive for the renderer to draw this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    Triangle {
        position: Vector2D,
        /// Rotation in radians applied to a triangle whose tip points up
        heading: f32,
        size: f32,
        hue: Hue,
    },
    Sprite {
        position: Vector2D,
        size: f32,
        image: ImageId,
        /// Mirror horizontally
        flipped: bool,
    },
}

pub trait Renderer {
    fn clear(&mut self);
    fn draw(&mut self, command: &DrawCommand);
}

/// Renderer that keeps the commands of the last frame
#[derive(Debug, Default)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl Renderer for DrawList {
    fn clear(&mut self) {
        self.commands.clear();
    }

    fn draw(&mut self, command: &DrawCommand) {
        self.commands.push(*command);
    }
}
