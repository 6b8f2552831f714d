use crate::flock::FlockCommand;
use crate::vector::Vector2D;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Secondary,
    Other,
}

/// Pointer input in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    MouseDrag { at: Vector2D, button: MouseButton },
    /// `first` is the first active touch; `touches` counts all of them
    TouchMove { first: Vector2D, touches: usize },
    TouchEnd,
}

/// Turns drags into spawn and erase requests.
///
/// Primary drag spawns, secondary drag erases. On touch screens one finger
/// spawns and two fingers erase; once a two-finger erase begins, spawning
/// stays off until the touch ends so lifting one finger does not paint birds.
#[derive(Debug, Clone)]
pub struct GestureTracker {
    erase_radius: f32,
    erasing: bool,
}

impl GestureTracker {
    pub fn new(erase_radius: f32) -> Self {
        Self {
            erase_radius,
            erasing: false,
        }
    }

    pub fn is_erasing(&self) -> bool {
        self.erasing
    }

    pub fn handle(&mut self, event: PointerEvent) -> Option<FlockCommand> {
        match event {
            PointerEvent::MouseDrag { at, button } => match button {
                MouseButton::Primary => Some(FlockCommand::Spawn { at }),
                MouseButton::Secondary => Some(FlockCommand::Erase {
                    at,
                    radius: self.erase_radius,
                }),
                MouseButton::Other => None,
            },
            PointerEvent::TouchMove { first, touches } => {
                if touches == 2 {
                    self.erasing = true;
                    Some(FlockCommand::Erase {
                        at: first,
                        radius: self.erase_radius,
                    })
                } else if touches == 1 && !self.erasing {
                    Some(FlockCommand::Spawn { at: first })
                } else {
                    None
                }
            }
            PointerEvent::TouchEnd => {
                self.erasing = false;
                None
            }
        }
    }
}
