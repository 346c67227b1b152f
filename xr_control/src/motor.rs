//! Motor-bus collaborator interface.
//!
//! The control core never talks to a bus directly. Each subsystem owns its
//! motors through this trait; a driver crate or the simulator provides it.

/// One actuated motor.
pub trait Motor: Send {
    /// Latch the most recent feedback from the bus.
    fn update(&mut self);
    /// Shaft speed at the last `update` [rpm].
    fn speed(&self) -> f32;
    /// Encoder angle at the last `update` [rad, 0..2π].
    fn angle(&self) -> f32;
    /// Command a normalized output in `[-1, 1]`.
    fn control(&mut self, output: f32);
    /// Release the motor (no holding torque).
    fn relax(&mut self);
}

impl<M: Motor + ?Sized> Motor for Box<M> {
    fn update(&mut self) {
        (**self).update()
    }
    fn speed(&self) -> f32 {
        (**self).speed()
    }
    fn angle(&self) -> f32 {
        (**self).angle()
    }
    fn control(&mut self, output: f32) {
        (**self).control(output)
    }
    fn relax(&mut self) {
        (**self).relax()
    }
}
