/// A 2-D position in the arena.
pub type Point = [f32; 2];

/// The pursuit environment as seen by the training loop.
///
/// The environment owns its state; the trainer only reads the current
/// observation, feeds actions and resets it between episodes. Trajectories are
/// recorded by the environment itself and are only used for reporting.
pub trait Environment {
    fn observation_size(&self) -> usize;
    fn action_size(&self) -> usize;

    /// Current observation, `observation_size()` values long.
    fn state(&self) -> &[f32];

    /// Applies `action` and returns the reward for the transition.
    fn step(&mut self, action: &[f32]) -> f32;

    fn reset(&mut self);

    fn hunter_trajectory(&self) -> &[Point];

    /// Environments without a victim (a hunter group chasing a fixed target)
    /// leave this empty.
    fn victim_trajectory(&self) -> &[Point] {
        &[]
    }
}
