use crate::env::{Environment, Point};

/// Fixed-state environment paying the same reward on every step.
pub struct ConstantEnv {
    reward: f32,
    state: [f32; 2],
    steps: usize,
    resets: usize,
    hunter: Vec<Point>,
}

impl ConstantEnv {
    pub fn new(reward: f32) -> Self {
        Self {
            reward,
            state: [0.0, 0.0],
            steps: 0,
            resets: 0,
            hunter: vec![[0.0, 0.0]],
        }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn resets(&self) -> usize {
        self.resets
    }
}

impl Environment for ConstantEnv {
    fn observation_size(&self) -> usize {
        2
    }

    fn action_size(&self) -> usize {
        2
    }

    fn state(&self) -> &[f32] {
        &self.state
    }

    fn step(&mut self, action: &[f32]) -> f32 {
        let last = self.hunter.last().copied().unwrap_or_default();
        self.hunter.push([last[0] + action[0], last[1] + action[1]]);
        self.steps += 1;

        self.reward
    }

    fn hunter_trajectory(&self) -> &[Point] {
        &self.hunter
    }

    fn reset(&mut self) {
        self.resets += 1;
        self.hunter.truncate(1);
    }
}
