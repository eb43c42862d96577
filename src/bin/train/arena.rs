use pursuit::{
    config::Arena,
    env::{Environment, Point},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// A single hunter chasing a fleeing victim inside a square arena.
///
/// The hunter steers with a 2-D velocity in `[-1, 1]` scaled by its speed. The
/// victim runs straight away from the hunter. Every step costs the distance
/// between them; a capture pays a bonus and respawns the victim.
pub struct PursuitEnv {
    arena: Arena,
    rng: StdRng,
    hunter: Point,
    victim: Point,
    state: [f32; 4],
    hunter_trajectory: Vec<Point>,
    victim_trajectory: Vec<Point>,
    captures: usize,
}

impl PursuitEnv {
    pub fn new(arena: Arena, seed: u64) -> Self {
        let mut env = Self {
            arena,
            rng: StdRng::seed_from_u64(seed),
            hunter: [0.0, 0.0],
            victim: [0.0, 0.0],
            state: [0.0; 4],
            hunter_trajectory: Vec::new(),
            victim_trajectory: Vec::new(),
            captures: 0,
        };
        env.reset();

        env
    }

    pub fn captures(&self) -> usize {
        self.captures
    }

    fn random_point(&mut self) -> Point {
        let size = self.arena.size;
        [
            self.rng.random_range(0.0..size),
            self.rng.random_range(0.0..size),
        ]
    }

    fn clamp(&self, point: Point) -> Point {
        [
            point[0].clamp(0.0, self.arena.size),
            point[1].clamp(0.0, self.arena.size),
        ]
    }

    fn distance(&self) -> f32 {
        let dx = self.victim[0] - self.hunter[0];
        let dy = self.victim[1] - self.hunter[1];

        (dx * dx + dy * dy).sqrt()
    }

    fn observe(&mut self) {
        let size = self.arena.size;
        self.state = [
            self.hunter[0] / size,
            self.hunter[1] / size,
            (self.victim[0] - self.hunter[0]) / size,
            (self.victim[1] - self.hunter[1]) / size,
        ];
    }

    fn flee(&mut self) {
        let dx = self.victim[0] - self.hunter[0];
        let dy = self.victim[1] - self.hunter[1];
        let norm = (dx * dx + dy * dy).sqrt();

        if norm > f32::EPSILON {
            let speed = self.arena.victim_speed / norm;
            self.victim = self.clamp([self.victim[0] + dx * speed, self.victim[1] + dy * speed]);
        }
    }
}

impl Environment for PursuitEnv {
    fn observation_size(&self) -> usize {
        self.state.len()
    }

    fn action_size(&self) -> usize {
        2
    }

    fn state(&self) -> &[f32] {
        &self.state
    }

    fn step(&mut self, action: &[f32]) -> f32 {
        let speed = self.arena.hunter_speed;
        let vx = action.first().copied().unwrap_or_default().clamp(-1.0, 1.0);
        let vy = action.get(1).copied().unwrap_or_default().clamp(-1.0, 1.0);

        self.hunter = self.clamp([self.hunter[0] + vx * speed, self.hunter[1] + vy * speed]);
        self.flee();

        self.hunter_trajectory.push(self.hunter);
        self.victim_trajectory.push(self.victim);

        let distance = self.distance();
        let mut reward = -distance / self.arena.size;

        if distance < self.arena.capture_radius {
            reward += self.arena.capture_bonus;
            self.captures += 1;
            self.victim = self.random_point();
        }

        self.observe();

        reward
    }

    fn reset(&mut self) {
        self.hunter = self.random_point();
        self.victim = self.random_point();

        self.hunter_trajectory.clear();
        self.victim_trajectory.clear();
        self.hunter_trajectory.push(self.hunter);
        self.victim_trajectory.push(self.victim);

        self.observe();
    }

    fn hunter_trajectory(&self) -> &[Point] {
        &self.hunter_trajectory
    }

    fn victim_trajectory(&self) -> &[Point] {
        &self.victim_trajectory
    }
}
