use rand::Rng;

use super::types::Point;

/// Decorative marker cycling along one edge.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
	/// Index into the active diagram's edges.
	pub edge: usize,
	/// Position along the edge in `[0, 1)`.
	pub progress: f64,
	/// Progress added per tick.
	pub speed: f64,
}

impl Particle {
	/// Advances one tick, wrapping back to the source at 1.0.
	pub fn advance(&mut self) {
		self.progress = (self.progress + self.speed) % 1.0;
	}

	pub fn position(&self, from: Point, to: Point) -> Point {
		from.lerp(to, self.progress)
	}
}

/// Owns every particle of the active diagram.
#[derive(Clone, Debug)]
pub struct ParticleEngine {
	particles: Vec<Particle>,
	speed_min: f64,
	speed_max: f64,
}

impl ParticleEngine {
	pub fn new(speed_min: f64, speed_max: f64) -> Self {
		Self {
			particles: Vec::new(),
			speed_min,
			speed_max,
		}
	}

	/// Drops all particles and spawns `per_edge` fresh ones on each edge, with
	/// random phase and speed so the pulses do not move in lockstep.
	pub fn regenerate<R: Rng>(&mut self, edge_count: usize, per_edge: usize, rng: &mut R) {
		self.particles.clear();
		self.particles.reserve(edge_count * per_edge);
		for edge in 0..edge_count {
			for _ in 0..per_edge {
				let speed = if self.speed_max > self.speed_min {
					rng.random_range(self.speed_min..self.speed_max)
				} else {
					self.speed_min
				};
				self.particles.push(Particle {
					edge,
					progress: rng.random::<f64>(),
					speed,
				});
			}
		}
	}

	pub fn clear(&mut self) {
		self.particles.clear();
	}

	pub fn advance_all(&mut self) {
		self.particles.iter_mut().for_each(Particle::advance);
	}

	pub fn particles(&self) -> &[Particle] {
		&self.particles
	}

	#[cfg(test)]
	pub fn len(&self) -> usize {
		self.particles.len()
	}
}
