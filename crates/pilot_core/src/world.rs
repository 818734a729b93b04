//! World access seam.
//!
//! The core never owns the world; it reads one through [`WorldQuery`]. Every
//! metric here is toroidal.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::geometry::{Torus, Vec2};
use crate::{ObjectId, WorldObject};

const FREE_LOCATION_ATTEMPTS: usize = 64;

pub trait WorldQuery {
    fn torus(&self) -> Torus;

    fn objects(&self) -> &[WorldObject];

    fn object(&self, id: ObjectId) -> Option<&WorldObject> {
        self.objects().iter().find(|object| object.id == id)
    }

    /// Alive objects strictly within `radius` of `center`.
    fn all_objects_near(&self, center: Vec2, radius: f64) -> Vec<&WorldObject> {
        let torus = self.torus();
        self.objects()
            .iter()
            .filter(|object| object.alive && torus.distance(center, object.position) < radius)
            .collect()
    }

    /// True when the segment `from → to` passes every obstacle with at least
    /// `clearance` to spare beyond its radius.
    fn is_path_clear(
        &self,
        from: Vec2,
        to: Vec2,
        obstacles: &[&WorldObject],
        clearance: f64,
    ) -> bool {
        let torus = self.torus();
        let delta = torus.shortest_delta(from, to);
        obstacles.iter().all(|obstacle| {
            torus.segment_distance(from, delta, obstacle.position) > obstacle.radius + clearance
        })
    }

    /// True when a circle of `radius` at `point` overlaps no alive object.
    fn is_location_free(&self, point: Vec2, radius: f64) -> bool {
        let torus = self.torus();
        self.objects().iter().filter(|object| object.alive).all(|object| {
            torus.distance(point, object.position) > object.radius + radius
        })
    }

    fn shortest_distance(&self, from: Vec2, to: Vec2) -> f64 {
        self.torus().distance(from, to)
    }

    fn shortest_distance_vector(&self, from: Vec2, to: Vec2) -> Vec2 {
        self.torus().shortest_delta(from, to)
    }

    /// Uniform sample of a free point; `None` if none was found in a bounded
    /// number of attempts.
    fn random_free_location(&self, rng: &mut dyn RngCore, radius: f64) -> Option<Vec2> {
        let torus = self.torus();
        (0..FREE_LOCATION_ATTEMPTS)
            .map(|_| Vec2::new(rng.gen_range(0.0..torus.width), rng.gen_range(0.0..torus.height)))
            .find(|point| self.is_location_free(*point, radius))
    }
}

/// Plain in-memory world: a torus and a flat object list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub torus: Torus,
    #[serde(default)]
    pub tick: u64,
    pub objects: Vec<WorldObject>,
}

impl WorldSnapshot {
    pub fn new(torus: Torus) -> Self {
        Self {
            torus,
            tick: 0,
            objects: Vec::new(),
        }
    }

    pub fn with_objects(torus: Torus, objects: Vec<WorldObject>) -> Self {
        Self {
            torus,
            tick: 0,
            objects,
        }
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut WorldObject> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    /// Drop dead objects. Returns how many were removed.
    pub fn sweep_dead(&mut self) -> usize {
        let before = self.objects.len();
        self.objects.retain(|object| object.alive);
        before - self.objects.len()
    }
}

impl WorldQuery for WorldSnapshot {
    fn torus(&self) -> Torus {
        self.torus
    }

    fn objects(&self) -> &[WorldObject] {
        &self.objects
    }
}
