//! Depot siting: k-means over mineable deposits on the torus.

use pilot_core::{ObjectKind, Vec2, WorldObject, WorldQuery};
use rand::{Rng, RngCore};

const CONVERGED: f64 = 1e-7;

/// Centroid of the deposit cluster with the highest resource density, where
/// density is total resources over the distance to the farthest member
/// (at least 1).
pub fn densest_cluster<W: WorldQuery + ?Sized>(
    world: &W,
    clusters: usize,
    max_iterations: usize,
    rng: &mut dyn RngCore,
) -> Option<Vec2> {
    let torus = world.torus();
    let prospects: Vec<&WorldObject> = world
        .objects()
        .iter()
        .filter(|object| {
            object.alive
                && object.kind == ObjectKind::ResourceDeposit
                && object.mineable
                && object.cargo() > 0.0
        })
        .collect();
    if prospects.is_empty() || clusters == 0 {
        return None;
    }

    let mut centroids: Vec<Vec2> = (0..clusters)
        .map(|_| {
            world.random_free_location(rng, 0.0).unwrap_or_else(|| {
                Vec2::new(rng.gen_range(0.0..torus.width), rng.gen_range(0.0..torus.height))
            })
        })
        .collect();
    let mut assignment = vec![0usize; prospects.len()];

    for _ in 0..max_iterations {
        for (slot, prospect) in assignment.iter_mut().zip(&prospects) {
            *slot = nearest_centroid(&centroids, |c| torus.distance(prospect.position, c));
        }
        let mut moved = false;
        for (k, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<Vec2> = prospects
                .iter()
                .zip(&assignment)
                .filter(|(_, slot)| **slot == k)
                .map(|(prospect, _)| torus.shortest_delta(*centroid, prospect.position))
                .collect();
            if members.is_empty() {
                continue;
            }
            let shift = members.iter().fold(Vec2::ZERO, |sum, d| sum + *d)
                * (1.0 / members.len() as f64);
            if shift.length() > CONVERGED {
                *centroid = torus.wrap(*centroid + shift);
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }

    let mut best: Option<(f64, Vec2)> = None;
    for (k, centroid) in centroids.iter().enumerate() {
        let mut total = 0.0;
        let mut extent: f64 = 1.0;
        for (prospect, _) in prospects.iter().zip(&assignment).filter(|(_, slot)| **slot == k) {
            total += prospect.cargo();
            extent = extent.max(torus.distance(*centroid, prospect.position));
        }
        let density = total / extent;
        if best.map_or(true, |(most, _)| density > most) {
            best = Some((density, *centroid));
        }
    }
    best.map(|(_, centroid)| centroid)
}

fn nearest_centroid(centroids: &[Vec2], distance: impl Fn(Vec2) -> f64) -> usize {
    centroids
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| distance(**a).total_cmp(&distance(**b)))
        .map_or(0, |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_core::test_fixtures::{deposit, small_world};
    use pilot_core::{Torus, WorldSnapshot};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn no_prospects_no_site() {
        let world = small_world(vec![]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(densest_cluster(&world, 9, 100, &mut rng).is_none());
    }

    #[test]
    fn rich_tight_cluster_wins_over_sparse_scatter() {
        let mut objects = vec![
            deposit(1, Vec2::new(20.0, 20.0), 100.0),
            deposit(2, Vec2::new(21.0, 20.0), 100.0),
            deposit(3, Vec2::new(20.0, 21.0), 100.0),
        ];
        objects.push(deposit(4, Vec2::new(70.0, 70.0), 10.0));
        objects.push(deposit(5, Vec2::new(80.0, 60.0), 10.0));
        let world = WorldSnapshot::with_objects(Torus::new(100.0, 100.0), objects);
        let mut rng = ChaCha8Rng::seed_from_u64(8);

        let site = densest_cluster(&world, 9, 100, &mut rng).expect("site found");
        assert!(
            world.torus.distance(site, Vec2::new(20.3, 20.3)) < 5.0,
            "site {site:?} should sit on the rich cluster"
        );
    }
}
