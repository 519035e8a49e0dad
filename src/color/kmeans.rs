use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Stop once no center moves further than this (RGB units)
const CONVERGENCE_TOLERANCE: f32 = 1e-3;

/// Result of a k-means run
#[derive(Debug, Clone)]
pub struct KMeans {
    /// One row per cluster, columns are R, G, B
    pub centers: Array2<f32>,
    /// Cluster index for every input row
    pub assignments: Vec<usize>,
    /// Lloyd rounds run before convergence or the iteration limit
    pub iterations: usize,
}

impl KMeans {
    /// Number of points assigned to each cluster
    pub fn cluster_sizes(&self) -> Vec<u64> {
        let mut sizes = vec![0u64; self.centers.nrows()];
        for &cluster in &self.assignments {
            sizes[cluster] += 1;
        }
        sizes
    }
}

fn squared_distance(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest(point: ArrayView1<f32>, centers: &Array2<f32>) -> (usize, f32) {
    centers
        .axis_iter(Axis(0))
        .enumerate()
        .map(|(i, center)| (i, squared_distance(point, center)))
        .fold((0, f32::MAX), |best, candidate| {
            if candidate.1 < best.1 {
                candidate
            } else {
                best
            }
        })
}

/// k-means++ seeding: each new center is drawn with probability proportional to
/// its squared distance from the closest center chosen so far
fn init_plus_plus(points: &Array2<f32>, k: usize, rng: &mut StdRng) -> Array2<f32> {
    let n = points.nrows();
    let mut centers = Array2::<f32>::zeros((k, points.ncols()));
    centers.row_mut(0).assign(&points.row(rng.gen_range(0..n)));

    let mut distances: Vec<f32> = points
        .axis_iter(Axis(0))
        .map(|p| squared_distance(p, centers.row(0)))
        .collect();

    for c in 1..k {
        let total: f64 = distances.iter().map(|&d| d as f64).sum();
        let chosen = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut index = n - 1;
            for (i, &d) in distances.iter().enumerate() {
                target -= d as f64;
                if target < 0.0 {
                    index = i;
                    break;
                }
            }
            index
        } else {
            // every point already coincides with a center
            rng.gen_range(0..n)
        };

        centers.row_mut(c).assign(&points.row(chosen));
        for (i, p) in points.axis_iter(Axis(0)).enumerate() {
            distances[i] = distances[i].min(squared_distance(p, centers.row(c)));
        }
    }

    centers
}

/// Lloyd's k-means over the rows of `points`
///
/// `k` is capped at the number of points. Clusters that lose all their points
/// keep their previous center. Returns `None` for an empty point set.
pub fn kmeans(points: &Array2<f32>, k: usize, max_iterations: usize, seed: u64) -> Option<KMeans> {
    let _span = tracing::debug_span!("kmeans", points = points.nrows(), k).entered();

    let n = points.nrows();
    if n == 0 || k == 0 {
        return None;
    }
    let k = k.min(n);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centers = init_plus_plus(points, k, &mut rng);
    let mut assignments = vec![0usize; n];
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;

        let mut changed = false;
        for (i, p) in points.axis_iter(Axis(0)).enumerate() {
            let (cluster, _) = nearest(p, &centers);
            if assignments[i] != cluster {
                assignments[i] = cluster;
                changed = true;
            }
        }

        let mut sums = Array2::<f32>::zeros(centers.raw_dim());
        let mut counts = Array1::<f32>::zeros(k);
        for (i, p) in points.axis_iter(Axis(0)).enumerate() {
            let mut row = sums.row_mut(assignments[i]);
            row += &p;
            counts[assignments[i]] += 1.0;
        }

        let mut shift = 0.0f32;
        for c in 0..k {
            if counts[c] == 0.0 {
                continue;
            }
            let mean = &sums.row(c) / counts[c];
            shift = shift.max(squared_distance(mean.view(), centers.row(c)).sqrt());
            centers.row_mut(c).assign(&mean);
        }

        if (!changed && iterations > 1) || shift < CONVERGENCE_TOLERANCE {
            break;
        }
    }

    Some(KMeans {
        centers,
        assignments,
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_two_obvious_clusters() {
        let points = array![
            [255.0, 0.0, 0.0],
            [250.0, 5.0, 0.0],
            [0.0, 255.0, 0.0],
            [5.0, 250.0, 0.0],
        ];
        let result = kmeans(&points, 2, 50, 7).unwrap();

        assert_eq!(result.assignments[0], result.assignments[1]);
        assert_eq!(result.assignments[2], result.assignments[3]);
        assert_ne!(result.assignments[0], result.assignments[2]);

        let red = result.centers.row(result.assignments[0]);
        assert!((red[0] - 252.5).abs() < 1e-3);
        assert!((red[1] - 2.5).abs() < 1e-3);
    }

    #[test]
    fn test_k_capped_at_point_count() {
        let points = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let result = kmeans(&points, 10, 10, 1).unwrap();
        assert_eq!(result.centers.nrows(), 2);
        assert_eq!(result.cluster_sizes().iter().sum::<u64>(), 2);
    }

    #[test]
    fn test_identical_points() {
        let points = Array2::from_elem((6, 3), 9.0f32);
        let result = kmeans(&points, 3, 10, 3).unwrap();
        assert_eq!(result.assignments.len(), 6);
        assert_eq!(result.cluster_sizes().iter().sum::<u64>(), 6);
    }

    #[test]
    fn test_empty_input() {
        let points = Array2::<f32>::zeros((0, 3));
        assert!(kmeans(&points, 3, 10, 3).is_none());
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let points = Array2::from_shape_fn((200, 3), |(i, j)| ((i * 37 + j * 91) % 256) as f32);
        let a = kmeans(&points, 4, 100, 11).unwrap();
        let b = kmeans(&points, 4, 100, 11).unwrap();
        assert_eq!(a.assignments, b.assignments);
        assert_eq!(a.centers, b.centers);
        assert_eq!(a.iterations, b.iterations);
    }

    #[test]
    fn test_iterations_respect_limit() {
        let points = Array2::from_shape_fn((200, 3), |(i, j)| ((i * 37 + j * 91) % 256) as f32);
        let capped = kmeans(&points, 4, 1, 11).unwrap();
        assert_eq!(capped.iterations, 1);

        let free = kmeans(&points, 4, 100, 11).unwrap();
        assert!(free.iterations >= 1 && free.iterations <= 100);
    }
}
