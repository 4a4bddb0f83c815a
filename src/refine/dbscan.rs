//! Density-based clustering (DBSCAN) of window colors.
//!
//! A point is a core point when at least `min_samples` *other* points lie
//! within `eps` of it (Euclidean RGB distance, inclusive). Clusters grow
//! from core points; points reached by no core point are noise (`-1`).
//!
//! ## Scan order
//!
//! Points are visited in ascending index (window row-major order). A new
//! cluster id is opened at each unlabeled core point, ids count up from 0,
//! and a border point keeps the first cluster that reaches it. The
//! labeling is therefore fully determined by the input order.
//!
//! ## Color grouping
//!
//! Windows are small and usually dominated by a handful of colors, so the
//! clusterer works on the distinct colors weighted by multiplicity.
//! Identical colors always share one label under the rules above, so the
//! result is the same as running point by point.

use std::collections::HashMap;
use std::collections::VecDeque;

use ndarray::ArrayView3;

/// Label of points that belong to no cluster.
pub const NOISE: i32 = -1;

/// Cluster id for every pixel of a window, in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterLabeling {
    labels: Vec<i32>,
    cluster_count: usize,
}

impl ClusterLabeling {
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of proper clusters (noise excluded).
    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    /// Population per label, indexed by `label + 1`.
    ///
    /// Slot 0 holds the noise count; slot `k + 1` holds cluster `k`. The
    /// table is ordered by label id, so scanning it is deterministic.
    pub fn populations(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.cluster_count + 1];
        for &label in &self.labels {
            counts[(label + 1) as usize] += 1;
        }
        counts
    }
}

/// Flatten the first three channels of a window in row-major order.
pub fn window_colors(window: ArrayView3<u8>) -> Vec<[u8; 3]> {
    let (height, width, _) = window.dim();
    let mut colors = Vec::with_capacity(height * width);
    for y in 0..height {
        for x in 0..width {
            colors.push([window[[y, x, 0]], window[[y, x, 1]], window[[y, x, 2]]]);
        }
    }
    colors
}

#[inline]
fn distance_sq(a: [u8; 3], b: [u8; 3]) -> u32 {
    let dr = a[0] as i32 - b[0] as i32;
    let dg = a[1] as i32 - b[1] as i32;
    let db = a[2] as i32 - b[2] as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Run DBSCAN over a list of RGB colors.
///
/// # Arguments
/// * `colors` - Points in scan order
/// * `eps` - Neighborhood radius
/// * `min_samples` - Other points required within `eps` for a core point
///
/// # Returns
/// One label per input point, `NOISE` for unclustered points.
pub fn cluster_colors(colors: &[[u8; 3]], eps: f32, min_samples: usize) -> ClusterLabeling {
    // Distinct colors in order of first occurrence, plus the distinct
    // index of every point.
    let mut index_of: HashMap<[u8; 3], usize> = HashMap::new();
    let mut distinct: Vec<[u8; 3]> = Vec::new();
    let mut weight: Vec<usize> = Vec::new();
    let mut point_color = Vec::with_capacity(colors.len());

    for &color in colors {
        let idx = *index_of.entry(color).or_insert_with(|| {
            distinct.push(color);
            weight.push(0);
            distinct.len() - 1
        });
        weight[idx] += 1;
        point_color.push(idx);
    }

    let distinct_labels = cluster_weighted(&distinct, &weight, eps, min_samples);

    let labels: Vec<i32> = point_color.iter().map(|&idx| distinct_labels[idx]).collect();
    let cluster_count = distinct_labels
        .iter()
        .copied()
        .max()
        .map_or(0, |max| (max + 1).max(0) as usize);

    ClusterLabeling {
        labels,
        cluster_count,
    }
}

/// DBSCAN over weighted distinct colors. `colors` must be in first
/// occurrence order for the labels to match the point-wise scan.
fn cluster_weighted(colors: &[[u8; 3]], weight: &[usize], eps: f32, min_samples: usize) -> Vec<i32> {
    let n = colors.len();
    let eps_sq = (eps as f64) * (eps as f64);
    let within = |a: usize, b: usize| (distance_sq(colors[a], colors[b]) as f64) <= eps_sq;

    // Neighbor count of any copy of color i: every point within eps,
    // minus the point itself.
    let is_core: Vec<bool> = (0..n)
        .map(|i| {
            let reachable: usize = (0..n).filter(|&j| within(i, j)).map(|j| weight[j]).sum();
            reachable - 1 >= min_samples
        })
        .collect();

    let mut labels = vec![NOISE; n];
    let mut next_label = 0i32;
    let mut queue = VecDeque::new();

    for start in 0..n {
        if labels[start] != NOISE || !is_core[start] {
            continue;
        }

        labels[start] = next_label;
        queue.push_back(start);

        while let Some(i) = queue.pop_front() {
            for j in 0..n {
                if labels[j] != NOISE || !within(i, j) {
                    continue;
                }
                labels[j] = next_label;
                if is_core[j] {
                    queue.push_back(j);
                }
            }
        }

        next_label += 1;
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    const RED: [u8; 3] = [255, 0, 0];
    const BLUE: [u8; 3] = [0, 0, 255];

    #[test]
    fn test_uniform_colors_form_one_cluster() {
        let colors = vec![RED; 25];
        let labeling = cluster_colors(&colors, 10.0, 5);
        assert_eq!(labeling.cluster_count(), 1);
        assert!(labeling.labels().iter().all(|&l| l == 0));
    }

    #[test]
    fn test_too_few_points_is_all_noise() {
        // 4 points, each has 3 neighbors, needs 4.
        let colors = vec![RED; 4];
        let labeling = cluster_colors(&colors, 10.0, 4);
        assert_eq!(labeling.cluster_count(), 0);
        assert!(labeling.labels().iter().all(|&l| l == NOISE));
    }

    #[test]
    fn test_min_samples_excludes_self() {
        // 5 identical points: 4 others each, exactly enough.
        let labeling = cluster_colors(&vec![BLUE; 5], 1.0, 4);
        assert!(labeling.labels().iter().all(|&l| l == 0));
        let labeling = cluster_colors(&vec![BLUE; 5], 1.0, 5);
        assert!(labeling.labels().iter().all(|&l| l == NOISE));
    }

    #[test]
    fn test_two_separated_clusters_numbered_by_first_occurrence() {
        let mut colors = vec![BLUE; 6];
        colors.extend(vec![RED; 6]);
        colors.swap(0, 11); // first point is red now
        let labeling = cluster_colors(&colors, 20.0, 3);

        assert_eq!(labeling.cluster_count(), 2);
        assert_eq!(labeling.labels()[0], 0); // red opens cluster 0
        assert_eq!(labeling.labels()[1], 1); // blue is cluster 1
        assert_eq!(labeling.labels()[11], 1);
    }

    #[test]
    fn test_eps_is_inclusive() {
        let a = [0, 0, 0];
        let b = [3, 4, 0]; // distance exactly 5
        let labeling = cluster_colors(&[a, b], 5.0, 1);
        assert_eq!(labeling.labels(), &[0, 0]);

        let labeling = cluster_colors(&[a, b], 4.99, 1);
        assert_eq!(labeling.labels(), &[NOISE, NOISE]);
    }

    #[test]
    fn test_border_point_joins_cluster() {
        let mut colors = vec![[0, 0, 0]; 6];
        colors.push([9, 0, 0]);
        colors.push([18, 0, 0]);
        let labeling = cluster_colors(&colors, 10.0, 6);
        // [9,0,0] reaches 6 zeros + [18] = 7 neighbors: core.
        // [18,0,0] reaches only [9]: border of cluster 0.
        assert_eq!(labeling.cluster_count(), 1);
        assert_eq!(labeling.labels()[7], 0);
        assert!(labeling.labels().iter().all(|&l| l == 0));
    }

    #[test]
    fn test_chain_is_density_connected() {
        // Gradient where consecutive colors are within eps.
        let colors: Vec<[u8; 3]> = (0..20u8).map(|i| [i * 5, 0, 0]).collect();
        let labeling = cluster_colors(&colors, 5.0, 1);
        assert_eq!(labeling.cluster_count(), 1);
        assert!(labeling.labels().iter().all(|&l| l == 0));
    }

    #[test]
    fn test_populations_table() {
        let mut colors = vec![RED; 5];
        colors.extend(vec![BLUE; 3]);
        colors.push([0, 255, 0]);
        let labeling = cluster_colors(&colors, 1.0, 2);
        // noise: green; cluster 0: red; cluster 1: blue
        assert_eq!(labeling.populations(), vec![1, 5, 3]);
    }

    #[test]
    fn test_grouping_matches_repeated_runs() {
        let colors: Vec<[u8; 3]> = (0..64u32)
            .map(|i| [(i * 37 % 256) as u8, (i * 11 % 256) as u8, (i * 3 % 256) as u8])
            .collect();
        let first = cluster_colors(&colors, 60.0, 3);
        let second = cluster_colors(&colors, 60.0, 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_window_colors_row_major_ignores_alpha() {
        let mut window = Array3::<u8>::zeros((2, 2, 4));
        window[[0, 1, 0]] = 10;
        window[[1, 0, 2]] = 20;
        window[[1, 1, 3]] = 255;
        let colors = window_colors(window.view());
        assert_eq!(colors, vec![[0, 0, 0], [10, 0, 0], [0, 0, 20], [0, 0, 0]]);
    }
}
