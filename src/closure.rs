//! All-pairs shortest travel times over a sparse edge set.
//!
//! Floyd–Warshall is O(n³); n is the depot plus the reservoirs of a single
//! request, so tens of nodes.

use std::collections::HashMap;

/// Directed travel times in minutes: `edges[from][to]`.
pub type EdgeMap = HashMap<String, HashMap<String, i64>>;

/// Assigned to pairs that stay unreachable after closure.
pub const UNREACHABLE_MINUTES: i64 = 999_999;

const INFINITY: i64 = i64::MAX / 4;

/// Dense square matrix of travel minutes, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceMatrix {
    data: Vec<i64>,
    size: usize,
}

impl DistanceMatrix {
    /// A matrix with zero diagonal and every other pair unreachable.
    pub fn unreachable(size: usize) -> Self {
        let mut data = vec![UNREACHABLE_MINUTES; size * size];
        for i in 0..size {
            data[i * size + i] = 0;
        }
        Self { data, size }
    }

    /// Build from explicit rows. Returns `None` unless the rows are square.
    pub fn from_rows(rows: Vec<Vec<i64>>) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|row| row.len() != size) {
            return None;
        }
        Some(Self {
            data: rows.into_iter().flatten().collect(),
            size,
        })
    }

    pub fn get(&self, from: usize, to: usize) -> i64 {
        self.data[from * self.size + to]
    }

    pub fn set(&mut self, from: usize, to: usize, minutes: i64) {
        self.data[from * self.size + to] = minutes;
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Re-run closure over this matrix, treating sentinel entries as finite.
    pub fn closed(mut self) -> Self {
        floyd_warshall(&mut self.data, self.size);
        cap_unreachable(&mut self.data);
        self
    }
}

/// Close `edges` over `nodes`, in the given node order.
///
/// Edges naming ids outside `nodes` are ignored. Direct times are clamped to
/// `0..=UNREACHABLE_MINUTES`. Missing pairs are infinite until a path through an
/// intermediate node closes them; whatever is still open afterwards becomes
/// [`UNREACHABLE_MINUTES`].
pub fn close(edges: &EdgeMap, nodes: &[String]) -> DistanceMatrix {
    let n = nodes.len();
    let mut data = vec![INFINITY; n * n];

    for (i, from) in nodes.iter().enumerate() {
        data[i * n + i] = 0;
        let Some(targets) = edges.get(from) else {
            continue;
        };
        for (j, to) in nodes.iter().enumerate() {
            if i == j {
                continue;
            }
            if let Some(&minutes) = targets.get(to) {
                data[i * n + j] = minutes.clamp(0, UNREACHABLE_MINUTES);
            }
        }
    }

    floyd_warshall(&mut data, n);
    cap_unreachable(&mut data);

    DistanceMatrix { data, size: n }
}

fn floyd_warshall(data: &mut [i64], n: usize) {
    for k in 0..n {
        for i in 0..n {
            let via = data[i * n + k];
            if via >= INFINITY {
                continue;
            }
            for j in 0..n {
                let candidate = via.saturating_add(data[k * n + j]);
                if candidate < data[i * n + j] {
                    data[i * n + j] = candidate;
                }
            }
        }
    }
}

fn cap_unreachable(data: &mut [i64]) {
    for value in data.iter_mut() {
        if *value > UNREACHABLE_MINUTES {
            *value = UNREACHABLE_MINUTES;
        }
    }
}
