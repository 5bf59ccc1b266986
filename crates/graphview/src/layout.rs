//! Layered graph layout.
//!
//! Longest-path ranking with declaration-order placement within a rank.
//! Deterministic for a given input; cycles are tolerated by bounding the
//! relaxation passes, so nodes on a cycle keep the deepest rank reached
//! before the bound.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Copy, Debug)]
pub struct LayoutConfig {
    pub node_w: f64,
    pub node_h: f64,
    pub nodesep: f64,
    pub ranksep: f64,
    pub margin: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_w: 100.0,
            node_h: 40.0,
            nodesep: 50.0,
            ranksep: 60.0,
            margin: 20.0,
        }
    }
}

impl LayoutConfig {
    /// Graph props override the defaults; unknown props are left to the
    /// embedder.
    pub fn from_props(props: &BTreeMap<String, Value>) -> Self {
        let mut config = Self::default();
        let read = |name: &str| props.get(name).and_then(Value::as_f64);
        if let Some(v) = read("nodeWidth") {
            config.node_w = v;
        }
        if let Some(v) = read("nodeHeight") {
            config.node_h = v;
        }
        if let Some(v) = read("nodesep") {
            config.nodesep = v;
        }
        if let Some(v) = read("ranksep") {
            config.ranksep = v;
        }
        if let Some(v) = read("margin") {
            config.margin = v;
        }
        config
    }
}

/// Center coordinates per node id, plus the extents of the drawing.
#[derive(Clone, Debug, Default)]
pub struct GraphLayout {
    pub positions: HashMap<String, (f64, f64)>,
    pub width: f64,
    pub height: f64,
}

pub fn layout(node_ids: &[String], edges: &[(String, String)], config: &LayoutConfig) -> GraphLayout {
    if node_ids.is_empty() {
        return GraphLayout {
            width: 2.0 * config.margin,
            height: 2.0 * config.margin,
            ..GraphLayout::default()
        };
    }

    let index: HashMap<&str, usize> = node_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let edge_indices: Vec<(usize, usize)> = edges
        .iter()
        .filter_map(|(from, to)| Some((*index.get(from.as_str())?, *index.get(to.as_str())?)))
        .collect();

    // Longest-path ranks, relaxation bounded by node count so cycles
    // terminate.
    let mut rank = vec![0usize; node_ids.len()];
    for _ in 0..node_ids.len() {
        let mut changed = false;
        for &(from, to) in &edge_indices {
            if rank[to] < rank[from] + 1 {
                rank[to] = rank[from] + 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut within_rank = vec![0usize; node_ids.len()];
    let mut rank_width = HashMap::new();
    for (i, &r) in rank.iter().enumerate() {
        let count = rank_width.entry(r).or_insert(0usize);
        within_rank[i] = *count;
        *count += 1;
    }

    let mut positions = HashMap::new();
    for (i, id) in node_ids.iter().enumerate() {
        let x = config.margin + config.node_w / 2.0
            + within_rank[i] as f64 * (config.node_w + config.nodesep);
        let y = config.margin + config.node_h / 2.0
            + rank[i] as f64 * (config.node_h + config.ranksep);
        positions.insert(id.clone(), (x, y));
    }

    let widest = rank_width.values().copied().max().unwrap_or(1) as f64;
    let deepest = rank.iter().copied().max().unwrap_or(0) as f64;
    GraphLayout {
        positions,
        width: 2.0 * config.margin + widest * config.node_w + (widest - 1.0).max(0.0) * config.nodesep,
        height: 2.0 * config.margin + (deepest + 1.0) * config.node_h + deepest * config.ranksep,
    }
}
