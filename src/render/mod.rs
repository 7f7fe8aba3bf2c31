//! Bubble-chart render instructions.
//!
//! [`render`] is a pure function of the pool set, the current slot leader and
//! the theme. It owns no drawing surface; a front end turns the returned
//! [`RenderInstructions`] into SVG or canvas calls.

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use itertools::Itertools;
use serde::Serialize;

use crate::models::StakePool;

pub mod color;
pub mod highlight;
pub mod pack;

pub use color::SequentialScale;
pub use highlight::{leader_effects, LeaderEffects};

pub const ZOOM_SCALE_EXTENT: (f64, f64) = (0.5, 5.0);
pub const NO_TICKER: &str = "N/A";
const MIN_LABEL_RADIUS: f64 = 15.0;

pub fn clamp_zoom(scale: f64) -> f64 {
    scale.clamp(ZOOM_SCALE_EXTENT.0, ZOOM_SCALE_EXTENT.1)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            width: 800.0,
            height: 800.0,
            padding: 3.0,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub background: &'static str,
    pub stroke: &'static str,
    pub hover_stroke: &'static str,
    pub label: &'static str,
    pub leader_accent: &'static str,
}

impl Theme {
    pub const LIGHT: Theme = Theme {
        background: "#ffffff",
        stroke: "#ffffff",
        hover_stroke: "#111827",
        label: "#111827",
        leader_accent: "#f59e0b",
    };

    pub const DARK: Theme = Theme {
        background: "#111827",
        stroke: "#1f2937",
        hover_stroke: "#f9fafb",
        label: "#f9fafb",
        leader_accent: "#facc15",
    };

    pub fn for_mode(dark_mode: bool) -> Theme {
        if dark_mode {
            Theme::DARK
        } else {
            Theme::LIGHT
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoverStyle {
    pub stroke: String,
    pub stroke_width: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tooltip {
    pub name: String,
    pub ticker: String,
    pub stake_ada: u64,
    pub blocks_minted: u64,
    pub is_leader: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BubbleNode {
    pub pool_id: String,
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub value: f64, // Live stake in ADA
    pub fill: String,
    pub stroke: String,
    pub label: Option<String>,
    pub is_leader: bool,
    pub hover: Option<HoverStyle>, // None while the leader highlight owns the node
    pub effects: Option<LeaderEffects>,
    pub tooltip: Tooltip,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderInstructions {
    pub width: f64,
    pub height: f64,
    pub theme: Theme,
    pub zoom_extent: (f64, f64),
    pub max_blocks: u64,
    /// Changes whenever the leader or the laid-out pool set changes; any
    /// running animation must be torn down and rebuilt when it does.
    pub scene_key: u64,
    pub nodes: Vec<BubbleNode>,
}

impl RenderInstructions {
    pub fn leader(&self) -> Option<&BubbleNode> {
        self.nodes.iter().find(|n| n.is_leader)
    }

    pub fn node(&self, pool_id: &str) -> Option<&BubbleNode> {
        self.nodes.iter().find(|n| n.pool_id == pool_id)
    }
}

/// Pools that can be laid out: positive stake and metadata present. Everything
/// else is left out of the chart entirely.
fn layout_candidates(pools: &[StakePool]) -> Vec<(&StakePool, f64)> {
    pools
        .iter()
        .filter(|p| p.metadata.is_some())
        .filter_map(|p| {
            p.live_stake_ada()
                .filter(|stake| *stake > 0.0)
                .map(|stake| (p, stake))
        })
        .sorted_by(|a, b| b.1.total_cmp(&a.1))
        .collect()
}

fn scene_key(leaves: &[(&StakePool, f64)], current_leader: Option<&str>) -> u64 {
    let mut hasher = DefaultHasher::new();
    current_leader.hash(&mut hasher);
    for (pool, _) in leaves {
        pool.pool_id.hash(&mut hasher);
    }
    hasher.finish()
}

pub fn render(
    pools: &[StakePool],
    current_leader: Option<&str>,
    dark_mode: bool,
    viewport: &Viewport,
) -> RenderInstructions {
    let theme = Theme::for_mode(dark_mode);
    let max_blocks = pools.iter().map(|p| p.blocks_minted).max().unwrap_or(0);
    let scale = SequentialScale::new(0.0, max_blocks as f64);

    let leaves = layout_candidates(pools);
    let values: Vec<f64> = leaves.iter().map(|(_, stake)| *stake).collect();
    let circles = pack::pack(&values, viewport.width, viewport.height, viewport.padding);

    let nodes = leaves
        .iter()
        .zip(circles)
        .map(|((pool, stake), circle)| {
            let is_leader = current_leader == Some(pool.pool_id.as_str());
            let ticker = pool.ticker().unwrap_or(NO_TICKER).to_string();
            BubbleNode {
                pool_id: pool.pool_id.clone(),
                x: circle.x,
                y: circle.y,
                r: circle.r,
                value: *stake,
                fill: scale.color(pool.blocks_minted as f64),
                stroke: theme.stroke.to_string(),
                label: (circle.r >= MIN_LABEL_RADIUS && ticker != NO_TICKER)
                    .then(|| ticker.clone()),
                is_leader,
                hover: (!is_leader).then(|| HoverStyle {
                    stroke: theme.hover_stroke.to_string(),
                    stroke_width: 2.0,
                }),
                effects: is_leader.then(|| leader_effects(circle.r, &theme)),
                tooltip: Tooltip {
                    name: pool.display_name().to_string(),
                    ticker,
                    stake_ada: stake.round() as u64,
                    blocks_minted: pool.blocks_minted,
                    is_leader,
                },
            }
        })
        .collect();

    RenderInstructions {
        width: viewport.width,
        height: viewport.height,
        theme,
        zoom_extent: ZOOM_SCALE_EXTENT,
        max_blocks,
        scene_key: scene_key(&leaves, current_leader),
        nodes,
    }
}
