use serde::Serialize;

use super::Theme;

pub const GLOW_FILTER_ID: &str = "leader-glow";

const STARBURST_RINGS: [(f64, u32, u64); 3] = [(1.25, 12, 8_000), (1.5, 18, 12_000), (1.75, 24, 16_000)];

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StarburstRing {
    pub radius: f64,
    pub rays: u32,
    pub ray_length: f64,
    pub stroke: String,
    pub rotation_period_ms: u64,
    pub clockwise: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PulseRing {
    pub from_radius: f64,
    pub to_radius: f64,
    pub duration_ms: u64,
    pub stroke: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shimmer {
    pub min_opacity: f64,
    pub max_opacity: f64,
    pub period_ms: u64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GlowFilter {
    pub id: String,
    pub std_deviation: f64,
    pub color: String,
}

/// Decorations for the pool that produced the latest block. Rebuilt from
/// scratch whenever the scene changes.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderEffects {
    pub starburst: Vec<StarburstRing>,
    pub pulse: PulseRing,
    pub glow: GlowFilter,
    pub shimmer: Shimmer,
}

pub fn leader_effects(radius: f64, theme: &Theme) -> LeaderEffects {
    let starburst = STARBURST_RINGS
        .iter()
        .enumerate()
        .map(|(i, &(scale, rays, period))| StarburstRing {
            radius: radius * scale,
            rays,
            ray_length: radius * 0.2,
            stroke: theme.leader_accent.to_string(),
            rotation_period_ms: period,
            clockwise: i % 2 == 0,
        })
        .collect();

    LeaderEffects {
        starburst,
        pulse: PulseRing {
            from_radius: radius,
            to_radius: radius * 2.0,
            duration_ms: 2_000,
            stroke: theme.leader_accent.to_string(),
        },
        glow: GlowFilter {
            id: GLOW_FILTER_ID.to_string(),
            std_deviation: (radius * 0.15).clamp(4.0, 12.0),
            color: theme.leader_accent.to_string(),
        },
        shimmer: Shimmer {
            min_opacity: 0.7,
            max_opacity: 1.0,
            period_ms: 1_500,
        },
    }
}
