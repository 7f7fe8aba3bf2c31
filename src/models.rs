use serde::{Deserialize, Deserializer, Serialize};

pub const UNKNOWN_POOL: &str = "Unknown Pool";
pub const LOVELACE_PER_ADA: f64 = 1_000_000.0;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PoolMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl PoolMetadata {
    /// Pools that never registered metadata still answer the metadata call,
    /// just with every field null.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.ticker.is_none()
            && self.homepage.is_none()
            && self.location.is_none()
    }
}

/// One registered stake pool, as returned by `/pools/{id}` and enriched with
/// `/pools/{id}/metadata`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StakePool {
    pub pool_id: String,
    #[serde(default)]
    pub hex: String,
    #[serde(default)]
    pub vrf_key: String,
    #[serde(default)]
    pub blocks_minted: u64,
    #[serde(default)]
    pub blocks_epoch: u64,
    #[serde(default)]
    pub live_stake: String, // Lovelace, integer encoded as a string
    #[serde(default)]
    pub active_stake: String, // Lovelace, integer encoded as a string
    #[serde(default)]
    pub live_size: f64,
    #[serde(default)]
    pub live_saturation: f64,
    #[serde(default)]
    pub live_delegators: u64,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PoolMetadata>,
}

impl StakePool {
    pub fn display_name(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_POOL)
    }

    pub fn ticker(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.ticker.as_deref())
    }

    /// Live stake converted from lovelace to whole-unit ADA. `None` when the
    /// upstream sent an empty or non-numeric amount.
    pub fn live_stake_ada(&self) -> Option<f64> {
        let lovelace: u128 = self.live_stake.trim().parse().ok()?;
        Some(lovelace as f64 / LOVELACE_PER_ADA)
    }
}

/// Reads an explicit `null` the same way as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BlockSummary {
    pub height: u64, // Number of blocks from genesis, unique per chain
    #[serde(default)]
    pub slot: Option<u64>,
    #[serde(default)]
    pub epoch: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub time: i64, // Unix timestamp
    #[serde(default, deserialize_with = "null_as_default")]
    pub hash: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slot_leader: String, // Pool id of the block producer
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct EpochSummary {
    pub epoch: u64,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub end_time: i64,
    #[serde(default)]
    pub block_count: u64,
    #[serde(default)]
    pub tx_count: u64,
    #[serde(default)]
    pub active_stake: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back() {
        let mut pool = StakePool {
            pool_id: "pool1abc".to_string(),
            ..Default::default()
        };
        assert_eq!(pool.display_name(), UNKNOWN_POOL);

        pool.metadata = Some(PoolMetadata {
            name: Some("".to_string()),
            ..Default::default()
        });
        assert_eq!(pool.display_name(), UNKNOWN_POOL);

        pool.metadata = Some(PoolMetadata {
            name: Some("Bubble Pool".to_string()),
            ..Default::default()
        });
        assert_eq!(pool.display_name(), "Bubble Pool");
    }

    #[test]
    fn test_live_stake_ada() {
        let pool = StakePool {
            pool_id: "pool1abc".to_string(),
            live_stake: "5000000".to_string(),
            ..Default::default()
        };
        assert_eq!(pool.live_stake_ada(), Some(5.0));

        let pool = StakePool {
            live_stake: "not a number".to_string(),
            ..pool
        };
        assert_eq!(pool.live_stake_ada(), None);
    }

    #[test]
    fn test_pool_ignores_unknown_fields() {
        let pool: StakePool = serde_json::from_value(serde_json::json!({
            "pool_id": "pool1xyz",
            "hex": "0f29",
            "vrf_key": "vrf",
            "blocks_minted": 12,
            "blocks_epoch": 1,
            "live_stake": "5000000",
            "active_stake": "4000000",
            "live_size": 0.001,
            "live_saturation": 0.2,
            "live_delegators": 7,
            "declared_pledge": "100",
            "owners": ["stake1u"]
        }))
        .unwrap();
        assert_eq!(pool.blocks_minted, 12);
        assert!(!pool.active);
        assert!(pool.metadata.is_none());
    }

    #[test]
    fn test_block_tolerates_null_fields() {
        let block: BlockSummary = serde_json::from_str(
            r#"{"height":9,"slot":null,"epoch":null,"time":null,"hash":null,"slot_leader":null}"#,
        )
        .unwrap();
        assert_eq!(block.height, 9);
        assert_eq!(block.time, 0);
        assert_eq!(block.hash, "");
        assert_eq!(block.slot_leader, "");
        assert_eq!(block.slot, None);

        let block: BlockSummary = serde_json::from_str(r#"{"height":10}"#).unwrap();
        assert_eq!(block, BlockSummary { height: 10, ..Default::default() });
    }
}
