use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::UnitMixError;
use crate::types::Money;
use crate::UnitMixResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Residential unit type distinguished by the market-absorption table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    Studio,
    OneBedroom,
}

/// One row of the market-absorption table.
///
/// A band covers rents in (previous band's upper bound, `upper_rent_inclusive`];
/// the first band is open below. Capacities are the maximum number of units
/// the market will absorb at a rent inside the band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentBand {
    pub upper_rent_inclusive: Money,
    pub studio_capacity: u32,
    pub one_bedroom_capacity: u32,
}

/// Ordered, contiguous rent-band table. Static configuration: built once,
/// never mutated.
///
/// Bands are stored as ascending upper-bound breakpoints, so contiguity and
/// non-overlap hold by construction; `new` validates strict ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RentBand>", into = "Vec<RentBand>")]
pub struct CapacityTable {
    bands: Vec<RentBand>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl CapacityTable {
    /// Build a table from bands ordered by ascending upper rent bound.
    pub fn new(bands: Vec<RentBand>) -> UnitMixResult<Self> {
        if bands.is_empty() {
            return Err(UnitMixError::InvalidInput {
                field: "bands".into(),
                reason: "Capacity table requires at least one rent band".into(),
            });
        }

        for pair in bands.windows(2) {
            if pair[1].upper_rent_inclusive <= pair[0].upper_rent_inclusive {
                return Err(UnitMixError::InvalidInput {
                    field: "bands".into(),
                    reason: format!(
                        "Band upper bounds must be strictly ascending ({} follows {})",
                        pair[1].upper_rent_inclusive, pair[0].upper_rent_inclusive
                    ),
                });
            }
        }

        Ok(CapacityTable { bands })
    }

    /// The New Hope market table: four bands from the Class B absorption study.
    pub fn new_hope_default() -> Self {
        CapacityTable {
            bands: vec![
                RentBand {
                    upper_rent_inclusive: dec!(1499),
                    studio_capacity: 60,
                    one_bedroom_capacity: 75,
                },
                RentBand {
                    upper_rent_inclusive: dec!(1800),
                    studio_capacity: 55,
                    one_bedroom_capacity: 70,
                },
                RentBand {
                    upper_rent_inclusive: dec!(2100),
                    studio_capacity: 48,
                    one_bedroom_capacity: 65,
                },
                RentBand {
                    upper_rent_inclusive: dec!(2400),
                    studio_capacity: 42,
                    one_bedroom_capacity: 58,
                },
            ],
        }
    }

    pub fn bands(&self) -> &[RentBand] {
        &self.bands
    }

    /// Maximum leasable units the market absorbs at `rent`.
    ///
    /// Resolution scans bands in ascending order and takes the first band
    /// whose upper bound covers the rent. Rents above every band clamp to the
    /// last band: a deliberately conservative policy, since capacities shrink
    /// as rents rise.
    pub fn capacity_for(&self, rent: Money, unit_type: UnitType) -> u32 {
        let band = self
            .bands
            .iter()
            .find(|b| rent <= b.upper_rent_inclusive)
            .unwrap_or_else(|| self.bands.last().unwrap()); // non-empty validated in new()

        match unit_type {
            UnitType::Studio => band.studio_capacity,
            UnitType::OneBedroom => band.one_bedroom_capacity,
        }
    }
}

impl Default for CapacityTable {
    fn default() -> Self {
        CapacityTable::new_hope_default()
    }
}

impl TryFrom<Vec<RentBand>> for CapacityTable {
    type Error = UnitMixError;

    fn try_from(bands: Vec<RentBand>) -> Result<Self, Self::Error> {
        CapacityTable::new(bands)
    }
}

impl From<CapacityTable> for Vec<RentBand> {
    fn from(table: CapacityTable) -> Self {
        table.bands
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn table() -> CapacityTable {
        CapacityTable::new_hope_default()
    }

    #[test]
    fn test_band_boundaries_studio() {
        let t = table();
        assert_eq!(t.capacity_for(dec!(1499), UnitType::Studio), 60);
        assert_eq!(t.capacity_for(dec!(1500), UnitType::Studio), 55);
        assert_eq!(t.capacity_for(dec!(1800), UnitType::Studio), 55);
        assert_eq!(t.capacity_for(dec!(1801), UnitType::Studio), 48);
    }

    #[test]
    fn test_band_boundaries_one_bedroom() {
        let t = table();
        assert_eq!(t.capacity_for(dec!(1499), UnitType::OneBedroom), 75);
        assert_eq!(t.capacity_for(dec!(2000), UnitType::OneBedroom), 65);
        assert_eq!(t.capacity_for(dec!(2100), UnitType::OneBedroom), 65);
        assert_eq!(t.capacity_for(dec!(2101), UnitType::OneBedroom), 58);
    }

    #[test]
    fn test_clamp_to_top_band() {
        let t = table();
        let at_top = t.capacity_for(dec!(2400), UnitType::Studio);
        // Anything above the top bound resolves to the top band's capacity
        assert_eq!(t.capacity_for(dec!(2401), UnitType::Studio), at_top);
        assert_eq!(t.capacity_for(dec!(5000), UnitType::Studio), at_top);
        assert_eq!(t.capacity_for(dec!(99999), UnitType::Studio), at_top);
        assert_eq!(at_top, 42);

        assert_eq!(t.capacity_for(dec!(10000), UnitType::OneBedroom), 58);
    }

    #[test]
    fn test_zero_and_negative_rents_hit_first_band() {
        let t = table();
        assert_eq!(t.capacity_for(Decimal::ZERO, UnitType::Studio), 60);
        assert_eq!(t.capacity_for(dec!(-250), UnitType::Studio), 60);
        assert_eq!(t.capacity_for(dec!(-250), UnitType::OneBedroom), 75);
    }

    #[test]
    fn test_empty_table_rejected() {
        let result = CapacityTable::new(vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unordered_bands_rejected() {
        let result = CapacityTable::new(vec![
            RentBand {
                upper_rent_inclusive: dec!(1800),
                studio_capacity: 55,
                one_bedroom_capacity: 70,
            },
            RentBand {
                upper_rent_inclusive: dec!(1499),
                studio_capacity: 60,
                one_bedroom_capacity: 75,
            },
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_upper_bound_rejected() {
        let result = CapacityTable::new(vec![
            RentBand {
                upper_rent_inclusive: dec!(1800),
                studio_capacity: 55,
                one_bedroom_capacity: 70,
            },
            RentBand {
                upper_rent_inclusive: dec!(1800),
                studio_capacity: 48,
                one_bedroom_capacity: 65,
            },
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_single_band_table() {
        let t = CapacityTable::new(vec![RentBand {
            upper_rent_inclusive: dec!(2000),
            studio_capacity: 50,
            one_bedroom_capacity: 60,
        }])
        .unwrap();
        assert_eq!(t.capacity_for(dec!(1000), UnitType::Studio), 50);
        assert_eq!(t.capacity_for(dec!(9000), UnitType::OneBedroom), 60);
    }

    #[test]
    fn test_deserialize_validates_ordering() {
        let good = r#"[
            {"upper_rent_inclusive": "1499", "studio_capacity": 60, "one_bedroom_capacity": 75},
            {"upper_rent_inclusive": "1800", "studio_capacity": 55, "one_bedroom_capacity": 70}
        ]"#;
        let t: CapacityTable = serde_json::from_str(good).unwrap();
        assert_eq!(t.bands().len(), 2);

        let bad = r#"[
            {"upper_rent_inclusive": "1800", "studio_capacity": 55, "one_bedroom_capacity": 70},
            {"upper_rent_inclusive": "1499", "studio_capacity": 60, "one_bedroom_capacity": 75}
        ]"#;
        let result: Result<CapacityTable, _> = serde_json::from_str(bad);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_round_trip() {
        let t = table();
        let json = serde_json::to_string(&t).unwrap();
        let back: CapacityTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
