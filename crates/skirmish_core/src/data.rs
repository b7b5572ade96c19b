//! Data-driven unit definitions.
//!
//! This module contains only data types and parsing from strings; reading
//! roster files from disk is left to the headless runner.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkirmishError};
use crate::unit::UnitClass;

/// Stats and cost for one unit class.
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     class: Knight,
///     health: 50,
///     attack: 15,
///     defense: 10,
///     range: 1,
///     speed: 4,
///     cost: 3,
///     trait_name: "Defender",
///     trait_description: "Takes reduced damage from ranged attacks",
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitData {
    /// Class this definition applies to.
    pub class: UnitClass,
    /// Maximum health points.
    pub health: u32,
    /// Attack stat.
    pub attack: u32,
    /// Defense stat.
    pub defense: u32,
    /// Manhattan attack/heal radius.
    pub range: u32,
    /// Turn-order key.
    pub speed: u32,
    /// Budget cost to deploy.
    pub cost: u32,
    /// Trait label shown to players.
    #[serde(default)]
    pub trait_name: String,
    /// Trait description shown to players.
    #[serde(default)]
    pub trait_description: String,
}

/// Catalogue holding exactly one [`UnitData`] per [`UnitClass`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<UnitData>", into = "Vec<UnitData>")]
pub struct UnitRoster {
    /// One entry per class, in `UnitClass::ALL` order.
    units: Vec<UnitData>,
}

impl UnitRoster {
    /// The canonical unit stats.
    #[must_use]
    pub fn standard() -> Self {
        #[allow(clippy::too_many_arguments)]
        fn def(
            class: UnitClass,
            health: u32,
            attack: u32,
            defense: u32,
            range: u32,
            speed: u32,
            cost: u32,
            trait_name: &str,
            trait_description: &str,
        ) -> UnitData {
            UnitData {
                class,
                health,
                attack,
                defense,
                range,
                speed,
                cost,
                trait_name: trait_name.to_string(),
                trait_description: trait_description.to_string(),
            }
        }

        let units = vec![
            def(UnitClass::Knight, 50, 15, 10, 1, 4, 3, "Defender", "Takes reduced damage from ranged attacks"),
            def(UnitClass::Archer, 35, 12, 5, 5, 1, 2, "Sharpshooter", "Increased damage against low DEF targets"),
            def(UnitClass::Mage, 30, 6, 3, 5, 2, 4, "Arcane", "AOE damage to up to 2 targets"),
            def(UnitClass::Healer, 28, 4, 4, 3, 2, 3, "Support", "Heals allies for 10 HP"),
            def(UnitClass::Goblin, 30, 10, 3, 1, 3, 2, "Swift", "High speed for early attacks"),
            def(UnitClass::Ogre, 60, 20, 8, 1, 2, 4, "Brute", "High HP and ATK, but slower"),
        ];

        Self { units }
    }

    /// Parse a roster from a RON list of [`UnitData`].
    pub fn from_ron_str(ron_text: &str) -> Result<Self> {
        let units: Vec<UnitData> =
            ron::from_str(ron_text).map_err(|e| SkirmishError::DataParseError(e.to_string()))?;
        Self::try_from(units)
    }

    /// Serialize the roster to pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(&self.units, ron::ser::PrettyConfig::default())
            .map_err(|e| SkirmishError::DataParseError(e.to_string()))
    }

    /// Definition for a class.
    #[must_use]
    pub fn get(&self, class: UnitClass) -> &UnitData {
        &self.units[Self::slot(class)]
    }

    /// Deployment cost of a class.
    #[must_use]
    pub fn cost(&self, class: UnitClass) -> u32 {
        self.get(class).cost
    }

    /// Iterate over every definition in class order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitData> {
        self.units.iter()
    }

    fn slot(class: UnitClass) -> usize {
        match class {
            UnitClass::Knight => 0,
            UnitClass::Archer => 1,
            UnitClass::Mage => 2,
            UnitClass::Healer => 3,
            UnitClass::Goblin => 4,
            UnitClass::Ogre => 5,
        }
    }
}

impl Default for UnitRoster {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<UnitData>> for UnitRoster {
    type Error = SkirmishError;

    fn try_from(units: Vec<UnitData>) -> Result<Self> {
        let mut slots: Vec<Option<UnitData>> = vec![None; UnitClass::ALL.len()];
        for data in units {
            let slot = &mut slots[Self::slot(data.class)];
            if slot.is_some() {
                return Err(SkirmishError::DataParseError(format!(
                    "duplicate definition for {}",
                    data.class
                )));
            }
            *slot = Some(data);
        }

        let units = slots
            .into_iter()
            .zip(UnitClass::ALL)
            .map(|(slot, class)| {
                slot.ok_or_else(|| {
                    SkirmishError::DataParseError(format!("missing definition for {class}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { units })
    }
}

impl From<UnitRoster> for Vec<UnitData> {
    fn from(roster: UnitRoster) -> Self {
        roster.units
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_roster_stats() {
        let roster = UnitRoster::standard();
        let knight = roster.get(UnitClass::Knight);
        assert_eq!(
            (knight.health, knight.attack, knight.defense, knight.range, knight.speed),
            (50, 15, 10, 1, 4)
        );
        assert_eq!(roster.cost(UnitClass::Mage), 4);
        assert_eq!(roster.get(UnitClass::Archer).range, 5);
        assert_eq!(roster.get(UnitClass::Healer).trait_name, "Support");

        for class in UnitClass::ALL {
            assert_eq!(roster.get(class).class, class);
        }
    }

    #[test]
    fn test_roster_ron_round_trip() {
        let roster = UnitRoster::standard();
        let text = roster.to_ron_string().unwrap();
        let parsed = UnitRoster::from_ron_str(&text).unwrap();
        assert_eq!(parsed, roster);
    }

    #[test]
    fn test_roster_missing_class_rejected() {
        let text = r#"[
            UnitData(class: Knight, health: 50, attack: 15, defense: 10, range: 1, speed: 4, cost: 3),
        ]"#;
        let err = UnitRoster::from_ron_str(text).unwrap_err();
        assert!(matches!(err, SkirmishError::DataParseError(msg) if msg.contains("Archer")));
    }

    #[test]
    fn test_roster_duplicate_class_rejected() {
        let mut units: Vec<UnitData> = UnitRoster::standard().into();
        units.push(units[0].clone());
        assert!(UnitRoster::try_from(units).is_err());
    }

    #[test]
    fn test_malformed_ron_rejected() {
        assert!(matches!(
            UnitRoster::from_ron_str("not ron at all ["),
            Err(SkirmishError::DataParseError(_))
        ));
    }
}
