//! Unit types and the per-type difficulty profile
//!
//! The profile is loaded once per session and never mutated afterwards.
//! Type names are parsed into [`UnitType`] at load time; every bad entry is
//! collected into a single [`ProfileError::InvalidEntries`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Difficulty assumed for unit types missing from the profile
pub const DEFAULT_DIFFICULTY: f64 = 1.0;

/// Hostile unit types the host world can spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    Zombie,
    Husk,
    Drowned,
    Skeleton,
    Stray,
    Spider,
    CaveSpider,
    Creeper,
    Witch,
    Pillager,
    Vindicator,
    Evoker,
    Ravager,
    Blaze,
    Enderman,
    Phantom,
}

impl UnitType {
    pub const ALL: [UnitType; 16] = [
        UnitType::Zombie,
        UnitType::Husk,
        UnitType::Drowned,
        UnitType::Skeleton,
        UnitType::Stray,
        UnitType::Spider,
        UnitType::CaveSpider,
        UnitType::Creeper,
        UnitType::Witch,
        UnitType::Pillager,
        UnitType::Vindicator,
        UnitType::Evoker,
        UnitType::Ravager,
        UnitType::Blaze,
        UnitType::Enderman,
        UnitType::Phantom,
    ];

    /// Unit composed when no difficulty profile is available
    pub const FALLBACK: UnitType = UnitType::Zombie;

    /// Canonical configuration key
    pub fn key(&self) -> &'static str {
        match self {
            UnitType::Zombie => "ZOMBIE",
            UnitType::Husk => "HUSK",
            UnitType::Drowned => "DROWNED",
            UnitType::Skeleton => "SKELETON",
            UnitType::Stray => "STRAY",
            UnitType::Spider => "SPIDER",
            UnitType::CaveSpider => "CAVE_SPIDER",
            UnitType::Creeper => "CREEPER",
            UnitType::Witch => "WITCH",
            UnitType::Pillager => "PILLAGER",
            UnitType::Vindicator => "VINDICATOR",
            UnitType::Evoker => "EVOKER",
            UnitType::Ravager => "RAVAGER",
            UnitType::Blaze => "BLAZE",
            UnitType::Enderman => "ENDERMAN",
            UnitType::Phantom => "PHANTOM",
        }
    }

    /// Human-readable name used in unit labels
    pub fn display_name(&self) -> &'static str {
        match self {
            UnitType::Zombie => "Zombie",
            UnitType::Husk => "Husk",
            UnitType::Drowned => "Drowned",
            UnitType::Skeleton => "Skeleton",
            UnitType::Stray => "Stray",
            UnitType::Spider => "Spider",
            UnitType::CaveSpider => "Cave Spider",
            UnitType::Creeper => "Creeper",
            UnitType::Witch => "Witch",
            UnitType::Pillager => "Pillager",
            UnitType::Vindicator => "Vindicator",
            UnitType::Evoker => "Evoker",
            UnitType::Ravager => "Ravager",
            UnitType::Blaze => "Blaze",
            UnitType::Enderman => "Enderman",
            UnitType::Phantom => "Phantom",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown unit type '{0}'")]
pub struct UnknownUnitType(pub String);

impl FromStr for UnitType {
    type Err = UnknownUnitType;

    /// Case-insensitive; spaces and dashes are accepted in place of underscores
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();

        UnitType::ALL
            .iter()
            .copied()
            .find(|unit| unit.key() == normalized)
            .ok_or_else(|| UnknownUnitType(s.to_string()))
    }
}

/// Difficulty profile loading errors
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Failed to read difficulty profile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed difficulty profile: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid difficulty profile entries: {}", .0.join(", "))]
    InvalidEntries(Vec<String>),
}

/// Immutable mapping from unit type to difficulty score
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DifficultyProfile {
    scores: HashMap<UnitType, f64>,
    /// Profiled types in a stable order, used as the composer's candidate pool
    unit_types: Vec<UnitType>,
}

impl DifficultyProfile {
    /// Profile with no entries; composition falls back to a uniform wave
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in scores used when no profile file is configured
    pub fn builtin() -> Self {
        Self::from_scores([
            (UnitType::Zombie, 1.0),
            (UnitType::Husk, 1.1),
            (UnitType::Drowned, 1.2),
            (UnitType::Skeleton, 1.3),
            (UnitType::Stray, 1.5),
            (UnitType::Spider, 1.4),
            (UnitType::CaveSpider, 1.7),
            (UnitType::Creeper, 2.0),
            (UnitType::Pillager, 2.2),
            (UnitType::Witch, 2.6),
            (UnitType::Vindicator, 3.0),
            (UnitType::Blaze, 3.2),
            (UnitType::Phantom, 3.4),
            (UnitType::Enderman, 3.6),
            (UnitType::Evoker, 4.5),
            (UnitType::Ravager, 6.0),
        ])
    }

    /// Build from already-typed scores
    ///
    /// Callers are expected to pass positive, finite scores; [`Self::from_entries`]
    /// is the validating constructor.
    pub fn from_scores(scores: impl IntoIterator<Item = (UnitType, f64)>) -> Self {
        let scores: HashMap<UnitType, f64> = scores.into_iter().collect();
        let mut unit_types: Vec<UnitType> = scores.keys().copied().collect();
        unit_types.sort();
        Self { scores, unit_types }
    }

    /// Parse raw name/score pairs, collecting every invalid entry
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a serde_json::Value)>,
    ) -> Result<Self, ProfileError> {
        let mut scores = Vec::new();
        let mut invalid = Vec::new();

        for (name, value) in entries {
            let unit = match name.parse::<UnitType>() {
                Ok(unit) => unit,
                Err(_) => {
                    invalid.push(format!("{} (unknown unit type)", name));
                    continue;
                }
            };

            match value.as_f64() {
                Some(score) if score.is_finite() && score > 0.0 => scores.push((unit, score)),
                _ => invalid.push(format!("{}={} (difficulty must be a positive number)", name, value)),
            }
        }

        if !invalid.is_empty() {
            return Err(ProfileError::InvalidEntries(invalid));
        }

        Ok(Self::from_scores(scores))
    }

    /// Parse a JSON object of `"UNIT_TYPE": score` pairs
    pub fn from_json_str(json: &str) -> Result<Self, ProfileError> {
        let table: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        Self::from_entries(table.iter().map(|(name, value)| (name.as_str(), value)))
    }

    /// Load a JSON profile from disk
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let json = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Resolve the session profile from an optional path
    ///
    /// No path yields the built-in profile. A path that fails to load is
    /// logged and yields the empty profile, which makes the composer fall
    /// back to a uniform wave.
    pub fn load_or_empty(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::builtin();
        };

        match Self::load(path) {
            Ok(profile) => {
                info!(
                    "Loaded difficulty profile {} ({} unit types)",
                    path.display(),
                    profile.len()
                );
                profile
            }
            Err(e) => {
                error!("{}; waves will use the fallback unit only", e);
                Self::empty()
            }
        }
    }

    /// Difficulty score for a unit type (absent entries score 1.0)
    pub fn difficulty(&self, unit: UnitType) -> f64 {
        self.scores.get(&unit).copied().unwrap_or(DEFAULT_DIFFICULTY)
    }

    /// Profiled unit types in a stable order
    pub fn unit_types(&self) -> &[UnitType] {
        &self.unit_types
    }

    pub fn is_empty(&self) -> bool {
        self.unit_types.is_empty()
    }

    pub fn len(&self) -> usize {
        self.unit_types.len()
    }

    /// Average difficulty of a pick list (0 for an empty list)
    pub fn average(&self, picks: &[UnitType]) -> f64 {
        if picks.is_empty() {
            return 0.0;
        }
        picks.iter().map(|unit| self.difficulty(*unit)).sum::<f64>() / picks.len() as f64
    }
}
