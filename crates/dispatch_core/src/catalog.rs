//! Clue catalog: the ordered trail of audio clues for a case.
//!
//! Each clue is anchored to the block the caller is actually in and an
//! acceptance radius around it. A catalog is validated once when it is
//! built; after that every id in `1..=len` is guaranteed to resolve.

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};
use crate::grid::GridPos;
use crate::math::{fixed_decimal, Fixed};

/// One clue in the trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    /// 1-based position in the trail.
    pub id: u32,
    /// Block the caller is in while this clue plays.
    pub true_location: GridPos,
    /// Maximum distance (in blocks) at which an arriving unit counts as a hit.
    #[serde(with = "fixed_decimal")]
    pub acceptance_radius: Fixed,
    /// What the caller says.
    #[serde(default)]
    pub transcript: String,
    /// Short title for the clue list.
    #[serde(default)]
    pub description: String,
    /// Operator hint.
    #[serde(default)]
    pub hint: String,
}

impl Clue {
    /// Whether a unit arriving at `destination` finds the caller.
    ///
    /// The acceptance disk is closed: a destination exactly on the radius
    /// is a hit.
    #[must_use]
    pub fn accepts(&self, destination: GridPos) -> bool {
        let dist_sq = Fixed::saturating_from_num(self.true_location.distance_squared(destination));
        dist_sq <= self.acceptance_radius.saturating_mul(self.acceptance_radius)
    }
}

/// Ordered, validated list of clues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Clue>", into = "Vec<Clue>")]
pub struct ClueCatalog {
    clues: Vec<Clue>,
}

impl ClueCatalog {
    /// Build a catalog, checking that ids run `1..=n` in order, every
    /// location is on the map and no radius is negative.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidCatalog`] describing the first
    /// problem found.
    pub fn new(clues: Vec<Clue>) -> Result<Self> {
        if clues.is_empty() {
            return Err(DispatchError::InvalidCatalog(
                "catalog has no clues".to_string(),
            ));
        }

        for (index, clue) in clues.iter().enumerate() {
            let expected = u32::try_from(index + 1)
                .map_err(|_| DispatchError::InvalidCatalog("too many clues".to_string()))?;
            if clue.id != expected {
                return Err(DispatchError::InvalidCatalog(format!(
                    "clue at position {} has id {}, expected {}",
                    index + 1,
                    clue.id,
                    expected
                )));
            }
            if !clue.true_location.in_bounds() {
                return Err(DispatchError::InvalidCatalog(format!(
                    "clue {} location {} is off the map",
                    clue.id, clue.true_location
                )));
            }
            if clue.acceptance_radius < Fixed::ZERO {
                return Err(DispatchError::InvalidCatalog(format!(
                    "clue {} has negative radius {}",
                    clue.id, clue.acceptance_radius
                )));
            }
        }

        Ok(Self { clues })
    }

    /// Number of clues in the trail.
    #[must_use]
    pub fn len(&self) -> u32 {
        // new() rejects catalogs whose length does not fit in u32
        #[allow(clippy::cast_possible_truncation)]
        let len = self.clues.len() as u32;
        len
    }

    /// Always false; catalogs hold at least one clue.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clues.is_empty()
    }

    /// Id of the final clue.
    #[must_use]
    pub fn last_id(&self) -> u32 {
        self.len()
    }

    /// Look up a clue by id.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Clue> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.clues.get(index)
    }

    /// Look up a clue that must exist.
    ///
    /// # Panics
    ///
    /// Panics if `id` is outside `1..=len`. Session state only ever holds
    /// ids handed out by this catalog, so this indicates a corrupted session.
    #[must_use]
    pub fn clue(&self, id: u32) -> &Clue {
        self.get(id).unwrap_or_else(|| {
            panic!(
                "clue {} not in catalog of {} clues; session state is corrupt",
                id,
                self.len()
            )
        })
    }

    /// Iterate clues in trail order.
    pub fn iter(&self) -> impl Iterator<Item = &Clue> {
        self.clues.iter()
    }
}

impl Default for ClueCatalog {
    /// The built-in case: five calls from a motel basement off Highway 19.
    fn default() -> Self {
        let motel = GridPos::new(17, 13);
        let clue = |id: u32, radius: i32, transcript: &str, description: &str, hint: &str| Clue {
            id,
            true_location: motel,
            acceptance_radius: Fixed::from_num(radius),
            transcript: transcript.to_string(),
            description: description.to_string(),
            hint: hint.to_string(),
        };

        Self {
            clues: vec![
                clue(
                    1,
                    4,
                    "Hello? Can you hear me? I need help. My name is Ana. I think I've been \
                     abducted. I'm in a basement now, I think. I can't see anything. But I hear \
                     crickets... lots of them.",
                    "Initial distress call",
                    "Rural area with lots of crickets; she's in a basement",
                ),
                clue(
                    2,
                    3,
                    "Someone has a TV on upstairs. It's the local news. The anchorman just said \
                     something about Route... 19? 9? Something like that.",
                    "Local news mentions a highway",
                    "Still in the basement, near Highway 19",
                ),
                clue(
                    3,
                    2,
                    "Do you hear that? The bells? What is that?",
                    "Cow bells nearby",
                    "Basement near Highway 19, close to a dairy farm",
                ),
                clue(
                    4,
                    2,
                    "Someone's arguing. A man. He's saying he booked a room. What does that mean?",
                    "Argument about a booked room",
                    "Motel basement near Highway 19 and the farm",
                ),
                clue(
                    5,
                    1,
                    "He's coming downstairs. I think he heard me. Please hel-",
                    "Final transmission cut short by a train",
                    "Motel basement by Highway 19, the farm and the railroad",
                ),
            ],
        }
    }
}

impl TryFrom<Vec<Clue>> for ClueCatalog {
    type Error = DispatchError;

    fn try_from(clues: Vec<Clue>) -> Result<Self> {
        Self::new(clues)
    }
}

impl From<ClueCatalog> for Vec<Clue> {
    fn from(catalog: ClueCatalog) -> Self {
        catalog.clues
    }
}
