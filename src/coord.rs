use core::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A position inside a block template.
///
/// Rows and columns are 0-indexed. Internally the engine only ever works with
/// this structured value; the two string forms exist solely at the
/// persistence and expression boundaries:
/// - `"row-col"` keys (merge pointers, visual style keys), see [`Coord::key`]
/// - `r<row>c<col>` tokens inside calculated expressions, see [`Coord::token`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Encode as a `"row-col"` key (e.g. `3-7`).
    pub fn key(self) -> String {
        format!("{}-{}", self.row, self.col)
    }

    /// Decode a `"row-col"` key. Anything else yields `None`.
    pub fn parse_key(key: &str) -> Option<Self> {
        let (r, c) = key.split_once('-')?;
        Some(Self::new(parse_index(r)?, parse_index(c)?))
    }

    /// Encode as an expression token (e.g. `r3c7`).
    pub fn token(self) -> String {
        format!("r{}c{}", self.row, self.col)
    }

    /// Decode an `r<row>c<col>` expression token.
    pub fn parse_token(token: &str) -> Option<Self> {
        let rest = token.strip_prefix('r')?;
        let (r, c) = rest.split_once('c')?;
        Some(Self::new(parse_index(r)?, parse_index(c)?))
    }

    /// Translate into a coordinate system whose origin is `origin`.
    ///
    /// Returns `None` when `self` lies above or left of the origin.
    pub fn relative_to(self, origin: Coord) -> Option<Self> {
        Some(Self::new(
            self.row.checked_sub(origin.row)?,
            self.col.checked_sub(origin.col)?,
        ))
    }

    pub fn offset_by(self, origin: Coord) -> Self {
        Self::new(self.row + origin.row, self.col + origin.col)
    }
}

fn parse_index(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.col)
    }
}

impl Serialize for Coord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}

struct CoordKeyVisitor;

impl Visitor<'_> for CoordKeyVisitor {
    type Value = Coord;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a \"row-col\" coordinate key")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Coord::parse_key(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

impl<'de> Deserialize<'de> for Coord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(CoordKeyVisitor)
    }
}

/// Deserialize an optional `"row-col"` pointer, treating an unparseable
/// string as absent rather than rejecting the whole document.
pub(crate) fn lenient_key<'de, D>(deserializer: D) -> Result<Option<Coord>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Coord::parse_key))
}
