//! Core value types shared by every Streammate layer.
//!
//! Most of these are "newtype wrappers" around a `String` or `u64`. The
//! wrapper buys two things: you can't pass a `RoomCode` where a
//! `ContentCategory` is expected, and each type owns the one place where
//! raw client input is validated and normalized.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The short, human-typeable code that identifies a live room.
///
/// Codes are generated by the room registry from a fixed alphabet
/// (uppercase letters and digits by default). Clients type them by hand,
/// so [`RoomCode::parse`] trims whitespace and uppercases before lookup.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Wraps an already-normalized code. Used by the registry when it
    /// mints a fresh code; client input should go through [`parse`](Self::parse).
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Validates and normalizes a code typed by a client.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidInput`] if the code is blank or contains
    /// anything other than ASCII letters and digits.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let code = input.trim();
        if code.is_empty() {
            return Err(ProtocolError::InvalidInput("room code is blank".into()));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ProtocolError::InvalidInput(format!(
                "room code {code:?} must be alphanumeric"
            )));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A member's identity within one room.
///
/// Allocated from a per-room counter that only ever moves forward, so an id
/// is never handed out twice during the room's lifetime, even after the
/// member who held it has left.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct MemberId(pub u64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

/// Opaque identifier for the transport connection a member is bound to.
///
/// Replaced on reconnect; the member's [`MemberId`] stays the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionHandle(u64);

impl ConnectionHandle {
    /// Creates a handle from a raw transport id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Secret issued at join time that lets a disconnected member reclaim
/// their identity.
///
/// `Debug` is redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RejoinToken(String);

impl RejoinToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RejoinToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RejoinToken(***)")
    }
}

/// A member's chosen display name, trimmed and non-blank.
///
/// Uniqueness is a room-level rule and is enforced there, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayName(String);

impl DisplayName {
    /// # Errors
    /// [`ProtocolError::InvalidInput`] if the name is blank after trimming.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let name = input.trim();
        if name.is_empty() {
            return Err(ProtocolError::InvalidInput(
                "display name is blank".into(),
            ));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// What kind of content a room swipes through ("movies", "tv", ...).
///
/// Stored lowercase so "Movies" and "movies" pick the same deck.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentCategory(String);

impl ContentCategory {
    /// # Errors
    /// [`ProtocolError::InvalidInput`] if the category is blank.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let category = input.trim();
        if category.is_empty() {
            return Err(ProtocolError::InvalidInput(
                "content category is blank".into(),
            ));
        }
        Ok(Self(category.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle to a deck produced by the content provider.
///
/// The core never looks inside; it only stores the handle once per room
/// and hands it back to clients, who resolve it through the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeckRef(String);

impl DeckRef {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeckRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ItemId: one canonical textual form
// ---------------------------------------------------------------------------

/// Identifier of a content item, in canonical textual form.
///
/// Item ids reach the server both as JSON numbers (`42`) and as strings
/// (`"42"`). If those were kept as-is, two accepts of "the same" item
/// would never compare equal and the match would never fire. Every
/// constructor funnels into one form:
///
/// - integers (and integral floats like `42.0`) → decimal text, `"42"`
/// - integer-looking strings (`"042"`, `"+42"`, `"42.00"`) → the same
///   decimal text a number would produce
/// - any other string → trimmed, otherwise untouched
///
/// Strings with a non-zero fraction or an exponent (`"42.5"`, `"4.2e1"`)
/// stay opaque: no numeric id can produce them, so nothing collides.
/// Blank strings and non-integral numbers are rejected.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// # Errors
    /// [`ProtocolError::InvalidInput`] if the id is blank after trimming.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let id = input.trim();
        if id.is_empty() {
            return Err(ProtocolError::InvalidInput("item id is blank".into()));
        }
        Ok(Self(canonical_integer(id).unwrap_or_else(|| id.to_string())))
    }

    /// Canonicalizes a floating-point id. Only finite, integral values
    /// name an item.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidInput`] for NaN, infinities, or fractions.
    pub fn from_f64(value: f64) -> Result<Self, ProtocolError> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(ProtocolError::InvalidInput(format!(
                "item id {value} is not an integer"
            )));
        }
        // 2^63 and 2^64 are exact in f64; the upper bounds are exclusive
        // so the casts below never saturate.
        const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
        const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

        if (-TWO_POW_63..TWO_POW_63).contains(&value) {
            Ok(Self::from(value as i64))
        } else if (0.0..TWO_POW_64).contains(&value) {
            Ok(Self::from(value as u64))
        } else {
            Err(ProtocolError::InvalidInput(format!(
                "item id {value} is out of range"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Decimal text for an optionally signed run of digits with an optional
/// all-zero fraction. `None` if `s` isn't shaped like an integer.
fn canonical_integer(s: &str) -> Option<String> {
    let (negative, unsigned) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let (digits, fraction) = match unsigned.split_once('.') {
        Some((digits, fraction)) => (digits, Some(fraction)),
        None => (unsigned, None),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(fraction) = fraction {
        if fraction.is_empty() || !fraction.bytes().all(|b| b == b'0') {
            return None;
        }
    }

    let digits = digits.trim_start_matches('0');
    Some(match (digits.is_empty(), negative) {
        (true, _) => "0".to_string(),
        (false, true) => format!("-{digits}"),
        (false, false) => digits.to_string(),
    })
}

impl FromStr for ItemId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

macro_rules! item_id_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ItemId {
                fn from(value: $t) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

item_id_from_int!(u32, u64, i32, i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whatever shape the id arrived in on the wire.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawItemId {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let id = match RawItemId::deserialize(d)? {
            RawItemId::Unsigned(v) => Ok(Self::from(v)),
            RawItemId::Signed(v) => Ok(Self::from(v)),
            RawItemId::Float(v) => Self::from_f64(v),
            RawItemId::Text(s) => Self::parse(&s),
        };
        id.map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// A swipe decision.
///
/// The canonical spellings are `accept` and `reject`. Older clients send
/// `right`/`left` (and some `like`/`dislike`), so those parse too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "right", alias = "like")]
    Accept,
    #[serde(alias = "left", alias = "dislike")]
    Reject,
}

impl Direction {
    pub fn is_accept(self) -> bool {
        matches!(self, Self::Accept)
    }
}

impl FromStr for Direction {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept" | "right" | "like" => Ok(Self::Accept),
            "reject" | "left" | "dislike" => Ok(Self::Reject),
            _ => Err(ProtocolError::InvalidDirection(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accept => f.write_str("accept"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- RoomCode ---------------------------------------------------------

    #[test]
    fn test_room_code_parse_trims_and_uppercases() {
        let code = RoomCode::parse("  ab12cd ").unwrap();
        assert_eq!(code.as_str(), "AB12CD");
    }

    #[test]
    fn test_room_code_parse_blank_is_invalid_input() {
        assert!(matches!(
            RoomCode::parse("   "),
            Err(ProtocolError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_room_code_parse_rejects_punctuation() {
        assert!(RoomCode::parse("AB-12").is_err());
    }

    // -- DisplayName / ContentCategory ------------------------------------

    #[test]
    fn test_display_name_parse_blank_is_invalid_input() {
        assert!(matches!(
            DisplayName::parse("\t \n"),
            Err(ProtocolError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_display_name_char_len_counts_characters() {
        let name = DisplayName::parse("Zoë").unwrap();
        assert_eq!(name.char_len(), 3);
    }

    #[test]
    fn test_content_category_parse_lowercases() {
        let category = ContentCategory::parse("Movies").unwrap();
        assert_eq!(category.as_str(), "movies");
    }

    #[test]
    fn test_rejoin_token_debug_is_redacted() {
        let token = RejoinToken::new("deadbeef");
        assert_eq!(format!("{token:?}"), "RejoinToken(***)");
    }

    // -- ItemId -----------------------------------------------------------

    #[test]
    fn test_item_id_number_and_string_are_equal() {
        assert_eq!(ItemId::from(42u64), ItemId::parse("42").unwrap());
        assert_eq!(ItemId::from(42i64), ItemId::parse(" 42 ").unwrap());
    }

    #[test]
    fn test_item_id_integral_float_is_canonical() {
        assert_eq!(ItemId::from_f64(42.0).unwrap(), ItemId::from(42u32));
    }

    #[test]
    fn test_item_id_fractional_float_is_rejected() {
        assert!(ItemId::from_f64(4.2).is_err());
        assert!(ItemId::from_f64(f64::NAN).is_err());
    }

    #[test]
    fn test_item_id_blank_is_rejected() {
        assert!(matches!(
            ItemId::parse(""),
            Err(ProtocolError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_item_id_deserializes_from_number_or_string() {
        let from_number: ItemId = serde_json::from_str("1399").unwrap();
        let from_string: ItemId = serde_json::from_str("\"1399\"").unwrap();
        let from_float: ItemId = serde_json::from_str("1399.0").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number, from_float);
        assert_eq!(serde_json::to_string(&from_number).unwrap(), "\"1399\"");
    }

    #[test]
    fn test_item_id_deserialize_blank_string_fails() {
        assert!(serde_json::from_str::<ItemId>("\"  \"").is_err());
    }

    #[test]
    fn test_item_id_integer_looking_strings_match_numbers() {
        assert_eq!(ItemId::parse("042").unwrap(), ItemId::from(42u64));
        assert_eq!(ItemId::parse("+42").unwrap(), ItemId::from(42u64));
        assert_eq!(ItemId::parse("42.0").unwrap(), ItemId::from_f64(42.0).unwrap());
        assert_eq!(ItemId::parse("-007").unwrap(), ItemId::from(-7i64));
        assert_eq!(ItemId::parse("-0").unwrap(), ItemId::from(0u64));
        assert_eq!(ItemId::parse("000").unwrap().as_str(), "0");
    }

    #[test]
    fn test_item_id_non_integer_strings_stay_opaque() {
        assert_eq!(ItemId::parse("42.5").unwrap().as_str(), "42.5");
        assert_eq!(ItemId::parse("4.2e1").unwrap().as_str(), "4.2e1");
        assert_eq!(ItemId::parse("42.").unwrap().as_str(), "42.");
        assert_eq!(ItemId::parse("tt0111161").unwrap().as_str(), "tt0111161");
        assert_eq!(ItemId::parse("-").unwrap().as_str(), "-");
    }

    #[test]
    fn test_item_id_from_f64_two_pow_63_does_not_saturate() {
        let id = ItemId::from_f64(9_223_372_036_854_775_808.0).unwrap();
        assert_eq!(id.as_str(), "9223372036854775808");
        assert_ne!(id, ItemId::from(i64::MAX));
    }

    #[test]
    fn test_item_id_from_f64_covers_u64_range_and_rejects_beyond() {
        assert_eq!(
            ItemId::from_f64(1.0e19).unwrap(),
            ItemId::from(10_000_000_000_000_000_000u64)
        );
        assert!(ItemId::from_f64(18_446_744_073_709_551_616.0).is_err());
        assert_eq!(
            ItemId::from_f64(-9_223_372_036_854_775_808.0).unwrap(),
            ItemId::from(i64::MIN)
        );
    }

    // -- Direction --------------------------------------------------------

    #[test]
    fn test_direction_parse_accepts_legacy_spellings() {
        assert_eq!("accept".parse::<Direction>().unwrap(), Direction::Accept);
        assert_eq!("RIGHT".parse::<Direction>().unwrap(), Direction::Accept);
        assert_eq!("left".parse::<Direction>().unwrap(), Direction::Reject);
        assert_eq!("dislike".parse::<Direction>().unwrap(), Direction::Reject);
    }

    #[test]
    fn test_direction_parse_unknown_is_invalid_direction() {
        assert_eq!(
            "up".parse::<Direction>(),
            Err(ProtocolError::InvalidDirection("up".into()))
        );
    }

    #[test]
    fn test_direction_deserializes_alias() {
        let d: Direction = serde_json::from_str("\"right\"").unwrap();
        assert_eq!(d, Direction::Accept);
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"accept\"");
    }
}
