//! Room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use streammate_protocol::{DisplayName, ProtocolError};

use crate::RoomError;

/// Default alphabet for room codes: uppercase letters and digits.
pub const DEFAULT_CODE_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Configuration shared by every room in a registry.
///
/// The defaults match the behavior clients expect: six-character codes,
/// ten draws before giving up, and no reconnection grace period (a
/// dropped connection is an immediate leave).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Number of characters in a room code.
    pub code_length: usize,

    /// Characters room codes are drawn from. Must be uppercase ASCII
    /// letters and digits, since client input is uppercased before lookup.
    pub code_alphabet: String,

    /// How many random codes to try before reporting
    /// [`RoomError::CapacityExceeded`].
    pub max_code_attempts: u32,

    /// How long a disconnected member keeps their seat.
    ///
    /// `Duration::ZERO` (the default) makes disconnect an immediate leave.
    /// Anything larger keeps the member in the room, marked disconnected,
    /// until they rejoin with their token or the grace period is swept.
    pub reconnect_grace: Duration,

    /// Smallest member set that can produce a match. Values below 2 are
    /// raised to 2: a lone member agreeing with themselves is not a match.
    pub min_match_size: usize,

    /// Maximum display-name length, in characters.
    pub max_display_name_len: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            code_alphabet: DEFAULT_CODE_ALPHABET.to_string(),
            max_code_attempts: 10,
            reconnect_grace: Duration::ZERO,
            min_match_size: 2,
            max_display_name_len: 32,
        }
    }
}

impl RoomConfig {
    /// The match-size floor actually applied.
    pub fn effective_min_match_size(&self) -> usize {
        self.min_match_size.max(2)
    }

    /// Returns `true` if disconnected members are held for reconnection.
    pub fn has_reconnect_grace(&self) -> bool {
        !self.reconnect_grace.is_zero()
    }

    /// Rejects display names longer than `max_display_name_len`.
    ///
    /// # Errors
    /// [`RoomError::Protocol`] wrapping [`ProtocolError::InvalidInput`].
    pub fn check_display_name(&self, name: &DisplayName) -> Result<(), RoomError> {
        if name.char_len() > self.max_display_name_len {
            return Err(ProtocolError::InvalidInput(format!(
                "display name is longer than {} characters",
                self.max_display_name_len
            ))
            .into());
        }
        Ok(())
    }

    /// Checks that the configuration can mint codes clients can type back.
    ///
    /// # Errors
    /// [`RoomError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<(), RoomError> {
        if self.code_length == 0 {
            return Err(RoomError::InvalidConfig(
                "code_length must be at least 1".into(),
            ));
        }
        if self.code_alphabet.is_empty() {
            return Err(RoomError::InvalidConfig(
                "code_alphabet is empty".into(),
            ));
        }
        if !self
            .code_alphabet
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(RoomError::InvalidConfig(
                "code_alphabet must contain only A-Z and 0-9".into(),
            ));
        }
        if self.max_code_attempts == 0 {
            return Err(RoomError::InvalidConfig(
                "max_code_attempts must be at least 1".into(),
            ));
        }
        if self.max_display_name_len == 0 {
            return Err(RoomError::InvalidConfig(
                "max_display_name_len must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.code_length, 6);
        assert_eq!(config.max_code_attempts, 10);
        assert_eq!(config.min_match_size, 2);
        assert!(!config.has_reconnect_grace());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_effective_min_match_size_has_floor_of_two() {
        let config = RoomConfig {
            min_match_size: 1,
            ..RoomConfig::default()
        };
        assert_eq!(config.effective_min_match_size(), 2);

        let config = RoomConfig {
            min_match_size: 3,
            ..RoomConfig::default()
        };
        assert_eq!(config.effective_min_match_size(), 3);
    }

    #[test]
    fn test_check_display_name_enforces_limit() {
        let config = RoomConfig {
            max_display_name_len: 3,
            ..RoomConfig::default()
        };
        assert!(config.check_display_name(&DisplayName::parse("bob").unwrap()).is_ok());
        assert!(matches!(
            config.check_display_name(&DisplayName::parse("alice").unwrap()),
            Err(RoomError::Protocol(ProtocolError::InvalidInput(_)))
        ));
    }

    #[test]
    fn test_validate_rejects_lowercase_alphabet() {
        let config = RoomConfig {
            code_alphabet: "abc".into(),
            ..RoomConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RoomError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_length_and_zero_attempts() {
        let zero_len = RoomConfig {
            code_length: 0,
            ..RoomConfig::default()
        };
        assert!(zero_len.validate().is_err());

        let zero_attempts = RoomConfig {
            max_code_attempts: 0,
            ..RoomConfig::default()
        };
        assert!(zero_attempts.validate().is_err());
    }
}
