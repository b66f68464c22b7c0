// Chainweb version enumeration and its wire/text codecs.
//
// A closed set of symbolic network identifiers. The wire tag is part of the
// network's stable encoding; text form is used in config files and CLI
// flags. Both round-trip exactly.
use crate::error::{MiningError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainwebVersion {
    Test,
    Simulation,
    Testnet00,
}

impl Default for ChainwebVersion {
    fn default() -> Self {
        ChainwebVersion::Testnet00
    }
}

impl Serialize for ChainwebVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_text())
    }
}

impl<'de> Deserialize<'de> for ChainwebVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        ChainwebVersion::from_text(&text).map_err(serde::de::Error::custom)
    }
}

impl ChainwebVersion {
    /// Stable 32-bit little-endian wire tag.
    pub fn wire_tag(self) -> u32 {
        match self {
            ChainwebVersion::Test => 0x0000_0000,
            ChainwebVersion::Simulation => 0x0000_0001,
            ChainwebVersion::Testnet00 => 0x0000_0002,
        }
    }

    /// Decode a wire tag. Unknown tags fail.
    pub fn from_wire_tag(tag: u32) -> Result<Self> {
        match tag {
            0x0000_0000 => Ok(ChainwebVersion::Test),
            0x0000_0001 => Ok(ChainwebVersion::Simulation),
            0x0000_0002 => Ok(ChainwebVersion::Testnet00),
            other => Err(MiningError::UnknownVersionTag(other)),
        }
    }

    pub fn encode_wire(self) -> [u8; 4] {
        self.wire_tag().to_le_bytes()
    }

    pub fn decode_wire(bytes: [u8; 4]) -> Result<Self> {
        Self::from_wire_tag(u32::from_le_bytes(bytes))
    }

    /// Exact, case-sensitive textual form.
    pub fn as_text(self) -> &'static str {
        match self {
            ChainwebVersion::Test => "test",
            ChainwebVersion::Simulation => "simulation",
            ChainwebVersion::Testnet00 => "testnet00",
        }
    }

    pub fn from_text(text: &str) -> Result<Self> {
        match text {
            "test" => Ok(ChainwebVersion::Test),
            "simulation" => Ok(ChainwebVersion::Simulation),
            "testnet00" => Ok(ChainwebVersion::Testnet00),
            other => Err(MiningError::UnknownVersionName(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_round_trip() {
        for v in [
            ChainwebVersion::Test,
            ChainwebVersion::Simulation,
            ChainwebVersion::Testnet00,
        ] {
            assert_eq!(ChainwebVersion::decode_wire(v.encode_wire()).unwrap(), v);
        }
    }

    #[test]
    fn text_round_trip() {
        for v in [
            ChainwebVersion::Test,
            ChainwebVersion::Simulation,
            ChainwebVersion::Testnet00,
        ] {
            assert_eq!(ChainwebVersion::from_text(v.as_text()).unwrap(), v);
        }
    }

    #[test]
    fn wire_tags_are_stable_constants() {
        assert_eq!(ChainwebVersion::Test.encode_wire(), [0x00, 0x00, 0x00, 0x00]);
        assert_eq!(
            ChainwebVersion::Simulation.encode_wire(),
            [0x01, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            ChainwebVersion::Testnet00.encode_wire(),
            [0x02, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn unknown_wire_tag_fails() {
        assert!(matches!(
            ChainwebVersion::from_wire_tag(0x0000_0003),
            Err(MiningError::UnknownVersionTag(3))
        ));
    }

    #[test]
    fn unknown_text_fails() {
        assert!(ChainwebVersion::from_text("testnet01").is_err());
    }
}
