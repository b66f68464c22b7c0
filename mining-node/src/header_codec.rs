// The node's concrete block header: everything a real Chainweb client
// owns and the mining crate treats as an opaque buffer. Field layout
// mirrors a fixed-width PoW header: nonce and creation time first (the
// bytes the kernel mutates directly), then the fields the chain cares
// about.
use chainweb_mining_core::{DecodedHeader, HeaderCodec, HeaderView};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Total on-wire length of a header this node accepts.
pub const HEADER_LEN: usize = 80;

const CHAIN_ID_RANGE: std::ops::Range<usize> = 16..20;
const BLOCK_HEIGHT_RANGE: std::ops::Range<usize> = 20..28;
const TARGET_RANGE: std::ops::Range<usize> = 28..60;
const PARENT_HASH_RANGE: std::ops::Range<usize> = 60..80;

#[derive(Debug, Error)]
pub enum HeaderCodecError {
    #[error("expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// Fully decoded header, returned to HTTP clients once mined.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MinedHeader {
    pub nonce: u64,
    pub creation_time_micros: u64,
    pub chain_id: u32,
    pub block_height: u64,
    #[serde(with = "hex_32_array")]
    pub target: [u8; 32],
    #[serde(with = "hex_20_array")]
    pub parent_hash: [u8; 20],
}

#[derive(Clone, Default)]
pub struct ChainwebHeaderCodec;

impl HeaderCodec<MinedHeader> for ChainwebHeaderCodec {
    type Error = HeaderCodecError;

    fn decode_job(&self, bytes: &[u8]) -> Result<DecodedHeader, Self::Error> {
        let fields = self.fields(bytes)?;
        Ok(DecodedHeader {
            chain_id: fields.0,
            block_height: fields.1,
            target: chainweb_mining_core::HashTarget::from_bytes(fields.2),
        })
    }

    fn decode_header(&self, bytes: &[u8]) -> Result<MinedHeader, Self::Error> {
        let (chain_id, block_height, target) = self.fields(bytes)?;
        let mut owned = bytes.to_vec();
        let nonce = HeaderView::new(&mut owned).nonce();
        let mut parent_hash = [0u8; 20];
        parent_hash.copy_from_slice(&bytes[PARENT_HASH_RANGE]);
        Ok(MinedHeader {
            nonce,
            creation_time_micros: u64::from_le_bytes(bytes[8..16].try_into().unwrap()),
            chain_id,
            block_height,
            target,
            parent_hash,
        })
    }

    fn header_len(&self) -> usize {
        HEADER_LEN
    }
}

impl ChainwebHeaderCodec {
    fn fields(&self, bytes: &[u8]) -> Result<(u32, u64, [u8; 32]), HeaderCodecError> {
        if bytes.len() != HEADER_LEN {
            return Err(HeaderCodecError::WrongLength {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }
        let chain_id = u32::from_le_bytes(bytes[CHAIN_ID_RANGE].try_into().unwrap());
        let block_height = u64::from_le_bytes(bytes[BLOCK_HEIGHT_RANGE].try_into().unwrap());
        let mut target = [0u8; 32];
        target.copy_from_slice(&bytes[TARGET_RANGE]);
        Ok((chain_id, block_height, target))
    }
}

mod hex_32_array {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 32], D::Error> {
        let text = String::deserialize(d)?;
        let decoded = hex::decode(&text).map_err(serde::de::Error::custom)?;
        decoded
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
    }
}

mod hex_20_array {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 20], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 20], D::Error> {
        let text = String::deserialize(d)?;
        let decoded = hex::decode(&text).map_err(serde::de::Error::custom)?;
        decoded
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 20 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(chain_id: u32, height: u64, target: [u8; 32]) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_LEN];
        buf[CHAIN_ID_RANGE].copy_from_slice(&chain_id.to_le_bytes());
        buf[BLOCK_HEIGHT_RANGE].copy_from_slice(&height.to_le_bytes());
        buf[TARGET_RANGE].copy_from_slice(&target);
        buf
    }

    #[test]
    fn decode_job_reads_chain_id_height_and_target() {
        let codec = ChainwebHeaderCodec;
        let buf = header(7, 1000, [0xff; 32]);
        let decoded = codec.decode_job(&buf).unwrap();
        assert_eq!(decoded.chain_id, 7);
        assert_eq!(decoded.block_height, 1000);
    }

    #[test]
    fn decode_job_rejects_wrong_length() {
        let codec = ChainwebHeaderCodec;
        let err = codec.decode_job(&[0u8; 10]);
        assert!(err.is_err());
    }

    #[test]
    fn decode_header_round_trips_fields() {
        let codec = ChainwebHeaderCodec;
        let buf = header(2, 55, [0x11; 32]);
        let mined = codec.decode_header(&buf).unwrap();
        assert_eq!(mined.chain_id, 2);
        assert_eq!(mined.block_height, 55);
        assert_eq!(mined.target, [0x11; 32]);
    }
}
