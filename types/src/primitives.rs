use core::fmt::{Debug, Formatter, Result as FmtResult};

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use ssz::{
    depth_for_chunks, MerkleTree, ReadError, Size, SszHash, SszRead, SszSize, SszWrite,
    BYTES_PER_CHUNK,
};

pub use ethereum_types::H256;

pub type Slot = u64;
pub type ValidatorIndex = u64;
pub type UnixSeconds = u64;

pub const PUBLIC_KEY_SIZE: usize = 52;
pub const SIGNATURE_SIZE: usize = 3112;

/// An XMSS public key as raw bytes.
///
/// The consensus core never interprets these. Verification belongs to the
/// signature backend, which is wired in outside this workspace.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKeyBytes([u8; PUBLIC_KEY_SIZE]);

/// An XMSS signature as raw bytes. Like [`PublicKeyBytes`], entirely opaque here.
#[derive(Clone, PartialEq, Eq)]
pub struct SignatureBytes([u8; SIGNATURE_SIZE]);

impl Default for PublicKeyBytes {
    fn default() -> Self {
        Self([0; PUBLIC_KEY_SIZE])
    }
}

impl Default for SignatureBytes {
    fn default() -> Self {
        Self([0; SIGNATURE_SIZE])
    }
}

impl From<[u8; PUBLIC_KEY_SIZE]> for PublicKeyBytes {
    fn from(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<[u8; SIGNATURE_SIZE]> for SignatureBytes {
    fn from(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for PublicKeyBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for SignatureBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for PublicKeyBytes {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(formatter, "0x{}", hex::encode(self.0))
    }
}

impl Debug for SignatureBytes {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(formatter, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for PublicKeyBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl Serialize for SignatureBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for PublicKeyBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = deserialize_hex(deserializer)?;
        let bytes = <[u8; PUBLIC_KEY_SIZE]>::try_from(bytes.as_slice())
            .map_err(|_| D::Error::invalid_length(bytes.len(), &"52 bytes of hex"))?;
        Ok(Self(bytes))
    }
}

impl<'de> Deserialize<'de> for SignatureBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = deserialize_hex(deserializer)?;
        let bytes = <[u8; SIGNATURE_SIZE]>::try_from(bytes.as_slice())
            .map_err(|_| D::Error::invalid_length(bytes.len(), &"3112 bytes of hex"))?;
        Ok(Self(bytes))
    }
}

impl SszSize for PublicKeyBytes {
    const SIZE: Size = Size::Fixed {
        size: PUBLIC_KEY_SIZE,
    };
}

impl SszRead for PublicKeyBytes {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let mut value = Self::default();
        value.0.copy_from_slice(bytes);
        Ok(value)
    }
}

impl SszWrite for PublicKeyBytes {
    fn write_fixed(&self, bytes: &mut [u8]) {
        bytes.copy_from_slice(&self.0);
    }
}

impl SszHash for PublicKeyBytes {
    const PACKING_FACTOR: usize = 1;

    fn hash_tree_root(&self) -> H256 {
        let depth = depth_for_chunks(PUBLIC_KEY_SIZE.div_ceil(BYTES_PER_CHUNK));
        MerkleTree::merkleize_bytes(self.0, depth)
    }
}

impl SszSize for SignatureBytes {
    const SIZE: Size = Size::Fixed {
        size: SIGNATURE_SIZE,
    };
}

impl SszRead for SignatureBytes {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let mut value = Self::default();
        value.0.copy_from_slice(bytes);
        Ok(value)
    }
}

impl SszWrite for SignatureBytes {
    fn write_fixed(&self, bytes: &mut [u8]) {
        bytes.copy_from_slice(&self.0);
    }
}

impl SszHash for SignatureBytes {
    const PACKING_FACTOR: usize = 1;

    fn hash_tree_root(&self) -> H256 {
        let depth = depth_for_chunks(SIGNATURE_SIZE.div_ceil(BYTES_PER_CHUNK));
        MerkleTree::merkleize_bytes(self.0, depth)
    }
}

fn deserialize_hex<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let string = String::deserialize(deserializer)?;
    let digits = string.strip_prefix("0x").unwrap_or(&string);
    hex::decode(digits).map_err(D::Error::custom)
}
