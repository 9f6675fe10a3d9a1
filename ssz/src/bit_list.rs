use core::{
    fmt::{Debug, Formatter, Result as FmtResult},
    marker::PhantomData,
    ops::{Deref, DerefMut},
};

use bitvec::{slice::BitSlice, vec::BitVec};
use ethereum_types::H256;
use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use typenum::Unsigned;

use crate::{
    consts::BITS_PER_BYTE,
    error::{ReadError, WriteError},
    merkle_tree::{depth_for_chunks, mix_in_length, MerkleTree},
    porcelain::{SszHash, SszRead, SszSize, SszWrite},
    size::Size,
};

/// A growable bit sequence with a type-level maximum length.
///
/// The wire form appends a single delimiting bit after the data bits, so the
/// empty bit list is the single byte `0x01`, not zero bytes.
///
/// We rely on `bitvec::order::Lsb0` being the default bit ordering to
/// implement SSZ correctly.
pub struct BitList<N> {
    bits: BitVec<u8>,
    phantom: PhantomData<N>,
}

impl<N> Clone for BitList<N> {
    fn clone(&self) -> Self {
        Self {
            bits: self.bits.clone(),
            phantom: PhantomData,
        }
    }
}

impl<N> PartialEq for BitList<N> {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<N> Eq for BitList<N> {}

impl<N> Default for BitList<N> {
    fn default() -> Self {
        Self {
            bits: BitVec::new(),
            phantom: PhantomData,
        }
    }
}

impl<N> Deref for BitList<N> {
    type Target = BitSlice<u8>;

    fn deref(&self) -> &Self::Target {
        &self.bits
    }
}

impl<N> DerefMut for BitList<N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.bits
    }
}

// This sort of code arguably belongs in an impl of `core::fmt::Binary` rather
// than `Debug`, but bit lists are never formatted directly and a `Debug` impl
// is needed anyway.
impl<N> Debug for BitList<N> {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        formatter.write_str("0b")?;

        for bit in self.bits.iter().by_vals() {
            formatter.write_str(if bit { "1" } else { "0" })?;
        }

        Ok(())
    }
}

impl<N> Serialize for BitList<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut ssz_bytes = vec![];
        self.write_variable(&mut ssz_bytes)
            .map_err(S::Error::custom)?;
        serializer.serialize_str(&format!("0x{}", hex::encode(ssz_bytes)))
    }
}

impl<'de, N: Unsigned> Deserialize<'de> for BitList<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = String::deserialize(deserializer)?;
        let digits = string.strip_prefix("0x").unwrap_or(&string);
        let bytes = hex::decode(digits).map_err(D::Error::custom)?;
        Self::from_ssz(bytes).map_err(D::Error::custom)
    }
}

impl<N> SszSize for BitList<N> {
    const SIZE: Size = Size::Variable { minimum_size: 1 };
}

impl<N: Unsigned> SszRead for BitList<N> {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let length = Self::measure_length(bytes)?;
        let bytes = bytes[..bytes_without_delimiting_bit(length)].to_vec();
        Ok(Self::from_vec_with_length(bytes, length))
    }
}

impl<N> SszWrite for BitList<N> {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        let length = self.bits.len();
        let length_before = bytes.len();
        let length_after = length_before + bytes_with_delimiting_bit(length);

        bytes.resize(length_after, 0);

        let new_bytes = &mut bytes[length_before..];

        new_bytes[..bytes_without_delimiting_bit(length)]
            .copy_from_slice(self.bits.as_raw_slice());
        new_bytes[length / BITS_PER_BYTE] |= 1 << (length % BITS_PER_BYTE);

        Ok(())
    }
}

impl<N: Unsigned> SszHash for BitList<N> {
    const PACKING_FACTOR: usize = 1;

    fn hash_tree_root(&self) -> H256 {
        let depth = depth_for_chunks(N::USIZE.div_ceil(BITS_PER_BYTE * H256::len_bytes()));
        let root = MerkleTree::merkleize_bytes(self.bits.as_raw_slice(), depth);
        mix_in_length(root, self.bits.len())
    }
}

impl<N> BitList<N> {
    #[must_use]
    pub fn with_length(length: usize) -> Self
    where
        N: Unsigned,
    {
        Self::new(false, length)
    }

    #[must_use]
    pub fn new(value: bool, length: usize) -> Self
    where
        N: Unsigned,
    {
        assert!(length <= N::USIZE);

        let mut bits = BitVec::new();
        bits.resize(length, value);

        Self {
            bits,
            phantom: PhantomData,
        }
    }

    /// Returns the bit at `index`, or `false` when `index` is past the end.
    ///
    /// Out-of-range reads stand for slots whose bits have not been appended yet.
    #[must_use]
    pub fn get_bit(&self, index: usize) -> bool {
        self.bits.get(index).map(|bit| *bit).unwrap_or_default()
    }

    /// Sets the bit at `index`, extending the list with zero bits as needed.
    pub fn set_or_grow(&mut self, index: usize, value: bool)
    where
        N: Unsigned,
    {
        assert!(index < N::USIZE);

        if index >= self.bits.len() {
            self.bits.resize(index + 1, false);
        }

        self.bits.set(index, value);
    }

    fn measure_length(bytes: &[u8]) -> Result<usize, ReadError>
    where
        N: Unsigned,
    {
        let leading_zeros_in_last_byte = bytes
            .last()
            .ok_or(ReadError::BitListEmptySlice)?
            .leading_zeros()
            .try_into()
            .expect("number of bits in a byte should fit in usize");

        let data_bits_in_last_byte = (BITS_PER_BYTE - 1)
            .checked_sub(leading_zeros_in_last_byte)
            .ok_or(ReadError::BitListNoDelimitingBit)?;

        let maximum = N::USIZE;
        let actual = (bytes.len() - 1) * BITS_PER_BYTE + data_bits_in_last_byte;

        if actual > maximum {
            return Err(ReadError::BitListTooLong { maximum, actual });
        }

        Ok(actual)
    }

    fn from_vec_with_length(bytes: Vec<u8>, length: usize) -> Self {
        let mut bits = BitVec::from_vec(bytes);
        bits.truncate(length);
        bits.set_uninitialized(false);

        Self {
            bits,
            phantom: PhantomData,
        }
    }
}

const fn bytes_without_delimiting_bit(length: usize) -> usize {
    length.div_ceil(BITS_PER_BYTE)
}

const fn bytes_with_delimiting_bit(length: usize) -> usize {
    length.saturating_add(1).div_ceil(BITS_PER_BYTE)
}
