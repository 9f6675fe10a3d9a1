use core::{
    fmt::{Debug, Formatter, Result as FmtResult},
    marker::PhantomData,
    ops::{Deref, DerefMut},
};

use ethereum_types::H256;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use typenum::Unsigned;

use crate::{
    error::{PushError, ReadError, WriteError},
    merkle_tree::{depth_for_chunks, mix_in_length, MerkleTree},
    porcelain::{SszHash, SszRead, SszSize, SszWrite},
    shared,
    size::Size,
};

/// A homogeneous list with a type-level maximum length.
///
/// Unlike an SSZ vector, the length is part of the value. The list grows up to
/// the maximum; `push` past it fails. This corresponds to `List[T, N]` from the
/// SSZ specification.
pub struct ContiguousList<T, N> {
    elements: Vec<T>,
    phantom: PhantomData<N>,
}

impl<T: Clone, N> Clone for ContiguousList<T, N> {
    fn clone(&self) -> Self {
        Self::new_unchecked(self.elements.clone())
    }
}

impl<T: PartialEq, N> PartialEq for ContiguousList<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl<T: Eq, N> Eq for ContiguousList<T, N> {}

impl<T: Debug, N> Debug for ContiguousList<T, N> {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        self.elements.fmt(formatter)
    }
}

impl<T, N> Default for ContiguousList<T, N> {
    fn default() -> Self {
        Self::new_unchecked(vec![])
    }
}

impl<T, N> Deref for ContiguousList<T, N> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.elements
    }
}

impl<T, N> DerefMut for ContiguousList<T, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.elements
    }
}

impl<T, N> AsRef<[T]> for ContiguousList<T, N> {
    fn as_ref(&self) -> &[T] {
        &self.elements
    }
}

impl<T, N: Unsigned> TryFrom<Vec<T>> for ContiguousList<T, N> {
    type Error = ReadError;

    fn try_from(vec: Vec<T>) -> Result<Self, Self::Error> {
        Self::validate_length(vec.len())?;
        Ok(Self::new_unchecked(vec))
    }
}

impl<T, N> IntoIterator for ContiguousList<T, N> {
    type Item = T;
    type IntoIter = <Vec<T> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'list, T, N> IntoIterator for &'list ContiguousList<T, N> {
    type Item = &'list T;
    type IntoIter = <&'list [T] as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Serialize, N> Serialize for ContiguousList<T, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T: Deserialize<'de>, N: Unsigned> Deserialize<'de> for ContiguousList<T, N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let elements = Vec::deserialize(deserializer)?;
        elements.try_into().map_err(D::Error::custom)
    }
}

impl<T: SszSize, N> SszSize for ContiguousList<T, N> {
    const SIZE: Size = Size::Variable { minimum_size: 0 };
}

impl<T: SszRead, N: Unsigned> SszRead for ContiguousList<T, N> {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let results = shared::read_list(bytes)?;
        itertools::process_results(results, |elements| Self::try_from_iter(elements))?
    }
}

impl<T: SszWrite, N> SszWrite for ContiguousList<T, N> {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        shared::write_list(bytes, self)
    }
}

impl<T: SszHash + SszWrite, N: Unsigned> SszHash for ContiguousList<T, N> {
    const PACKING_FACTOR: usize = 1;

    fn hash_tree_root(&self) -> H256 {
        let root = if T::PACKING_FACTOR == 1 {
            let chunks = self.iter().map(SszHash::hash_tree_root);
            MerkleTree::merkleize_chunks(chunks, depth_for_chunks(N::USIZE))
        } else {
            let depth = depth_for_chunks(N::USIZE.div_ceil(T::PACKING_FACTOR));
            MerkleTree::merkleize_packed(self, depth)
        };

        mix_in_length(root, self.len())
    }
}

impl<T, N> ContiguousList<T, N> {
    pub fn try_from_iter(elements: impl IntoIterator<Item = T>) -> Result<Self, ReadError>
    where
        N: Unsigned,
    {
        let elements = Vec::from_iter(elements);
        Self::validate_length(elements.len())?;
        Ok(Self::new_unchecked(elements))
    }

    pub fn push(&mut self, element: T) -> Result<(), PushError>
    where
        N: Unsigned,
    {
        if self.elements.len() >= N::USIZE {
            return Err(PushError::ListFull);
        }

        self.elements.push(element);

        Ok(())
    }

    const fn validate_length(actual: usize) -> Result<(), ReadError>
    where
        N: Unsigned,
    {
        let maximum = N::USIZE;

        if actual > maximum {
            return Err(ReadError::ListTooLong { maximum, actual });
        }

        Ok(())
    }

    fn new_unchecked(elements: Vec<T>) -> Self {
        Self {
            elements,
            phantom: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use typenum::{U2, U4};

    use super::*;

    #[test]
    fn push_fails_when_the_list_is_full() {
        let mut list = ContiguousList::<u64, U2>::default();

        assert_eq!(list.push(1), Ok(()));
        assert_eq!(list.push(2), Ok(()));
        assert_eq!(list.push(3), Err(PushError::ListFull));
        assert_eq!(list.as_ref(), [1, 2]);
    }

    #[test]
    fn try_from_rejects_overlong_vectors() {
        assert_eq!(
            ContiguousList::<u64, U2>::try_from(vec![1, 2, 3]),
            Err(ReadError::ListTooLong {
                maximum: 2,
                actual: 3,
            }),
        );
    }

    #[test]
    fn fixed_size_elements_round_trip() -> Result<(), WriteError> {
        let list = ContiguousList::<u64, U4>::try_from(vec![1, 2, 3]).expect("length is below maximum");
        let bytes = list.to_ssz()?;

        assert_eq!(bytes.len(), 24);
        assert_eq!(ContiguousList::from_ssz(&bytes), Ok(list));

        Ok(())
    }

    #[test]
    fn decoding_rejects_trailing_bytes() {
        let mut bytes = ContiguousList::<u64, U4>::try_from(vec![1, 2])
            .expect("length is below maximum")
            .to_ssz()
            .expect("offsets fit in u32");

        bytes.push(0);

        ContiguousList::<u64, U4>::from_ssz(&bytes).expect_err("trailing byte is not a valid u64");
    }

    #[test]
    fn empty_list_encodes_to_no_bytes() {
        let list = ContiguousList::<u64, U4>::default();

        assert_eq!(list.to_ssz(), Ok(vec![]));
        assert_eq!(ContiguousList::from_ssz([]), Ok(list));
    }
}
