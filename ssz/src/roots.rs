// `H256` corresponds to the `Bytes32` type from the SSZ specification.
// It is not a basic type, so it is not packed.

use ethereum_types::H256;

use crate::{
    error::ReadError,
    porcelain::{SszHash, SszRead, SszSize, SszWrite},
    size::Size,
};

impl SszSize for H256 {
    const SIZE: Size = Size::Fixed {
        size: Self::len_bytes(),
    };
}

impl SszRead for H256 {
    #[inline]
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        Ok(Self::from_slice(bytes))
    }
}

impl SszWrite for H256 {
    #[inline]
    fn write_fixed(&self, bytes: &mut [u8]) {
        bytes.copy_from_slice(self.as_bytes());
    }
}

impl SszHash for H256 {
    const PACKING_FACTOR: usize = 1;

    #[inline]
    fn hash_tree_root(&self) -> H256 {
        *self
    }
}
