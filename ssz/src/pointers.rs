use ethereum_types::H256;

use crate::{
    error::WriteError,
    porcelain::{SszHash, SszSize, SszWrite},
    size::Size,
};

impl<T: SszSize> SszSize for &T {
    const SIZE: Size = T::SIZE;
}

impl<T: SszWrite> SszWrite for &T {
    fn write_fixed(&self, bytes: &mut [u8]) {
        (*self).write_fixed(bytes);
    }

    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        (*self).write_variable(bytes)
    }
}

impl<T: SszHash> SszHash for &T {
    const PACKING_FACTOR: usize = T::PACKING_FACTOR;

    fn hash_tree_root(&self) -> H256 {
        (*self).hash_tree_root()
    }
}
