// These are re-exported primarily to make hand-written impls in `types` work
// without additional dependencies.
pub use ethereum_types::H256;
pub use typenum;

pub use crate::{
    bit_list::BitList,
    consts::{Endianness, Offset, BITS_PER_BYTE, BYTES_PER_CHUNK, BYTES_PER_LENGTH_OFFSET},
    contiguous_list::ContiguousList,
    error::{PushError, ReadError, WriteError},
    merkle_tree::{depth_for_chunks, mix_in_length, MerkleTree},
    porcelain::{SszHash, SszRead, SszSize, SszWrite},
    shared::{read_offset, subslice, write_offset},
    size::Size,
};

mod basic;
mod bit_list;
mod consts;
mod contiguous_list;
mod error;
mod merkle_tree;
mod pointers;
mod porcelain;
mod roots;
mod shared;
mod size;
