// Here's a visual aid to help understand the algorithms used here:
// ```text
//                                                  ┊
// height 4                                         0
//                              ┌───────────────────┴───────────────────┐
// height 3                     0                                       1
//                    ┌─────────┴─────────┐                   ┌─────────┴─────────┐
// height 2           0                   1                   2                   3
//               ┌────┴────┐         ┌────┴────┐         ┌────┴────┐         ┌────┴────┐
// height 1      0         1         2         3         4         5         6         7
//             ┌─┴─┐     ┌─┴─┐     ┌─┴─┐     ┌─┴─┐     ┌─┴─┐     ┌─┴─┐     ┌─┴─┐     ┌─┴─┐
// height 0    0   1     2   3     4   5     6   7     8   9    10   11   12   13   14   15
// ```
//
// The tree is never materialized. Chunks are pushed in order and only one
// sibling hash per height is retained. Subtrees to the right of the last chunk
// are padded virtually with `ZERO_HASHES`.

use ethereum_types::H256;
use hashing::ZERO_HASHES;

use crate::{
    consts::BYTES_PER_CHUNK,
    porcelain::{SszHash, SszWrite},
};

pub struct MerkleTree {
    // The elements of `sibling_hashes` are initialized to 0x00…00.
    // The initial values are meaningless and never used as long as chunks are
    // pushed in order. The length of the vector is the depth of the tree.
    sibling_hashes: Box<[H256]>,
}

impl MerkleTree {
    #[must_use]
    pub fn with_depth(depth: usize) -> Self {
        assert!(depth < ZERO_HASHES.len());

        Self {
            sibling_hashes: vec![H256::zero(); depth].into(),
        }
    }

    pub fn merkleize_bytes(bytes: impl AsRef<[u8]>, depth: usize) -> H256 {
        let chunks = bytes.as_ref().chunks(BYTES_PER_CHUNK).map(|partial_chunk| {
            let mut chunk = H256::zero();
            chunk[..partial_chunk.len()].copy_from_slice(partial_chunk);
            chunk
        });

        Self::merkleize_chunks(chunks, depth)
    }

    pub fn merkleize_packed<T: SszHash + SszWrite>(values: &[T], depth: usize) -> H256 {
        let size = T::SIZE.fixed_part();

        let chunks = values.chunks(T::PACKING_FACTOR).map(|pack| {
            let mut chunk = H256::zero();

            chunk
                .as_bytes_mut()
                .chunks_exact_mut(size)
                .zip(pack)
                .for_each(|(destination, element)| element.write_fixed(destination));

            chunk
        });

        Self::merkleize_chunks(chunks, depth)
    }

    pub fn merkleize_chunks(
        chunks: impl IntoIterator<
            IntoIter = impl DoubleEndedIterator<Item = H256> + ExactSizeIterator<Item = H256>,
        >,
        depth: usize,
    ) -> H256 {
        let mut chunks = chunks.into_iter();

        match chunks.next_back() {
            Some(last_chunk) => {
                let last_index = chunks.len();

                let mut merkle_tree = Self::with_depth(depth);

                for (index, chunk) in chunks.enumerate() {
                    merkle_tree.push(index, chunk);
                }

                merkle_tree.push_and_compute_root(last_index, last_chunk)
            }
            None => ZERO_HASHES[depth],
        }
    }

    fn push(&mut self, index: usize, chunk: H256) -> (usize, H256) {
        let depth = self.sibling_hashes.len();

        assert!(index < 1 << depth);

        let sibling_to_update = binary_carry_sequence(index);

        let mut hash = chunk;

        for height in 0..sibling_to_update {
            hash = hashing::hash_256_256(self.sibling_hashes[height], hash);
        }

        if sibling_to_update < depth {
            self.sibling_hashes[sibling_to_update] = hash;
        }

        (sibling_to_update, hash)
    }

    fn push_and_compute_root(&mut self, index: usize, chunk: H256) -> H256 {
        let depth = self.sibling_hashes.len();
        let (updated_sibling, mut hash) = self.push(index, chunk);

        // `self.sibling_hashes[updated_sibling]` will not be accessed during this loop.
        // The first iteration always takes the else branch.
        for height in updated_sibling..depth {
            if index >> height & 1 == 1 {
                hash = hashing::hash_256_256(self.sibling_hashes[height], hash);
            } else {
                hash = hashing::hash_256_256(hash, ZERO_HASHES[height]);
            }
        }

        hash
    }
}

/// Depth of a Merkle tree with room for `max_chunk_count` chunks.
#[must_use]
pub const fn depth_for_chunks(max_chunk_count: usize) -> usize {
    max_chunk_count.next_power_of_two().trailing_zeros() as usize
}

/// [`mix_in_length`](https://github.com/ethereum/consensus-specs/blob/4c54bddb6cd144ca8a0a01b7155f43b295c70458/ssz/simple-serialize.md#merkleization)
#[must_use]
pub fn mix_in_length(root: H256, length: usize) -> H256 {
    hashing::hash_256_256(root, hash_of_length(length))
}

fn hash_of_length(length: usize) -> H256 {
    let mut hash = H256::zero();
    hash[..size_of::<u64>()].copy_from_slice(&(length as u64).to_le_bytes());
    hash
}

// One element of `MerkleTree.sibling_hashes` has to be updated for later calculations
// every time a chunk is added (except for the last one). This calculates the position
// of that element. See:
// - <https://oeis.org/A007814>
// - <https://mathworld.wolfram.com/BinaryCarrySequence.html>
fn binary_carry_sequence(index: usize) -> usize {
    (index + 1)
        .trailing_zeros()
        .try_into()
        .expect("number of bits in usize should fit in usize")
}
