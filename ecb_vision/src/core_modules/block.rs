// THEORY:
// The `Block` module is the most fundamental unit of the engine. A block is a
// fixed-size run of bytes cut from the input at a multiple of the block size, and
// it is a "dumb" data container: it borrows its bytes from the input buffer and
// knows nothing about how often it occurs or which color it gets.
//
// Key principles:
// 1.  **Identity is content**: two blocks are the same key exactly when their bytes
//     are equal. `Hash` and `Eq` come straight from the borrowed slice, so there is
//     no hex encoding and no allocation on lookup.
// 2.  **Borrowed, never copied**: the input is held read-only for the whole run,
//     so every block is a view into it, tied to its lifetime.
// 3.  **Whole blocks only**: `blocks` yields `len / blocksize` blocks; trailing
//     bytes that do not fill a block are not part of any block.

pub mod block {
    use std::fmt;

    /// A "dumb" view of one fixed-size block of the input buffer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Block<'a> {
        bytes: &'a [u8],
    }

    impl<'a> Block<'a> {
        pub fn new(bytes: &'a [u8]) -> Self {
            Self { bytes }
        }

        pub fn bytes(&self) -> &'a [u8] {
            self.bytes
        }

        pub fn len(&self) -> usize {
            self.bytes.len()
        }

        pub fn is_empty(&self) -> bool {
            self.bytes.is_empty()
        }

        /// Number of characters in the block's hex rendering.
        pub fn hex_width(&self) -> usize {
            self.bytes.len() * 2
        }
    }

    /// Lowercase hex, two characters per byte.
    impl fmt::Display for Block<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            for byte in self.bytes {
                write!(f, "{:02x}", byte)?;
            }
            Ok(())
        }
    }

    /// Iterates over the whole blocks of `data`, in order.
    pub fn blocks(data: &[u8], blocksize: usize) -> impl Iterator<Item = Block<'_>> {
        data.chunks_exact(blocksize).map(Block::new)
    }
}
