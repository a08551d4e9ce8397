/*!
Block based arena allocator.

[`Heap`] hands out sub-regions of large blocks and never frees them one at a
time. All memory is released at once by [`Heap::clean_all`] or when the heap
is dropped. [`Heap::reset`] rewinds the cursor to the first block without
releasing anything, so a heap that is reset between batches of similar size
stops asking the system allocator for memory after the first few batches.

```text
blocks:  [ B0 ][ B1 ][  B2 (oversized)  ][ B3 ]
                  ^ current, position
```

Allocating through `&self` is allowed, and the returned memory stays valid
until the heap is reset, cleaned or dropped, all of which need `&mut self`.
A heap can move between threads, but cannot be shared by them.
*/

use std::{
    alloc::{self, Layout},
    cell::{Cell, RefCell},
    ffi::c_long,
    mem,
    ptr::{self, NonNull},
    slice, str,
};

/// Size of the blocks created by a new heap, in bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 256_000;

/// Alignment of a `long` field placed after a single byte. This is the
/// alignment the host actually uses for such fields, which is not always
/// the size of the type.
fn long_alignment() -> usize {
    #[allow(dead_code)]
    #[repr(C)]
    struct Probe {
        pad: u8,
        value: c_long,
    }
    mem::offset_of!(Probe, value)
}

fn round_up(n: usize, align: usize) -> usize {
    match n % align {
        0 => n,
        rem => n
            .checked_add(align - rem)
            .expect("Heap allocation size overflows usize"),
    }
}

struct Block {
    data: NonNull<u8>,
    layout: Layout,
}

// SAFETY: A block exclusively owns its buffer, nothing else points into it
// except allocations borrowed from the owning heap.
unsafe impl Send for Block {}

impl Block {
    fn new(size: usize, align: usize) -> Self {
        let layout = Layout::from_size_align(size.max(align), align)
            .expect("Heap block size overflows the address space");
        // SAFETY: The layout has a non-zero size.
        let data = unsafe { alloc::alloc(layout) };
        let data = NonNull::new(data).unwrap_or_else(|| alloc::handle_alloc_error(layout));
        Block { data, layout }
    }

    fn size(&self) -> usize {
        self.layout.size()
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        // SAFETY: `data` was allocated in `Block::new` with this layout.
        unsafe { alloc::dealloc(self.data.as_ptr(), self.layout) }
    }
}

/// The blocks and the allocation cursor.
#[derive(Default)]
struct Chain {
    blocks: Vec<Block>,
    current: Option<usize>,
    position: usize,
}

impl Chain {
    /// Carve `size` bytes aligned to `align` out of the current block, if they
    /// fit.
    fn bump(&mut self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let block = &self.blocks[self.current?];
        let base = block.data.as_ptr().addr();
        let start = (base + self.position).next_multiple_of(align) - base;
        let end = start.checked_add(size)?;
        if end > block.size() {
            return None;
        }
        self.position = end;
        // SAFETY: `start <= end <= block.size()`, so the pointer stays inside
        // the block's buffer.
        Some(unsafe { block.data.add(start) })
    }

    /// Move the cursor to the start of a block with at least `block_size`
    /// bytes. The next block is reused if it is large enough, otherwise a new
    /// block is appended after the last one.
    fn add(&mut self, block_size: usize, alignment: usize) {
        self.position = 0;
        let reusable = self
            .current
            .map(|c| c + 1)
            .filter(|next| self.blocks.get(*next).is_some_and(|b| b.size() >= block_size));
        match reusable {
            Some(next) => {
                log::debug!("Heap reusing block {next} for a {block_size} byte request");
                self.current = Some(next);
            }
            None => {
                self.blocks.push(Block::new(block_size, alignment));
                self.current = Some(self.blocks.len() - 1);
                log::debug!(
                    "Heap allocated block {} of {} bytes",
                    self.blocks.len() - 1,
                    block_size
                );
            }
        }
    }
}

/// Arena allocator that carves allocations out of a list of blocks.
pub struct Heap {
    chain: RefCell<Chain>,
    block_size: usize,
    alignment: usize,
    num_allocations: Cell<usize>,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    /// Create an empty heap that creates blocks of [`DEFAULT_BLOCK_SIZE`]
    /// bytes.
    pub fn new() -> Self {
        Self::with_block_size(DEFAULT_BLOCK_SIZE)
    }

    /// Create an empty heap that creates blocks of `block_size` bytes. No
    /// memory is allocated until the first allocation.
    pub fn with_block_size(block_size: usize) -> Self {
        Heap {
            chain: RefCell::new(Chain::default()),
            block_size,
            alignment: long_alignment(),
            num_allocations: Cell::new(0),
        }
    }

    /// Every allocation starts at an offset from the start of its block that
    /// is a multiple of this, and occupies a multiple of this many bytes.
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Change the size of blocks created from now on. Existing blocks keep
    /// their size.
    pub fn set_block_size(&mut self, block_size: usize) {
        self.block_size = block_size;
    }

    pub fn num_blocks(&self) -> usize {
        self.chain.borrow().blocks.len()
    }

    /// Number of allocations served since the heap was created or last
    /// cleaned. Resetting does not change this.
    pub fn num_allocations(&self) -> usize {
        self.num_allocations.get()
    }

    /// Total number of bytes held by all blocks.
    pub fn capacity(&self) -> usize {
        self.chain.borrow().blocks.iter().map(Block::size).sum()
    }

    /// Allocate `n` bytes.
    ///
    /// The request is rounded up to a multiple of [`Heap::alignment`]. If the
    /// current block cannot hold it, the cursor moves to a block of at least
    /// `max(block_size, n)` bytes. The memory is uninitialized and is valid
    /// until the heap is reset, cleaned or dropped. If the system allocator
    /// fails, the process is aborted.
    pub fn allocate(&self, n: usize) -> NonNull<u8> {
        self.allocate_layout(
            Layout::from_size_align(n, 1).expect("Heap allocation size overflows isize"),
        )
    }

    /// Allocate memory for `layout`. Alignments larger than
    /// [`Heap::alignment`] are honored by padding inside the block.
    pub fn allocate_layout(&self, layout: Layout) -> NonNull<u8> {
        let align = layout.align().max(self.alignment);
        let size = round_up(layout.size(), self.alignment);
        self.num_allocations.set(self.num_allocations.get() + 1);
        let mut chain = self.chain.borrow_mut();
        if let Some(ptr) = chain.bump(size, align) {
            return ptr;
        }
        // Blocks start aligned to `self.alignment`, so this much padding is
        // always enough to reach `align`.
        let needed = size
            .checked_add(align - self.alignment)
            .expect("Heap allocation size overflows usize");
        chain.add(self.block_size.max(needed), self.alignment);
        match chain.bump(size, align) {
            Some(ptr) => ptr,
            None => alloc::handle_alloc_error(layout),
        }
    }

    /// Copy `src` into the heap.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice_copy<T: Copy>(&self, src: &[T]) -> &mut [T] {
        let dst = self.allocate_layout(Layout::for_value(src)).cast::<T>();
        // SAFETY: `dst` is aligned for `T` and spans `src.len()` elements of
        // memory that no other allocation overlaps. It stays valid for as long
        // as `self` is borrowed, because reclaiming it needs `&mut self`.
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), src.len());
            slice::from_raw_parts_mut(dst.as_ptr(), src.len())
        }
    }

    /// Allocate `len` copies of `value` in the heap.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice_fill_copy<T: Copy>(&self, len: usize, value: T) -> &mut [T] {
        let layout = Layout::array::<T>(len).expect("Heap allocation size overflows isize");
        let dst = self.allocate_layout(layout).cast::<T>();
        // SAFETY: Same as `alloc_slice_copy`. Every element is written before
        // the slice is created.
        unsafe {
            for i in 0..len {
                dst.as_ptr().add(i).write(value);
            }
            slice::from_raw_parts_mut(dst.as_ptr(), len)
        }
    }

    /// Copy the string into the heap. The copy is followed by a NUL byte, so
    /// its pointer can also be handed out as a C string.
    pub fn string_duplicate(&self, s: &str) -> &str {
        let len = s.len();
        let dst = self.allocate(len + 1);
        // SAFETY: `dst` spans `len + 1` fresh bytes, and the copied bytes are
        // valid utf8 because they come from a `str`.
        unsafe {
            ptr::copy_nonoverlapping(s.as_ptr(), dst.as_ptr(), len);
            dst.as_ptr().add(len).write(0);
            str::from_utf8_unchecked(slice::from_raw_parts(dst.as_ptr(), len))
        }
    }

    /// Rewind to the start of the first block. No memory is released, the
    /// blocks are reused by subsequent allocations.
    pub fn reset(&mut self) {
        let chain = self.chain.get_mut();
        chain.current = if chain.blocks.is_empty() {
            None
        } else {
            Some(0)
        };
        chain.position = 0;
    }

    /// Release all blocks.
    pub fn clean_all(&mut self) {
        let chain = self.chain.get_mut();
        if !chain.blocks.is_empty() {
            log::debug!(
                "Heap releasing {} blocks after {} allocations",
                chain.blocks.len(),
                self.num_allocations.get()
            );
        }
        // Vec drops its elements front to back.
        chain.blocks.clear();
        chain.current = None;
        chain.position = 0;
        self.num_allocations.set(0);
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        self.clean_all();
    }
}
