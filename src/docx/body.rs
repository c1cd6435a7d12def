//! Arena-backed block list for the document body.
//!
//! Blocks are stored in a vector that only grows; their order is kept in
//! prev/next links. A [`BlockId`] therefore stays valid and keeps pointing at
//! the same block no matter how many blocks are inserted around it, which is
//! what lets the reformatter record songs first and edit afterwards.

use super::model::Paragraph;
use super::xml::Element;

/// Stable handle to a block in a [`Body`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u32);

impl BlockId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A top-level child of `w:body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    /// Tables, section properties, content controls: kept verbatim.
    Other(Element),
}

impl Block {
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            Block::Other(_) => None,
        }
    }

    pub fn as_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            Block::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    block: Block,
    prev: Option<BlockId>,
    next: Option<BlockId>,
    live: bool,
}

/// Ordered blocks with stable handles.
#[derive(Debug, Clone, Default)]
pub struct Body {
    slots: Vec<Slot>,
    first: Option<BlockId>,
    last: Option<BlockId>,
    live: usize,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks currently linked into the body.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    fn alloc(&mut self, block: Block) -> BlockId {
        let id = BlockId(self.slots.len() as u32);
        self.slots.push(Slot {
            block,
            prev: None,
            next: None,
            live: true,
        });
        self.live += 1;
        id
    }

    fn slot(&self, id: BlockId) -> Option<&Slot> {
        self.slots.get(id.index()).filter(|s| s.live)
    }

    /// The block behind `id`, or `None` once it has been removed.
    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.slot(id).map(|s| &s.block)
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.slots
            .get_mut(id.index())
            .filter(|s| s.live)
            .map(|s| &mut s.block)
    }

    pub fn first(&self) -> Option<BlockId> {
        self.first
    }

    pub fn next(&self, id: BlockId) -> Option<BlockId> {
        self.slot(id)?.next
    }

    /// Append at the end.
    pub fn push_back(&mut self, block: Block) -> BlockId {
        let id = self.alloc(block);
        match self.last {
            Some(last) => self.link(last, id),
            None => self.first = Some(id),
        }
        self.last = Some(id);
        id
    }

    /// Insert at the front.
    pub fn push_front(&mut self, block: Block) -> BlockId {
        match self.first {
            Some(first) => {
                let id = self.alloc(block);
                self.link(id, first);
                self.first = Some(id);
                id
            }
            None => self.push_back(block),
        }
    }

    /// Splice `block` in directly after `anchor`. Returns `None`, inserting
    /// nothing, if `anchor` is not linked into this body.
    pub fn insert_after(&mut self, anchor: BlockId, block: Block) -> Option<BlockId> {
        let after = self.slot(anchor)?.next;
        let id = self.alloc(block);
        self.link(anchor, id);
        match after {
            Some(next) => self.link(id, next),
            None => self.last = Some(id),
        }
        Some(id)
    }

    /// Splice `block` in directly before `anchor`. Returns `None`, inserting
    /// nothing, if `anchor` is not linked into this body.
    pub fn insert_before(&mut self, anchor: BlockId, block: Block) -> Option<BlockId> {
        let before = self.slot(anchor)?.prev;
        let id = self.alloc(block);
        self.link(id, anchor);
        match before {
            Some(prev) => self.link(prev, id),
            None => self.first = Some(id),
        }
        Some(id)
    }

    /// Unlink `id` from the body. Its handle stays allocated but is no
    /// longer visited; returns `false` if it was already removed.
    pub fn remove(&mut self, id: BlockId) -> bool {
        let Some(slot) = self.slots.get_mut(id.index()) else {
            return false;
        };
        if !slot.live {
            return false;
        }
        slot.live = false;
        let (prev, next) = (slot.prev.take(), slot.next.take());
        match prev {
            Some(p) => self.slots[p.index()].next = next,
            None => self.first = next,
        }
        match next {
            Some(n) => self.slots[n.index()].prev = prev,
            None => self.last = prev,
        }
        self.live -= 1;
        true
    }

    fn link(&mut self, a: BlockId, b: BlockId) {
        self.slots[a.index()].next = Some(b);
        self.slots[b.index()].prev = Some(a);
    }

    /// Handles in document order.
    pub fn ids(&self) -> Ids<'_> {
        Ids {
            body: self,
            cursor: self.first,
        }
    }

    /// Blocks in document order.
    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.ids().map(move |id| (id, &self.slots[id.index()].block))
    }

    /// Every linked block mutably, in arena order (not document order).
    pub(crate) fn blocks_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.slots
            .iter_mut()
            .filter(|s| s.live)
            .map(|s| &mut s.block)
    }
}

/// Document-order iterator over block handles.
pub struct Ids<'a> {
    body: &'a Body,
    cursor: Option<BlockId>,
}

impl Iterator for Ids<'_> {
    type Item = BlockId;

    fn next(&mut self) -> Option<BlockId> {
        let id = self.cursor?;
        self.cursor = self.body.next(id);
        Some(id)
    }
}

/// Insertion point that advances onto each block it inserts, so a series
/// of inserts lands in call order after the starting block.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    at: BlockId,
}

impl Cursor {
    pub fn after(at: BlockId) -> Self {
        Self { at }
    }

    /// Insert after the current block and move onto the new one. `None` if
    /// the current block has been removed from `body`.
    pub fn insert(&mut self, body: &mut Body, block: Block) -> Option<BlockId> {
        self.at = body.insert_after(self.at, block)?;
        Some(self.at)
    }
}
