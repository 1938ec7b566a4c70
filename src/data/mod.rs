//! R data types and their allocator.
//!
//! Every R value, and every node of a parsed program, is a *node* in a
//! [`Storage`] arena. A node is:
//!
//! -   a header word ([`NodeInfo`]) carrying the node's [`Kind`] and the bits a
//!     collector will want later;
//! -   an attribute list (a tagged pairlist, `nil` until something is attached);
//! -   a payload selected by the kind: a head/tail/tag cell, a symbol, a
//!     vector header, a closure/promise/environment triple, or a primitive
//!     offset;
//! -   optional trailing storage: bytes reserved for the node at allocation
//!     time. Symbols keep their print name there and vectors their elements.
//!
//! The arena only grows. Slot 0 is `nil`, shared by every list and every
//! absent value; slot 1 is the missing-argument marker.
//! Nodes are addressed by [`Ptr`], an index bound to the storage's lifetime.

mod header;
mod objects;
#[cfg(feature = "render")]
mod render;
mod stretchy;
mod tag;
mod utility;

pub use self::header::NodeInfo;
pub use self::objects::*;
#[cfg(feature = "render")]
pub use self::render::render_tree;
pub use self::stretchy::StretchyList;
pub use self::utility::{ListIter, Sexpr};
pub use self::tag::Kind;

use core::cell::RefCell;

/// A zero-allocation error type for misuse of the object model.
pub struct Error<'a> {
    message: &'static str,
    ptr: Ptr<'a>,
}

impl<'a> Error<'a> {
    pub const fn new(message: &'static str, ptr: Ptr<'a>) -> Self {
        Error { message, ptr }
    }

    pub fn ptr(&self) -> Ptr<'a> {
        self.ptr
    }
}

impl core::fmt::Debug for Error<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "for object {}: {}", self.ptr, self.message)
    }
}

impl core::fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "for object {}: {}", self.ptr, self.message)
    }
}

/// R's integer and logical NA.
pub const NA_INTEGER: i32 = i32::MIN;

/// R's real NA: a NaN whose low word is 1954.
pub fn na_real() -> f64 {
    f64::from_bits(0x7ff0_0000_0000_07a2)
}

/// Whether the value is R's NA, as opposed to any other NaN.
pub fn is_na_real(v: f64) -> bool {
    v.is_nan() && (v.to_bits() & 0xffff_ffff) == 1954
}

/// Storage for all nodes created while reading.
pub struct Storage {
    nodes: RefCell<Vec<StoredNode>>,
    /// Trailing storage for all nodes, back to back.
    data: RefCell<Vec<u8>>,
}

impl Default for Storage {
    fn default() -> Self {
        Self::with_capacity(0, 0)
    }
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct StorageStats {
    pub nodes: usize,
    pub data_bytes: usize,
}

/// Bind is a trait for binding stored types to the storage that holds them:
/// applying the Storage object lifetime to the underlying object.
trait Bind<'a> {
    type Free;

    fn bind(store: &'a Storage, free: Self::Free) -> Self;
}

impl Storage {
    /// Create storage with room for `nodes` nodes and `bytes` of trailing data
    /// before the arena has to grow.
    pub fn with_capacity(nodes: usize, bytes: usize) -> Self {
        let mut objects = Vec::with_capacity(nodes.max(2));
        objects.push(StoredNode {
            info: NodeInfo::new(Kind::Nil),
            attrib: StoredPtr::NIL,
            payload: Payload::Nil,
            extra: Extent::default(),
        });
        // R_MissingArg: a symbol with an empty print name.
        let mut data = Vec::with_capacity(bytes.max(1));
        data.push(0u8);
        objects.push(StoredNode {
            info: NodeInfo::new(Kind::Symbol),
            attrib: StoredPtr::NIL,
            payload: Payload::Symbol {
                value: StoredPtr::NIL,
                internal: StoredPtr::NIL,
            },
            extra: Extent {
                offset: 0,
                length: 1,
            },
        });
        Storage {
            nodes: RefCell::new(objects),
            data: RefCell::new(data),
        }
    }

    fn bind<'a, T: Bind<'a>>(&'a self, raw: T::Free) -> T {
        T::bind(self, raw)
    }

    pub fn current_stats(&self) -> StorageStats {
        StorageStats {
            nodes: self.nodes.borrow().len(),
            data_bytes: self.data.borrow().len(),
        }
    }

    /// The marker for an empty argument slot, or a formal without a default.
    pub fn missing_arg(&self) -> Ptr<'_> {
        self.bind(StoredPtr::MISSING)
    }

    /// Allocate a zeroed node of the given kind, with `extra_bytes` of trailing
    /// storage.
    ///
    /// Vector kinds take their length from the trailing storage:
    /// `extra_bytes / element size`, less the terminator for char-scalars.
    /// Allocating `nil` returns the shared `nil`.
    pub fn allocate(&self, kind: Kind, extra_bytes: usize) -> Ptr<'_> {
        if kind == Kind::Nil {
            return Ptr::nil();
        }
        let extra = self.reserve(extra_bytes);
        let payload = match kind {
            Kind::Nil => Payload::Nil,
            Kind::Symbol => Payload::Symbol {
                value: StoredPtr::NIL,
                internal: StoredPtr::NIL,
            },
            Kind::Closure => Payload::Closure {
                formals: StoredPtr::NIL,
                body: StoredPtr::NIL,
                env: StoredPtr::NIL,
            },
            Kind::Environment => Payload::Environment {
                frame: StoredPtr::NIL,
                enclos: StoredPtr::NIL,
                hashtab: StoredPtr::NIL,
            },
            Kind::Promise => Payload::Promise {
                value: StoredPtr::NIL,
                expr: StoredPtr::NIL,
                env: StoredPtr::NIL,
            },
            Kind::Special | Kind::Builtin => Payload::Primitive { offset: 0 },
            Kind::Char => Payload::Vector {
                length: extra.length.saturating_sub(1),
                truelength: 0,
            },
            k if k.is_vector() => {
                // is_vector() guarantees an element size.
                let size = k.element_size().unwrap_or(1) as u32;
                Payload::Vector {
                    length: extra.length / size,
                    truelength: 0,
                }
            }
            _ => Payload::Pair(StoredPair::default()),
        };
        self.push(StoredNode {
            info: NodeInfo::new(kind),
            attrib: StoredPtr::NIL,
            payload,
            extra,
        })
    }

    fn push(&self, node: StoredNode) -> Ptr<'_> {
        let mut nodes = self.nodes.borrow_mut();
        let idx = u32::try_from(nodes.len()).expect("node arena exhausted");
        nodes.push(node);
        if nodes.len().is_power_of_two() {
            tracing::trace!("node arena grew to {} nodes", nodes.len());
        }
        self.bind(StoredPtr { idx })
    }

    /// Reserve zeroed trailing storage.
    fn reserve(&self, bytes: usize) -> Extent {
        let mut data = self.data.borrow_mut();
        let offset = u32::try_from(data.len()).expect("trailing storage exhausted");
        let length = u32::try_from(bytes).expect("trailing storage exhausted");
        let end = data.len() + bytes;
        data.resize(end, 0);
        Extent { offset, length }
    }

    fn write_data(&self, extent: Extent, at: usize, bytes: &[u8]) {
        let start = extent.offset as usize + at;
        assert!(at + bytes.len() <= extent.length as usize);
        self.data.borrow_mut()[start..start + bytes.len()].copy_from_slice(bytes);
    }

    fn read_data(&self, extent: Extent, at: usize, len: usize) -> Vec<u8> {
        let start = extent.offset as usize + at;
        self.data.borrow()[start..start + len].to_vec()
    }

    fn node(&self, ptr: StoredPtr) -> StoredNode {
        self.nodes.borrow()[ptr.idx as usize]
    }

    /// Apply an update to a stored node.
    /// `nil` and the missing-argument marker are never modified.
    fn update(&self, ptr: StoredPtr, f: impl FnOnce(&mut StoredNode)) {
        assert!(!ptr.is_shared(), "shared sentinels are immutable");
        let mut nodes = self.nodes.borrow_mut();
        f(&mut nodes[ptr.idx as usize]);
    }

    /// Replace a cell's link fields.
    /// This is the only form of update the reader performs on a finished node.
    pub(super) fn update_pair(&self, ptr: StoredPtr, f: impl FnOnce(&mut StoredPair)) {
        self.update(ptr, |node| match &mut node.payload {
            Payload::Pair(pair) => f(pair),
            _ => panic!("update_pair on a node without a pair payload"),
        })
    }

    pub fn get<'a>(&'a self, ptr: Ptr<'a>) -> Object<'a> {
        if ptr.is_nil() {
            return Object::Nil;
        }
        let node = self.node(ptr.raw);
        Object::bind(self, (ptr.raw, node))
    }

    /// Make a symbol whose print name is `text`.
    pub fn make_symbol(&self, text: &str) -> Ptr<'_> {
        let ptr = self.allocate(Kind::Symbol, text.len() + 1);
        let node = self.node(ptr.raw);
        self.write_data(node.extra, 0, text.as_bytes());
        ptr
    }

    /// Make a char-scalar holding `text`.
    pub fn make_string(&self, text: &str) -> Ptr<'_> {
        self.make_chars(text.as_bytes())
    }

    /// Make a char-scalar holding arbitrary bytes; string literals may carry
    /// bytes that are not UTF-8.
    pub fn make_chars(&self, bytes: &[u8]) -> Ptr<'_> {
        let ptr = self.allocate(Kind::Char, bytes.len() + 1);
        let node = self.node(ptr.raw);
        self.write_data(node.extra, 0, bytes);
        ptr
    }

    fn scalar(&self, kind: Kind, bytes: &[u8]) -> Ptr<'_> {
        let ptr = self.allocate(kind, bytes.len());
        let node = self.node(ptr.raw);
        self.write_data(node.extra, 0, bytes);
        ptr
    }

    /// A logical vector of length one; `None` is NA.
    pub fn scalar_logical(&self, value: Option<bool>) -> Ptr<'_> {
        let v = value.map(i32::from).unwrap_or(NA_INTEGER);
        self.scalar(Kind::Logical, &v.to_le_bytes())
    }

    /// An integer vector of length one; `None` is NA.
    pub fn scalar_integer(&self, value: Option<i32>) -> Ptr<'_> {
        let v = value.unwrap_or(NA_INTEGER);
        self.scalar(Kind::Integer, &v.to_le_bytes())
    }

    pub fn scalar_real(&self, value: f64) -> Ptr<'_> {
        self.scalar(Kind::Real, &value.to_le_bytes())
    }

    pub fn scalar_complex(&self, re: f64, im: f64) -> Ptr<'_> {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&re.to_le_bytes());
        bytes[8..].copy_from_slice(&im.to_le_bytes());
        self.scalar(Kind::Complex, &bytes)
    }

    /// A character vector of length one, holding a char-scalar of `bytes`.
    pub fn scalar_string(&self, bytes: &[u8]) -> Ptr<'_> {
        let element = self.make_chars(bytes);
        self.scalar(Kind::String, &element.raw.idx.to_le_bytes())
    }

    /// Allocate a new pair cell.
    pub fn put<'a>(&'a self, cell: Pair<'a>) -> Ptr<'a> {
        self.put_cell(Kind::Pair, cell)
    }

    fn put_cell<'a>(&'a self, kind: Kind, cell: Pair<'a>) -> Ptr<'a> {
        self.push(StoredNode {
            info: NodeInfo::new(kind),
            attrib: StoredPtr::NIL,
            payload: Payload::Pair(cell.into()),
            extra: Extent::default(),
        })
    }

    pub fn cons<'a>(&'a self, head: Ptr<'a>, tail: Ptr<'a>) -> Ptr<'a> {
        self.put(Pair::cons(head, tail))
    }

    /// A language-call node: `head` applied to the pairlist `args`.
    pub fn lang<'a>(&'a self, head: Ptr<'a>, args: Ptr<'a>) -> Ptr<'a> {
        self.put_cell(Kind::Language, Pair::cons(head, args))
    }

    /// Build a pairlist of the given elements, in order.
    pub fn list<'a>(&'a self, elements: impl IntoIterator<Item = Ptr<'a>>) -> Ptr<'a> {
        let mut list = StretchyList::new(self);
        for element in elements {
            list.append(element);
        }
        list.finalize()
    }

    /// Attach one more cell after the last cell of a finished list.
    /// Returns the new cell, which is the list's new last cell.
    pub fn append_after<'a>(&'a self, last: Ptr<'a>, value: Ptr<'a>) -> Result<Ptr<'a>, Error<'a>> {
        if !last.is_pair_like() {
            return Err(Error::new("can only append after a list cell", last));
        }
        let cell = self.cons(value, Ptr::nil());
        self.update_pair(last.raw, |p| p.tail = cell.raw);
        Ok(cell)
    }
}

/// A "raw" pointer, without lifetime data: the node's index in the arena.
/// This is the internal type for Storage; outside of storage,
/// the Ptr type provides a lifetime bound.
#[derive(Clone, Copy, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
struct StoredPtr {
    idx: u32,
}

impl StoredPtr {
    const NIL: StoredPtr = StoredPtr { idx: 0 };
    const MISSING: StoredPtr = StoredPtr { idx: 1 };

    #[inline]
    fn is_nil(&self) -> bool {
        *self == Self::NIL
    }

    /// Whether this is one of the sentinels shared by every list.
    #[inline]
    fn is_shared(&self) -> bool {
        self.idx <= Self::MISSING.idx
    }
}

impl core::fmt::Debug for StoredPtr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.idx)
    }
}

/// A range of trailing storage.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
struct Extent {
    offset: u32,
    length: u32,
}

#[derive(Copy, Clone, Default, Debug)]
struct StoredPair {
    head: StoredPtr,
    tail: StoredPtr,
    tag: StoredPtr,
}

impl From<Pair<'_>> for StoredPair {
    fn from(pair: Pair) -> Self {
        StoredPair {
            head: pair.head.raw,
            tail: pair.tail.raw,
            tag: pair.tag.raw,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Payload {
    Nil,
    Pair(StoredPair),
    Symbol {
        value: StoredPtr,
        internal: StoredPtr,
    },
    Vector {
        length: u32,
        truelength: u32,
    },
    Closure {
        formals: StoredPtr,
        body: StoredPtr,
        env: StoredPtr,
    },
    Environment {
        frame: StoredPtr,
        enclos: StoredPtr,
        hashtab: StoredPtr,
    },
    Promise {
        value: StoredPtr,
        expr: StoredPtr,
        env: StoredPtr,
    },
    Primitive {
        offset: u32,
    },
}

#[derive(Clone, Copy, Debug)]
struct StoredNode {
    info: NodeInfo,
    attrib: StoredPtr,
    payload: Payload,
    extra: Extent,
}
