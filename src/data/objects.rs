use super::{
    Bind, Error, Extent, Kind, NodeInfo, Payload, Storage, StoredNode, StoredPair, StoredPtr,
    NA_INTEGER,
};

/// View of a stored node, selected by its kind.
#[derive(Debug, Clone, Copy)]
pub enum Object<'a> {
    Nil,
    Symbol(Symbol<'a>),
    /// Any of the head/tail/tag kinds: pairlists, calls, and the rest.
    Pair(Pair<'a>),
    Vector(Vector<'a>),
    Closure(Closure<'a>),
    Environment(Environment<'a>),
    Promise(Promise<'a>),
    /// Offset into the primitive function table.
    Primitive(u32),
}

impl<'a> Object<'a> {
    pub fn as_pair(&self) -> Option<Pair<'a>> {
        match self {
            Object::Pair(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<Symbol<'a>> {
        match self {
            Object::Symbol(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<Vector<'a>> {
        match self {
            Object::Vector(v) => Some(*v),
            _ => None,
        }
    }
}

impl<'a> Bind<'a> for Object<'a> {
    type Free = (StoredPtr, StoredNode);

    fn bind(store: &'a Storage, (raw, node): Self::Free) -> Self {
        let ptr = |p: StoredPtr| Ptr::bind(store, p);
        match node.payload {
            Payload::Nil => Object::Nil,
            Payload::Pair(pair) => Object::Pair(Pair::bind(store, pair)),
            Payload::Symbol { value, internal } => Object::Symbol(Symbol {
                ptr: ptr(raw),
                value: ptr(value),
                internal: ptr(internal),
                name: node.extra,
            }),
            Payload::Vector { length, truelength } => Object::Vector(Vector {
                ptr: ptr(raw),
                kind: node.info.kind(),
                length,
                truelength,
                data: node.extra,
            }),
            Payload::Closure { formals, body, env } => Object::Closure(Closure {
                formals: ptr(formals),
                body: ptr(body),
                env: ptr(env),
            }),
            Payload::Environment {
                frame,
                enclos,
                hashtab,
            } => Object::Environment(Environment {
                frame: ptr(frame),
                enclos: ptr(enclos),
                hashtab: ptr(hashtab),
            }),
            Payload::Promise { value, expr, env } => Object::Promise(Promise {
                value: ptr(value),
                expr: ptr(expr),
                env: ptr(env),
            }),
            Payload::Primitive { offset } => Object::Primitive(offset),
        }
    }
}

/// A reference to a stored node.
///
/// `nil` carries no storage reference; it is the same value for every store.
#[derive(Clone, Copy, Default)]
pub struct Ptr<'a> {
    pub(super) raw: StoredPtr,
    pub(super) store: Option<&'a Storage>,
}

impl PartialEq for Ptr<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Ptr<'_> {}

impl core::hash::Hash for Ptr<'_> {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state)
    }
}

impl core::fmt::Display for Ptr<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}#{}", self.kind().abbreviation(), self.raw.idx)
    }
}

impl core::fmt::Debug for Ptr<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(self, f)
    }
}

impl<'a> Bind<'a> for Ptr<'a> {
    type Free = StoredPtr;

    fn bind(store: &'a Storage, raw: Self::Free) -> Self {
        Self {
            raw,
            store: if raw.is_nil() { None } else { Some(store) },
        }
    }
}

impl<'a> Ptr<'a> {
    pub fn nil() -> Ptr<'a> {
        Default::default()
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        self.raw.is_nil()
    }

    /// Whether this is the storage's missing-argument marker.
    #[inline]
    pub fn is_missing_arg(&self) -> bool {
        self.store.is_some() && self.raw == StoredPtr::MISSING
    }

    fn node(&self) -> Option<(&'a Storage, StoredNode)> {
        let store = self.store?;
        Some((store, store.node(self.raw)))
    }

    pub fn kind(&self) -> Kind {
        self.info().kind()
    }

    pub fn info(&self) -> NodeInfo {
        self.node()
            .map(|(_, node)| node.info)
            .unwrap_or_else(|| NodeInfo::new(Kind::Nil))
    }

    /// Modify the header bits of a node. The kind can't change.
    pub fn update_info(&self, f: impl FnOnce(&mut NodeInfo)) -> Result<(), Error<'a>> {
        let store = self.mutable()?;
        store.update(self.raw, |node| f(&mut node.info));
        Ok(())
    }

    #[inline]
    pub fn is_symbol(&self) -> bool {
        self.kind() == Kind::Symbol
    }

    #[inline]
    pub fn is_pair_like(&self) -> bool {
        self.kind().is_pair_like()
    }

    pub fn get(&self) -> Object<'a> {
        match self.node() {
            None => Object::Nil,
            Some((store, node)) => Object::bind(store, (self.raw, node)),
        }
    }

    pub fn as_pair(&self) -> Option<Pair<'a>> {
        self.get().as_pair()
    }

    pub fn as_symbol(&self) -> Option<Symbol<'a>> {
        self.get().as_symbol()
    }

    pub fn as_vector(&self) -> Option<Vector<'a>> {
        self.get().as_vector()
    }

    /// The head of a cell, or `nil` for `nil`. `None` for other kinds.
    pub fn head(&self) -> Option<Ptr<'a>> {
        self.link(|p| p.head)
    }

    /// The tail of a cell, or `nil` for `nil`. `None` for other kinds.
    pub fn tail(&self) -> Option<Ptr<'a>> {
        self.link(|p| p.tail)
    }

    /// The tag of a cell, or `nil` for `nil`. `None` for other kinds.
    pub fn tag(&self) -> Option<Ptr<'a>> {
        self.link(|p| p.tag)
    }

    fn link(&self, f: impl FnOnce(Pair<'a>) -> Ptr<'a>) -> Option<Ptr<'a>> {
        if self.is_nil() {
            return Some(Ptr::nil());
        }
        self.as_pair().map(f)
    }

    pub fn set_head(&self, value: Ptr<'a>) -> Result<(), Error<'a>> {
        self.update_pair(|p| p.head = value.raw)
    }

    pub fn set_tail(&self, value: Ptr<'a>) -> Result<(), Error<'a>> {
        self.update_pair(|p| p.tail = value.raw)
    }

    pub fn set_tag(&self, value: Ptr<'a>) -> Result<(), Error<'a>> {
        self.update_pair(|p| p.tag = value.raw)
    }

    fn mutable(&self) -> Result<&'a Storage, Error<'a>> {
        let store = self
            .store
            .ok_or(Error::new("nil cannot be modified", *self))?;
        if self.raw.is_shared() {
            return Err(Error::new("shared sentinel cannot be modified", *self));
        }
        Ok(store)
    }

    fn update_pair(&self, f: impl FnOnce(&mut StoredPair)) -> Result<(), Error<'a>> {
        let store = self.mutable()?;
        if !self.is_pair_like() {
            return Err(Error::new("object is not a list cell", *self));
        }
        store.update_pair(self.raw, f);
        Ok(())
    }

    /// The print name, if this is a symbol.
    pub fn symbol_name(&self) -> Option<String> {
        self.as_symbol().map(|s| s.name())
    }

    /// Text of a symbol, a char-scalar, or the first element of a character
    /// vector.
    pub fn as_text(&self) -> Option<String> {
        match self.get() {
            Object::Symbol(s) => Some(s.name()),
            Object::Vector(v) if v.kind() == Kind::Char => v.text(),
            Object::Vector(v) if v.kind() == Kind::String => v.element(0)?.as_text(),
            _ => None,
        }
    }

    /// The attribute pairlist; `nil` if none are attached.
    pub fn attributes(&self) -> Ptr<'a> {
        match self.node() {
            None => Ptr::nil(),
            Some((store, node)) => Ptr::bind(store, node.attrib),
        }
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<Ptr<'a>> {
        self.attributes()
            .iter()
            .find(|cell| cell.tag.symbol_name().as_deref() == Some(name))
            .map(|cell| cell.head)
    }

    /// Attach or replace an attribute. Setting `class` marks the node as an
    /// object.
    pub fn set_attribute(&self, name: &str, value: Ptr<'a>) -> Result<(), Error<'a>> {
        let store = self.mutable()?;
        let mut cell = self.attributes();
        while let Some(pair) = cell.as_pair() {
            if pair.tag.symbol_name().as_deref() == Some(name) {
                return cell.set_head(value);
            }
            cell = pair.tail;
        }
        let tag = store.make_symbol(name);
        let attrib = store.put(Pair::tagged(value, self.attributes(), tag));
        store.update(self.raw, |node| {
            node.attrib = attrib.raw;
            if name == "class" {
                node.info.set_object(true);
            }
        });
        Ok(())
    }
}

/// A head/tail/tag cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pair<'a> {
    pub head: Ptr<'a>,
    pub tail: Ptr<'a>,
    pub tag: Ptr<'a>,
}

impl<'a> Pair<'a> {
    pub fn cons(head: Ptr<'a>, tail: Ptr<'a>) -> Self {
        Self::tagged(head, tail, Ptr::nil())
    }

    pub fn tagged(head: Ptr<'a>, tail: Ptr<'a>, tag: Ptr<'a>) -> Self {
        Pair { head, tail, tag }
    }
}

impl<'a> Bind<'a> for Pair<'a> {
    type Free = StoredPair;

    fn bind(store: &'a Storage, raw: Self::Free) -> Self {
        Self {
            head: Ptr::bind(store, raw.head),
            tail: Ptr::bind(store, raw.tail),
            tag: Ptr::bind(store, raw.tag),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Symbol<'a> {
    ptr: Ptr<'a>,
    pub value: Ptr<'a>,
    pub internal: Ptr<'a>,
    name: Extent,
}

impl Symbol<'_> {
    /// The print name, without its terminator.
    pub fn name(&self) -> String {
        let Some(store) = self.ptr.store else {
            return String::new();
        };
        let bytes = store.read_data(self.name, 0, self.name.length.saturating_sub(1) as usize);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// A vector header and its elements.
#[derive(Debug, Clone, Copy)]
pub struct Vector<'a> {
    ptr: Ptr<'a>,
    kind: Kind,
    length: u32,
    truelength: u32,
    data: Extent,
}

impl<'a> Vector<'a> {
    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn truelength(&self) -> usize {
        self.truelength as usize
    }

    fn element_bytes<const N: usize>(&self, i: usize) -> Option<[u8; N]> {
        if i >= self.len() || self.kind.element_size() != Some(N) {
            return None;
        }
        let store = self.ptr.store?;
        let bytes = store.read_data(self.data, i * N, N);
        bytes.try_into().ok()
    }

    /// Raw contents of a char-scalar or raw vector.
    pub fn bytes(&self) -> Option<Vec<u8>> {
        if !matches!(self.kind, Kind::Char | Kind::Raw) {
            return None;
        }
        let store = self.ptr.store?;
        Some(store.read_data(self.data, 0, self.len()))
    }

    /// Contents of a char-scalar, with invalid UTF-8 replaced.
    pub fn text(&self) -> Option<String> {
        if self.kind != Kind::Char {
            return None;
        }
        self.bytes()
            .map(|b| String::from_utf8_lossy(&b).into_owned())
    }

    /// An integer or logical element; the inner `None` is NA.
    pub fn integer(&self, i: usize) -> Option<Option<i32>> {
        if !matches!(self.kind, Kind::Integer | Kind::Logical) {
            return None;
        }
        let v = i32::from_le_bytes(self.element_bytes(i)?);
        Some((v != NA_INTEGER).then_some(v))
    }

    /// A logical element; the inner `None` is NA.
    pub fn logical(&self, i: usize) -> Option<Option<bool>> {
        if self.kind != Kind::Logical {
            return None;
        }
        self.integer(i).map(|v| v.map(|v| v != 0))
    }

    pub fn real(&self, i: usize) -> Option<f64> {
        if self.kind != Kind::Real {
            return None;
        }
        Some(f64::from_le_bytes(self.element_bytes(i)?))
    }

    /// A complex element as (real, imaginary).
    pub fn complex(&self, i: usize) -> Option<(f64, f64)> {
        if self.kind != Kind::Complex {
            return None;
        }
        let bytes: [u8; 16] = self.element_bytes(i)?;
        let (re, im) = bytes.split_at(8);
        Some((
            f64::from_le_bytes(re.try_into().ok()?),
            f64::from_le_bytes(im.try_into().ok()?),
        ))
    }

    /// An element of a character vector, list, or expression vector.
    pub fn element(&self, i: usize) -> Option<Ptr<'a>> {
        if !matches!(self.kind, Kind::String | Kind::Vector | Kind::Expression) {
            return None;
        }
        let idx = u32::from_le_bytes(self.element_bytes(i)?);
        let store = self.ptr.store?;
        Some(Ptr::bind(store, StoredPtr { idx }))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Closure<'a> {
    pub formals: Ptr<'a>,
    pub body: Ptr<'a>,
    pub env: Ptr<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct Environment<'a> {
    pub frame: Ptr<'a>,
    pub enclos: Ptr<'a>,
    pub hashtab: Ptr<'a>,
}

#[derive(Debug, Clone, Copy)]
pub struct Promise<'a> {
    pub value: Ptr<'a>,
    pub expr: Ptr<'a>,
    pub env: Ptr<'a>,
}
