//! The per-node header word.
//!
//! Every node carries one 32-bit word holding its kind and the bits a
//! collector and evaluator will want later:
//!
//! ```text
//!  31   29 28  27    26    25    24   23            8 7   6  5   4    0
//! +-------+---+-----+-----+-----+----+---------------+-----+---+------+
//! | gccls |gen|spare|trace|debug|mark|      gp       |named|obj| kind |
//! +-------+---+-----+-----+-----+----+---------------+-----+---+------+
//! ```
//!
//! The reader only ever writes the kind; everything else starts zeroed.

use super::Kind;

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NodeInfo {
    bits: u32,
}

impl NodeInfo {
    const KIND_SHIFT: u32 = 0;
    const KIND_WIDTH: u32 = 5;
    const OBJECT_SHIFT: u32 = 5;
    const NAMED_SHIFT: u32 = 6;
    const NAMED_WIDTH: u32 = 2;
    const GP_SHIFT: u32 = 8;
    const GP_WIDTH: u32 = 16;
    const MARK_SHIFT: u32 = 24;
    const DEBUG_SHIFT: u32 = 25;
    const TRACE_SHIFT: u32 = 26;
    const SPARE_SHIFT: u32 = 27;
    const GENERATION_SHIFT: u32 = 28;
    const CLASS_SHIFT: u32 = 29;
    const CLASS_WIDTH: u32 = 3;

    pub fn new(kind: Kind) -> Self {
        let mut info = NodeInfo::default();
        info.set_field(Self::KIND_SHIFT, Self::KIND_WIDTH, kind as u32);
        info
    }

    #[inline]
    fn field(&self, shift: u32, width: u32) -> u32 {
        (self.bits >> shift) & ((1 << width) - 1)
    }

    #[inline]
    fn set_field(&mut self, shift: u32, width: u32, value: u32) {
        let mask = ((1 << width) - 1) << shift;
        self.bits = (self.bits & !mask) | ((value << shift) & mask);
    }

    #[inline]
    fn flag(&self, shift: u32) -> bool {
        self.field(shift, 1) != 0
    }

    #[inline]
    fn set_flag(&mut self, shift: u32, value: bool) {
        self.set_field(shift, 1, value as u32)
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        (self.field(Self::KIND_SHIFT, Self::KIND_WIDTH) as u8).into()
    }

    /// Whether the node has a class attribute.
    pub fn is_object(&self) -> bool {
        self.flag(Self::OBJECT_SHIFT)
    }
    pub fn set_object(&mut self, value: bool) {
        self.set_flag(Self::OBJECT_SHIFT, value)
    }

    /// Reference hint: 0, 1, or "2 or more". Larger values saturate.
    pub fn named(&self) -> u8 {
        self.field(Self::NAMED_SHIFT, Self::NAMED_WIDTH) as u8
    }
    pub fn set_named(&mut self, value: u8) {
        let max = (1 << Self::NAMED_WIDTH) - 1;
        self.set_field(
            Self::NAMED_SHIFT,
            Self::NAMED_WIDTH,
            (value as u32).min(max),
        )
    }

    /// General-purpose bits, interpreted per kind by the runtime.
    pub fn gp(&self) -> u16 {
        self.field(Self::GP_SHIFT, Self::GP_WIDTH) as u16
    }
    pub fn set_gp(&mut self, value: u16) {
        self.set_field(Self::GP_SHIFT, Self::GP_WIDTH, value as u32)
    }

    pub fn is_marked(&self) -> bool {
        self.flag(Self::MARK_SHIFT)
    }
    pub fn set_marked(&mut self, value: bool) {
        self.set_flag(Self::MARK_SHIFT, value)
    }

    pub fn is_debug(&self) -> bool {
        self.flag(Self::DEBUG_SHIFT)
    }
    pub fn set_debug(&mut self, value: bool) {
        self.set_flag(Self::DEBUG_SHIFT, value)
    }

    pub fn is_traced(&self) -> bool {
        self.flag(Self::TRACE_SHIFT)
    }
    pub fn set_traced(&mut self, value: bool) {
        self.set_flag(Self::TRACE_SHIFT, value)
    }

    pub fn spare(&self) -> bool {
        self.flag(Self::SPARE_SHIFT)
    }
    pub fn set_spare(&mut self, value: bool) {
        self.set_flag(Self::SPARE_SHIFT, value)
    }

    /// Old-generation bit.
    pub fn generation(&self) -> u8 {
        self.field(Self::GENERATION_SHIFT, 1) as u8
    }
    pub fn set_generation(&mut self, value: u8) {
        self.set_field(Self::GENERATION_SHIFT, 1, value as u32)
    }

    /// Size class of the node, for a paged allocator.
    pub fn gc_class(&self) -> u8 {
        self.field(Self::CLASS_SHIFT, Self::CLASS_WIDTH) as u8
    }
    pub fn set_gc_class(&mut self, value: u8) {
        self.set_field(Self::CLASS_SHIFT, Self::CLASS_WIDTH, value as u32)
    }
}

impl core::fmt::Debug for NodeInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeInfo")
            .field("kind", &self.kind())
            .field("obj", &self.is_object())
            .field("named", &self.named())
            .field("gp", &self.gp())
            .field("mark", &self.is_marked())
            .field("debug", &self.is_debug())
            .field("trace", &self.is_traced())
            .field("gcgen", &self.generation())
            .field("gccls", &self.gc_class())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::NodeInfo;
    use crate::data::Kind;

    #[test]
    fn fresh_header_is_zeroed() {
        let info = NodeInfo::new(Kind::Language);
        assert_eq!(info.kind(), Kind::Language);
        assert!(!info.is_object());
        assert_eq!(info.named(), 0);
        assert_eq!(info.gp(), 0);
        assert!(!info.is_marked());
        assert_eq!(info.gc_class(), 0);
    }

    #[test]
    fn fields_do_not_overlap() {
        let mut info = NodeInfo::new(Kind::S4);
        info.set_object(true);
        info.set_named(2);
        info.set_gp(0xffff);
        info.set_marked(true);
        info.set_traced(true);
        info.set_generation(1);
        info.set_gc_class(7);

        assert_eq!(info.kind(), Kind::S4);
        assert!(info.is_object());
        assert_eq!(info.named(), 2);
        assert_eq!(info.gp(), 0xffff);
        assert!(info.is_marked());
        assert!(!info.is_debug());
        assert!(info.is_traced());
        assert!(!info.spare());
        assert_eq!(info.generation(), 1);
        assert_eq!(info.gc_class(), 7);

        info.set_gp(0);
        info.set_marked(false);
        assert_eq!(info.kind(), Kind::S4);
        assert_eq!(info.named(), 2);
        assert_eq!(info.gc_class(), 7);
    }

    #[test]
    fn named_saturates() {
        let mut info = NodeInfo::new(Kind::Symbol);
        info.set_named(200);
        assert_eq!(info.named(), 3);
        assert_eq!(info.kind(), Kind::Symbol);
    }
}
