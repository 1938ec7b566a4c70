//! Kinds of R objects.
//!
//! The numeric values match R's `SEXPTYPE` codes, so a node header can carry
//! them in five bits.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Kind {
    Nil = Self::NIL,
    Symbol = Self::SYMBOL,
    Pair = Self::PAIR,
    Closure = Self::CLOSURE,
    Environment = Self::ENVIRONMENT,
    Promise = Self::PROMISE,
    Language = Self::LANGUAGE,
    Special = Self::SPECIAL,
    Builtin = Self::BUILTIN,
    Char = Self::CHAR,
    Logical = Self::LOGICAL,
    Integer = Self::INTEGER,
    Real = Self::REAL,
    Complex = Self::COMPLEX,
    String = Self::STRING,
    Dots = Self::DOTS,
    Any = Self::ANY,
    Vector = Self::VECTOR,
    Expression = Self::EXPRESSION,
    Bytecode = Self::BYTECODE,
    ExternalPtr = Self::EXTERNAL_PTR,
    WeakRef = Self::WEAK_REF,
    Raw = Self::RAW,
    S4 = Self::S4_OBJECT,
}

impl Kind {
    const NIL: u8 = 0;
    const SYMBOL: u8 = 1;
    const PAIR: u8 = 2;
    const CLOSURE: u8 = 3;
    const ENVIRONMENT: u8 = 4;
    const PROMISE: u8 = 5;
    const LANGUAGE: u8 = 6;
    const SPECIAL: u8 = 7;
    const BUILTIN: u8 = 8;
    const CHAR: u8 = 9;
    const LOGICAL: u8 = 10;
    // 11 and 12 are unused; R retired them.
    const INTEGER: u8 = 13;
    const REAL: u8 = 14;
    const COMPLEX: u8 = 15;
    const STRING: u8 = 16;
    const DOTS: u8 = 17;
    const ANY: u8 = 18;
    const VECTOR: u8 = 19;
    const EXPRESSION: u8 = 20;
    const BYTECODE: u8 = 21;
    const EXTERNAL_PTR: u8 = 22;
    const WEAK_REF: u8 = 23;
    const RAW: u8 = 24;
    const S4_OBJECT: u8 = 25;

    /// The name R's `typeof` reports for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Nil => "NULL",
            Kind::Symbol => "symbol",
            Kind::Pair => "pairlist",
            Kind::Closure => "closure",
            Kind::Environment => "environment",
            Kind::Promise => "promise",
            Kind::Language => "language",
            Kind::Special => "special",
            Kind::Builtin => "builtin",
            Kind::Char => "char",
            Kind::Logical => "logical",
            Kind::Integer => "integer",
            Kind::Real => "double",
            Kind::Complex => "complex",
            Kind::String => "character",
            Kind::Dots => "...",
            Kind::Any => "any",
            Kind::Vector => "list",
            Kind::Expression => "expression",
            Kind::Bytecode => "bytecode",
            Kind::ExternalPtr => "externalptr",
            Kind::WeakRef => "weakref",
            Kind::Raw => "raw",
            Kind::S4 => "S4",
        }
    }

    /// Short form used when printing pointers, e.g. `lang#12`.
    pub(super) fn abbreviation(self) -> &'static str {
        match self {
            Kind::Nil => "nil",
            Kind::Symbol => "sym",
            Kind::Pair => "list",
            Kind::Closure => "clo",
            Kind::Environment => "env",
            Kind::Promise => "prom",
            Kind::Language => "lang",
            Kind::Special => "spec",
            Kind::Builtin => "bltn",
            Kind::Char => "chr",
            Kind::Logical => "lgl",
            Kind::Integer => "int",
            Kind::Real => "dbl",
            Kind::Complex => "cpl",
            Kind::String => "str",
            Kind::Dots => "dots",
            Kind::Any => "any",
            Kind::Vector => "vec",
            Kind::Expression => "expr",
            Kind::Bytecode => "bcode",
            Kind::ExternalPtr => "xptr",
            Kind::WeakRef => "weak",
            Kind::Raw => "raw",
            Kind::S4 => "s4",
        }
    }

    /// Width in bytes of one element, for kinds that keep their elements in
    /// trailing storage.
    pub fn element_size(self) -> Option<usize> {
        match self {
            Kind::Char | Kind::Raw => Some(1),
            Kind::Logical | Kind::Integer => Some(4),
            Kind::Real => Some(8),
            Kind::Complex => Some(16),
            // Node references.
            Kind::String | Kind::Vector | Kind::Expression => Some(4),
            _ => None,
        }
    }

    #[inline]
    pub fn is_vector(self) -> bool {
        self.element_size().is_some()
    }

    /// Kinds whose payload is a head/tail/tag cell.
    #[inline]
    pub fn is_pair_like(self) -> bool {
        matches!(
            self,
            Kind::Pair
                | Kind::Language
                | Kind::Dots
                | Kind::Any
                | Kind::Bytecode
                | Kind::ExternalPtr
                | Kind::WeakRef
                | Kind::S4
        )
    }
}

impl From<u8> for Kind {
    fn from(value: u8) -> Self {
        match value {
            Self::NIL => Kind::Nil,
            Self::SYMBOL => Kind::Symbol,
            Self::PAIR => Kind::Pair,
            Self::CLOSURE => Kind::Closure,
            Self::ENVIRONMENT => Kind::Environment,
            Self::PROMISE => Kind::Promise,
            Self::LANGUAGE => Kind::Language,
            Self::SPECIAL => Kind::Special,
            Self::BUILTIN => Kind::Builtin,
            Self::CHAR => Kind::Char,
            Self::LOGICAL => Kind::Logical,
            Self::INTEGER => Kind::Integer,
            Self::REAL => Kind::Real,
            Self::COMPLEX => Kind::Complex,
            Self::STRING => Kind::String,
            Self::DOTS => Kind::Dots,
            Self::ANY => Kind::Any,
            Self::VECTOR => Kind::Vector,
            Self::EXPRESSION => Kind::Expression,
            Self::BYTECODE => Kind::Bytecode,
            Self::EXTERNAL_PTR => Kind::ExternalPtr,
            Self::WEAK_REF => Kind::WeakRef,
            Self::RAW => Kind::Raw,
            Self::S4_OBJECT => Kind::S4,
            v => unreachable!("invalid kind value {v}"),
        }
    }
}

impl core::fmt::Display for Kind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::Kind;

    #[test]
    fn codes_round_trip() {
        for code in (0u8..=25).filter(|c| *c != 11 && *c != 12) {
            let kind = Kind::from(code);
            assert_eq!(kind as u8, code);
        }
    }

    #[test]
    fn s4_is_last() {
        assert_eq!(Kind::S4 as u8, 25);
        assert_eq!(Kind::from(25), Kind::S4);
        assert_eq!(Kind::S4.name(), "S4");
    }

    #[test]
    fn r_type_names() {
        assert_eq!(Kind::Real.name(), "double");
        assert_eq!(Kind::String.name(), "character");
        assert_eq!(Kind::Vector.name(), "list");
        assert_eq!(Kind::Expression.name(), "expression");
        assert_eq!(Kind::Nil.to_string(), "NULL");
    }
}
