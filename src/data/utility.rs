//! Utility implementations and functions.
//!
//! - Deconstruct a list into a specified number of pointers.
//! - Walk a list cell by cell.
//! - Render a node tree as an S-expression, for debugging and tests.

use super::{Error, Kind, Object, Pair, Ptr};

impl<'a, const N: usize> TryFrom<Ptr<'a>> for [Ptr<'a>; N] {
    type Error = Error<'a>;

    fn try_from(ptr: Ptr<'a>) -> Result<Self, Self::Error> {
        let mut result = [Ptr::nil(); N];
        result
            .iter_mut()
            .try_fold(ptr, |cell, slot| {
                let pair = cell.as_pair()?;
                *slot = pair.head;
                Some(pair.tail)
            })
            .ok_or(Error::new("not enough entries in list", ptr))?;

        Ok(result)
    }
}

/// Iterator over the cells of a list.
/// Stops at `nil`, or at the first tail that isn't a cell.
pub struct ListIter<'a> {
    next: Ptr<'a>,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = Pair<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let pair = self.next.as_pair()?;
        self.next = pair.tail;
        Some(pair)
    }
}

impl<'a> Ptr<'a> {
    /// Iterate over the cells of a list, starting from this one.
    pub fn iter(&self) -> ListIter<'a> {
        ListIter { next: *self }
    }

    /// Number of cells in the list starting here; 0 for `nil` and non-lists.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The last cell of a list, or `nil` for an empty list.
    pub fn last_cell(&self) -> Ptr<'a> {
        let mut cell = *self;
        while let Some(pair) = cell.as_pair() {
            if !pair.tail.is_pair_like() {
                return cell;
            }
            cell = pair.tail;
        }
        Ptr::nil()
    }

    /// Debug rendering of the tree under this node.
    ///
    /// Calls print as `(f a b)`, pairlists as `[a b]`, and tagged cells as
    /// `name=value`.
    pub fn sexpr(&self) -> Sexpr<'a> {
        Sexpr(*self)
    }
}

pub struct Sexpr<'a>(Ptr<'a>);

impl core::fmt::Display for Sexpr<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write_sexpr(f, self.0)
    }
}

fn write_cells(f: &mut core::fmt::Formatter<'_>, cells: Ptr) -> core::fmt::Result {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        if let Some(name) = cell.tag.symbol_name() {
            write!(f, "{name}=")?;
        }
        write_sexpr(f, cell.head)?;
    }
    Ok(())
}

fn write_real(f: &mut core::fmt::Formatter<'_>, v: f64) -> core::fmt::Result {
    if super::is_na_real(v) {
        f.write_str("NA_real_")
    } else if v.is_nan() {
        f.write_str("NaN")
    } else if v.is_infinite() {
        f.write_str(if v > 0.0 { "Inf" } else { "-Inf" })
    } else {
        write!(f, "{v}")
    }
}

fn write_element(f: &mut core::fmt::Formatter<'_>, v: &super::Vector, i: usize) -> core::fmt::Result {
    match v.kind() {
        Kind::Logical => match v.logical(i).flatten() {
            Some(true) => f.write_str("TRUE"),
            Some(false) => f.write_str("FALSE"),
            None => f.write_str("NA"),
        },
        Kind::Integer => match v.integer(i).flatten() {
            Some(n) => write!(f, "{n}L"),
            None => f.write_str("NA_integer_"),
        },
        Kind::Real => write_real(f, v.real(i).unwrap_or_default()),
        Kind::Complex => {
            let (re, im) = v.complex(i).unwrap_or_default();
            write_real(f, re)?;
            if !im.is_sign_negative() {
                f.write_str("+")?;
            }
            write_real(f, im)?;
            f.write_str("i")
        }
        Kind::Raw => {
            let b = v.bytes().and_then(|b| b.get(i).copied()).unwrap_or(0);
            write!(f, "{b:02x}")
        }
        _ => write_sexpr(f, v.element(i).unwrap_or_default()),
    }
}

fn write_sexpr(f: &mut core::fmt::Formatter<'_>, ptr: Ptr) -> core::fmt::Result {
    match ptr.get() {
        Object::Nil => f.write_str("NULL"),
        Object::Symbol(_) if ptr.is_missing_arg() => f.write_str("<missing>"),
        Object::Symbol(s) => f.write_str(&s.name()),
        Object::Pair(pair) => match ptr.kind() {
            Kind::Language => {
                f.write_str("(")?;
                write_sexpr(f, pair.head)?;
                if !pair.tail.is_nil() {
                    f.write_str(" ")?;
                    write_cells(f, pair.tail)?;
                }
                f.write_str(")")
            }
            Kind::Pair => {
                f.write_str("[")?;
                write_cells(f, ptr)?;
                f.write_str("]")
            }
            _ => write!(f, "{ptr}"),
        },
        Object::Vector(v) if v.kind() == Kind::Char => {
            let text = v.text().unwrap_or_default();
            write!(f, "{text:?}")
        }
        Object::Vector(v) if v.len() == 1 && v.kind() != Kind::Vector && v.kind() != Kind::Expression => {
            write_element(f, &v, 0)
        }
        Object::Vector(v) => {
            let constructor = match v.kind() {
                Kind::Vector => "list",
                Kind::Expression => "expression",
                Kind::Raw => "as.raw",
                _ => "c",
            };
            if v.is_empty() && constructor == "c" {
                return write!(f, "{}(0)", v.kind());
            }
            write!(f, "{constructor}(")?;
            for i in 0..v.len() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_element(f, &v, i)?;
            }
            f.write_str(")")
        }
        _ => write!(f, "{ptr}"),
    }
}

#[cfg(test)]
mod tests {
    use crate::data::{Ptr, Storage};

    #[test]
    fn get_list() {
        let store = Storage::default();
        let head = (1..=3).fold(Ptr::nil(), |tail, i| {
            let head = store.scalar_integer(Some(i));
            store.cons(head, tail)
        });

        let pts: [Ptr; 3] = head.try_into().unwrap();
        let got: Vec<i32> = pts
            .into_iter()
            .map(|v| v.as_vector().unwrap().integer(0).unwrap().unwrap())
            .collect();
        assert_eq!(&got, &[3, 2, 1]);

        let too_many: Result<[Ptr; 4], _> = head.try_into();
        too_many.unwrap_err();
    }

    #[test]
    fn list_walks() {
        let store = Storage::default();
        assert_eq!(Ptr::nil().len(), 0);
        assert!(Ptr::nil().last_cell().is_nil());

        let list = store.list([store.make_symbol("a"), store.make_symbol("b")]);
        assert_eq!(list.len(), 2);
        let last = list.last_cell();
        assert_eq!(last.head().and_then(|h| h.symbol_name()).as_deref(), Some("b"));
        // A call's argument list hangs off its head cell.
        let call = store.lang(store.make_symbol("f"), list);
        assert_eq!(call.len(), 3);
    }

    #[test]
    fn sexpr_rendering() {
        let store = Storage::default();
        let plus = store.make_symbol("+");
        let one = store.scalar_real(1.0);
        let half = store.scalar_real(0.5);
        let call = store.lang(plus, store.list([one, half]));
        assert_eq!(call.sexpr().to_string(), "(+ 1 0.5)");

        let named = store.put(crate::data::Pair::tagged(
            store.scalar_integer(Some(2)),
            Ptr::nil(),
            store.make_symbol("y"),
        ));
        let f = store.lang(store.make_symbol("f"), store.cons(store.missing_arg(), named));
        assert_eq!(f.sexpr().to_string(), "(f <missing> y=2L)");

        assert_eq!(Ptr::nil().sexpr().to_string(), "NULL");
        assert_eq!(store.scalar_string(b"a\"b").sexpr().to_string(), r#""a\"b""#);
        assert_eq!(store.scalar_logical(None).sexpr().to_string(), "NA");
        assert_eq!(store.scalar_complex(0.0, 2.0).sexpr().to_string(), "0+2i");
        assert_eq!(store.scalar_real(f64::INFINITY).sexpr().to_string(), "Inf");
        assert_eq!(store.list([one]).sexpr().to_string(), "[1]");
    }
}
