use std::collections::HashSet;

use log::warn;

use crate::object::ObjKey;
use crate::store::{Body, Store};
use crate::{Error, Result};

/// Longest chain of indirect references followed before giving up.
pub const MAX_REFERENCE_CHAIN: usize = 256;

impl Store {
    /// Follow `key` through the object table until a non-reference object is
    /// reached. Non-references resolve to themselves.
    pub fn try_resolve(&self, key: ObjKey) -> Result<ObjKey> {
        let start = match self.body(key) {
            Some(Body::Reference(id)) => *id,
            _ => return Ok(key),
        };
        let mut current = key;
        for _ in 0..MAX_REFERENCE_CHAIN {
            let id = match self.body(current) {
                Some(Body::Reference(id)) => *id,
                _ => return Ok(current),
            };
            current = self.lookup_id(id).ok_or(Error::DanglingReference(id))?;
        }
        match self.body(current) {
            Some(Body::Reference(_)) => Err(Error::DanglingReference(start)),
            _ => Ok(current),
        }
    }

    /// Like [`Store::try_resolve`], but a dangling or over-long chain yields the
    /// null object instead of an error.
    pub fn resolve(&self, key: ObjKey) -> ObjKey {
        self.try_resolve(key).unwrap_or_else(|err| {
            warn!("{}; using null instead", err);
            ObjKey::Null
        })
    }

    /// Structural equality.
    ///
    /// Scalars compare by value, arrays element-wise, dictionaries by their key
    /// sets and values. Two references to the same object number and generation
    /// are equal; otherwise references compare by the objects they resolve to.
    pub fn compare(&self, a: ObjKey, b: ObjKey) -> bool {
        let mut visiting = HashSet::new();
        self.compare_inner(a, b, &mut visiting)
    }

    fn compare_inner(&self, a: ObjKey, b: ObjKey, visiting: &mut HashSet<(ObjKey, ObjKey)>) -> bool {
        if a == b {
            return true;
        }

        let (ref_a, ref_b) = (self.reference(a).ok(), self.reference(b).ok());
        if ref_a.is_some() || ref_b.is_some() {
            if ref_a.is_some() && ref_a == ref_b {
                return true;
            }
            // A pair already under comparison is assumed equal; this is what
            // stops the walk on cyclic graphs.
            if !visiting.insert((a, b)) {
                return true;
            }
            return self.compare_inner(self.resolve(a), self.resolve(b), visiting);
        }

        if let (Ok(name_a), Ok(name_b)) = (self.name_bytes(a), self.name_bytes(b)) {
            return name_a == name_b;
        }
        if a.is_predefined() || b.is_predefined() {
            return false;
        }

        match (self.body(a), self.body(b)) {
            (Some(Body::Integer(x)), Some(Body::Integer(y))) => x == y,
            (Some(Body::Real(x)), Some(Body::Real(y))) => x == y,
            (Some(Body::String(x)), Some(Body::String(y))) => x.bytes == y.bytes,
            (Some(Body::Array(x)), Some(Body::Array(y))) => {
                x.len() == y.len()
                    && x.iter()
                        .zip(y.iter())
                        .all(|(x, y)| self.compare_inner(*x, *y, visiting))
            }
            (Some(Body::Dictionary(x)), Some(Body::Dictionary(y))) => self.compare_dicts(x, y, visiting),
            (Some(Body::Stream(x)), Some(Body::Stream(y))) => {
                self.compare_dicts(&x.dict, &y.dict, visiting) && x.payload.same_bytes(&y.payload)
            }
            _ => false,
        }
    }

    fn compare_dicts(
        &self, x: &crate::dictionary::Dict, y: &crate::dictionary::Dict, visiting: &mut HashSet<(ObjKey, ObjKey)>,
    ) -> bool {
        x.len() == y.len()
            && x.iter().all(|(name, value_x)| match y.get(name) {
                Some(value_y) => self.compare_inner(*value_x, *value_y, visiting),
                None => false,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StringFormat;

    fn chain(store: &mut Store, length: u32) -> ObjKey {
        // Object 1 holds the target, objects 2..=length+1 each point one lower.
        let target = store.new_integer(42);
        store.update((1, 0), target).unwrap();
        for number in 2..=length {
            let link = store.new_reference((number - 1, 0));
            store.update((number, 0), link).unwrap();
        }
        store.new_reference((length, 0))
    }

    #[test]
    fn chain_within_limit_resolves() {
        let mut store = Store::new();
        let start = chain(&mut store, MAX_REFERENCE_CHAIN as u32);
        let resolved = store.resolve(start);
        assert_eq!(store.as_i64(resolved).unwrap(), 42);
    }

    #[test]
    fn chain_over_limit_resolves_to_null() {
        let mut store = Store::new();
        let start = chain(&mut store, MAX_REFERENCE_CHAIN as u32 + 1);
        assert_eq!(store.resolve(start), ObjKey::Null);
        assert!(matches!(store.try_resolve(start), Err(Error::DanglingReference(_))));
    }

    #[test]
    fn cycle_resolves_to_null() {
        let mut store = Store::new();
        let to_two = store.new_reference((2, 0));
        let to_one = store.new_reference((1, 0));
        store.update((1, 0), to_two).unwrap();
        store.update((2, 0), to_one).unwrap();
        let start = store.new_reference((1, 0));
        assert_eq!(store.resolve(start), ObjKey::Null);
    }

    #[test]
    fn missing_and_mismatched_slots_are_dangling() {
        let mut store = Store::new();
        let missing = store.new_reference((9, 0));
        assert_eq!(store.resolve(missing), ObjKey::Null);

        let value = store.new_integer(1);
        store.update((3, 1), value).unwrap();
        let wrong_generation = store.new_reference((3, 0));
        assert_eq!(store.resolve(wrong_generation), ObjKey::Null);
        let right_generation = store.new_reference((3, 1));
        assert_eq!(store.resolve(right_generation), value);
    }

    #[test]
    fn references_compare_by_target_value() {
        let mut store = Store::new();
        let first = store.new_string(b"same".to_vec(), StringFormat::Literal);
        let second = store.new_string(b"same".to_vec(), StringFormat::Hexadecimal);
        store.update((1, 0), first).unwrap();
        store.update((2, 0), second).unwrap();
        let ref_one = store.new_reference((1, 0));
        let ref_two = store.new_reference((2, 0));
        let ref_one_again = store.new_reference((1, 0));
        assert!(store.compare(ref_one, ref_one_again));
        assert!(store.compare(ref_one, ref_two));
        assert!(store.compare(ref_one, first));
    }

    #[test]
    fn cyclic_graphs_compare_without_looping() {
        let mut store = Store::new();
        // 1 0 obj [2 0 R]   2 0 obj [1 0 R]
        let first = store.new_array();
        let second = store.new_array();
        let to_second = store.new_reference((2, 0));
        let to_first = store.new_reference((1, 0));
        store.array_push(first, to_second).unwrap();
        store.array_push(second, to_first).unwrap();
        store.update((1, 0), first).unwrap();
        store.update((2, 0), second).unwrap();
        assert!(store.compare(first, second));
    }

    #[test]
    fn mismatched_kinds_are_unequal() {
        let mut store = Store::new();
        let integer = store.new_integer(1);
        let real = store.new_real(1.0);
        assert!(!store.compare(integer, real));
        assert!(!store.compare(ObjKey::Null, ObjKey::False));
        assert!(store.compare(ObjKey::True, ObjKey::True));
    }
}
