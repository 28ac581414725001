// Copyright 2026 Oxide Computer Company

use std::hash::Hash;

use indexmap::IndexMap;

/// Which side(s) of a comparison a key was found on.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Pairing<V> {
    AOnly(V),
    Both(V, V),
    BOnly(V),
}

/// Partition of two keyed collections into keys unique to `a`, keys in
/// common, and keys unique to `b`.
///
/// Keys keep the order in which they were first seen: every key of `a` in
/// `a`'s order, followed by the keys only `b` has in `b`'s order. When a
/// collection repeats a key, the last value wins but the key keeps its first
/// position.
#[derive(Debug)]
pub(crate) struct SetCompare<K, V> {
    entries: IndexMap<K, Pairing<V>>,
}

impl<K, V> SetCompare<K, V>
where
    K: Hash + Eq,
{
    pub fn new<I, I2>(a: I, b: I2) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        I2: IntoIterator<Item = (K, V)>,
    {
        let aa = a.into_iter().collect::<IndexMap<_, _>>();
        let mut bb = b.into_iter().collect::<IndexMap<_, _>>();

        let mut entries = IndexMap::with_capacity(aa.len() + bb.len());
        for (k, av) in aa {
            let pairing = match bb.shift_remove(&k) {
                Some(bv) => Pairing::Both(av, bv),
                None => Pairing::AOnly(av),
            };
            entries.insert(k, pairing);
        }
        for (k, bv) in bb {
            entries.insert(k, Pairing::BOnly(bv));
        }

        Self { entries }
    }

    /// Every key in union order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Pairing<V>)> {
        self.entries.iter()
    }

    pub fn a_unique(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().filter_map(|(k, pairing)| match pairing {
            Pairing::AOnly(v) => Some((k, v)),
            _ => None,
        })
    }

    pub fn common(&self) -> impl Iterator<Item = (&K, &V, &V)> {
        self.entries.iter().filter_map(|(k, pairing)| match pairing {
            Pairing::Both(av, bv) => Some((k, av, bv)),
            _ => None,
        })
    }

    pub fn b_unique(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().filter_map(|(k, pairing)| match pairing {
            Pairing::BOnly(v) => Some((k, v)),
            _ => None,
        })
    }
}
