//! # Stem Connection Map
//!
//! This module contains [`ConnectionMap`], the structure that decides which
//! outbound stem peer a transaction entering the stem phase is forwarded on.
//!
//! The map keeps three simultaneous properties that naive designs violate:
//!
//! - **Stability**: once an inbound source is bound to a stem slot it stays
//!   bound, so transactions from one source always traverse the same stem
//!   path while that stem survives.
//! - **Balanced fan-in**: new sources are placed into the least loaded slot,
//!   so after `M` sources across `k` live slots every slot carries either
//!   `M / k` rounded down or rounded up sources.
//! - **Graceful churn**: losing an outbound connection only unbinds the
//!   sources routed over it, and a replacement peer never steals sources
//!   from slots that kept their peer.
//!
//! ### What The Map Does Not Do
//!
//! It does not decide *when* the node is stemming or fluffing, and it owns no
//! timers. The transport drives it: [`ConnectionMap::update`] whenever the
//! outbound peer set changes and [`ConnectionMap::get_stem`] per routed
//! transaction.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    hash::Hash,
};

/// A stable, balanced mapping from inbound source identifiers to outbound
/// stem peer identifiers.
///
/// The slot vector is the unit of stability: a *slot* is a position that
/// outlives the peers occupying it. Sources bind to slots, not peers, so a
/// dropped peer leaves a *hole* that a later [`update`](Self::update) can
/// refill without disturbing any other binding.
///
/// The map is a single-threaded value: no operation blocks or suspends, and
/// `&mut self` receivers leave serialisation of calls to the owning
/// transport (typically behind its lock).
#[derive(Debug, Clone)]
pub struct ConnectionMap<Id> {
    /// The stem slots. `None` is a hole left by a dropped peer.
    ///
    /// The length is fixed at the target stem count from construction.
    stems: Vec<Option<Id>>,
    /// The number of sources bound to each slot, kept in lockstep with
    /// `stems`.
    ///
    /// A plain vector scanned by index keeps least-loaded tie-breaks
    /// deterministic where an unordered container would not be.
    usage: Vec<usize>,
    /// Sources that have been routed, and the index of the slot each is
    /// bound to.
    sources: HashMap<Id, usize>,
}

impl<Id> Default for ConnectionMap<Id> {
    fn default() -> Self {
        Self {
            stems: Vec::new(),
            usage: Vec::new(),
            sources: HashMap::new(),
        }
    }
}

impl<Id: Hash + Eq + Clone> ConnectionMap<Id> {
    /// Creates a new [`ConnectionMap`] with `stem_count` slots, filling them
    /// from `out_peers`.
    ///
    /// The first `stem_count` distinct peers yielded occupy slots in yield
    /// order; if the iterator runs short the remaining slots start as holes.
    /// Callers supply peers in a deliberate order (or a deliberately shuffled
    /// one), the map itself never reorders them.
    ///
    /// A `stem_count` of zero builds a permanently empty map for which every
    /// operation is a no-op.
    pub fn new(out_peers: impl IntoIterator<Item = Id>, stem_count: usize) -> Self {
        if stem_count == 0 {
            return Self::default();
        }

        let mut stems: Vec<Option<Id>> = Vec::with_capacity(stem_count);

        for peer in out_peers {
            if stems.len() == stem_count {
                break;
            }
            if stems.iter().flatten().any(|stem| *stem == peer) {
                continue;
            }
            stems.push(Some(peer));
        }
        stems.resize_with(stem_count, || None);

        Self {
            usage: vec![0; stem_count],
            stems,
            sources: HashMap::new(),
        }
    }

    /// Returns the stem peer to forward this source's transactions on, or
    /// [`None`] if no stem is available for it right now.
    ///
    /// A source seen before keeps resolving to the slot it is bound to.
    /// While that slot is a hole this returns [`None`] and the binding is
    /// kept: the caller retries after an [`update`](Self::update) has had a
    /// chance to install a replacement peer.
    ///
    /// A new source is bound to the live slot with the fewest bound sources,
    /// ties resolving to the lowest slot index, and [`None`] is returned
    /// without binding when no live slot exists at all.
    pub fn get_stem(&mut self, source: &Id) -> Option<Id> {
        if let Some(&index) = self.sources.get(source) {
            return self.stems[index].clone();
        }

        let index = (0..self.stems.len())
            .filter(|&i| self.stems[i].is_some())
            .min_by_key(|&i| (self.usage[i], i))?;

        self.sources.insert(source.clone(), index);
        self.usage[index] += 1;

        self.stems[index].clone()
    }

    /// Reconciles the slots with the currently available outbound peers,
    /// returning whether any slot's peer changed.
    ///
    /// Slots whose peer left `available` become holes; sources bound to them
    /// keep their slot index and resolve to [`None`] until the hole is
    /// refilled. Holes are then refilled in slot order from the available
    /// peers not already occupying a slot, taken in `available` order. A
    /// peer that kept its slot is never moved to another, and holes persist
    /// when no replacement exists.
    pub fn update(&mut self, available: &[Id]) -> bool {
        if self.stems.is_empty() {
            return false;
        }

        let mut changed = false;

        let available_set: HashSet<&Id> = available.iter().collect();
        for slot in &mut self.stems {
            if slot.as_ref().is_some_and(|stem| !available_set.contains(stem)) {
                *slot = None;
                changed = true;
            }
        }

        let mut spares: VecDeque<&Id> = {
            let mut taken: HashSet<&Id> = self.stems.iter().flatten().collect();
            available.iter().filter(|peer| taken.insert(*peer)).collect()
        };

        for slot in &mut self.stems {
            if slot.is_none() {
                let Some(peer) = spares.pop_front() else {
                    break;
                };
                *slot = Some(peer.clone());
                changed = true;
            }
        }

        changed
    }

    /// The number of live (non-hole) slots.
    pub fn len(&self) -> usize {
        self.stems.iter().flatten().count()
    }

    /// Whether no slot currently holds a peer.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the live slot peers in slot order.
    ///
    /// Every yielded peer is distinct, and the iterator's length equals
    /// [`len`](Self::len).
    pub fn iter(&self) -> impl Iterator<Item = &Id> + '_ {
        self.stems.iter().flatten()
    }
}

impl<'a, Id> IntoIterator for &'a ConnectionMap<Id> {
    type Item = &'a Id;
    type IntoIter = std::iter::Flatten<std::slice::Iter<'a, Option<Id>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.stems.iter().flatten()
    }
}
