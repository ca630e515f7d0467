//! The automaton algebra: nondeterministic and deterministic finite automata, ε-closure and
//! subset construction.
//!
//! States are plain integer indices into a flat vector the automaton owns, not a graph of
//! pointers — cycles (from `Star`/`Plus`) are just back-edges in the transition map. This mirrors
//! the reference crate's `custom_regex.rs` `NFA`/`DFA` (a `Vec`-backed transition list plus a
//! `BTreeSet<usize>`-keyed `DFAState`), generalized from a single-pattern matcher to the
//! multi-rule, totalized form the lexer compiler needs.

use log::trace;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// A single NFA state id, contiguous from 0 as Thompson's construction produces it.
pub type NfaState = u32;

/// Nondeterministic finite automaton over `char` symbols plus ε-transitions.
///
/// Invariants (see SPEC_FULL.md §3): `q0` is a member of `states`; every state named in `delta`'s
/// domain or range is a member of `states`; every non-ε symbol appearing in `delta` is a member of
/// `alphabet`.
#[derive(Debug, Clone)]
pub struct Nfa {
    pub alphabet: BTreeSet<char>,
    pub states: BTreeSet<NfaState>,
    pub start: NfaState,
    /// `None` key (by convention, symbol `'\0'` never occurs as a real symbol so we use `Option`)
    /// represents ε. Keyed on `(state, Option<char>)` to keep one map for both.
    pub delta: BTreeMap<(NfaState, Option<char>), BTreeSet<NfaState>>,
    pub accept: BTreeSet<NfaState>,
}

impl Nfa {
    /// An automaton with a single state, no transitions, and that one state both start and
    /// (optionally) accepting.
    pub fn single_state(accepting: bool) -> Self {
        let mut accept = BTreeSet::new();
        if accepting {
            accept.insert(0);
        }
        Nfa {
            alphabet: BTreeSet::new(),
            states: BTreeSet::from([0]),
            start: 0,
            delta: BTreeMap::new(),
            accept,
        }
    }

    fn add_epsilon(&mut self, from: NfaState, to: NfaState) {
        self.delta.entry((from, None)).or_default().insert(to);
    }

    fn add_on(&mut self, from: NfaState, symbol: char, to: NfaState) {
        self.alphabet.insert(symbol);
        self.delta.entry((from, Some(symbol))).or_default().insert(to);
    }

    /// The smallest set containing `state` and closed under ε-transitions. Idempotent:
    /// `epsilon_closure(epsilon_closure(q)) == epsilon_closure(q)`.
    pub fn epsilon_closure(&self, state: NfaState) -> BTreeSet<NfaState> {
        let mut closure = BTreeSet::new();
        let mut worklist = VecDeque::from([state]);
        while let Some(s) = worklist.pop_front() {
            if !closure.insert(s) {
                continue;
            }
            if let Some(targets) = self.delta.get(&(s, None)) {
                worklist.extend(targets.iter().copied());
            }
        }
        closure
    }

    fn epsilon_closure_set(&self, states: impl IntoIterator<Item = NfaState>) -> BTreeSet<NfaState> {
        let mut closure = BTreeSet::new();
        for s in states {
            closure.extend(self.epsilon_closure(s));
        }
        closure
    }

    fn move_on(&self, states: &BTreeSet<NfaState>, symbol: char) -> BTreeSet<NfaState> {
        let mut reached = BTreeSet::new();
        for &s in states {
            if let Some(targets) = self.delta.get(&(s, Some(symbol))) {
                reached.extend(targets.iter().copied());
            }
        }
        reached
    }

    /// Apply `f` uniformly to the start state, every state, every key/value appearing in `delta`,
    /// and every accept state. `f` must be injective on the reachable state set.
    pub fn relabel(&self, f: impl Fn(NfaState) -> NfaState) -> Nfa {
        let states = self.states.iter().map(|&s| f(s)).collect();
        let accept = self.accept.iter().map(|&s| f(s)).collect();
        let mut delta = BTreeMap::new();
        for (&(state, symbol), targets) in &self.delta {
            delta.insert(
                (f(state), symbol),
                targets.iter().map(|&t| f(t)).collect(),
            );
        }
        Nfa {
            alphabet: self.alphabet.clone(),
            states,
            start: f(self.start),
            delta,
            accept,
        }
    }

    /// Union this NFA's automaton data in-place with `other`, assuming the caller has already
    /// shifted `other`'s state ids so the two sets are disjoint.
    pub fn merge_from(&mut self, other: &Nfa) {
        self.alphabet.extend(other.alphabet.iter().copied());
        self.states.extend(other.states.iter().copied());
        self.accept.extend(other.accept.iter().copied());
        for (&key, targets) in &other.delta {
            self.delta.entry(key).or_default().extend(targets.iter().copied());
        }
    }

    /// Subset construction (SPEC_FULL.md §4.1): convert this NFA into an equivalent, total DFA.
    /// Deterministic: running it twice on the same NFA yields isomorphic DFAs (same reachable
    /// subsets, same canonical ids, since the worklist order is itself deterministic).
    pub fn subset_construction(&self) -> Dfa {
        let start_set = self.epsilon_closure(self.start);

        let mut table = SubsetTable::new();
        let start_id = table.intern(start_set.clone());

        let mut worklist = VecDeque::from([start_id]);
        let mut seen = BTreeSet::from([start_id]);
        let mut delta = BTreeMap::new();
        let mut sink: Option<DfaState> = None;

        while let Some(id) = worklist.pop_front() {
            let current = table.set_for(id).clone();
            for &symbol in &self.alphabet {
                let reached = self.epsilon_closure_set(self.move_on(&current, symbol));
                if reached.is_empty() {
                    let sink_id = *sink.get_or_insert_with(|| table.intern(BTreeSet::new()));
                    delta.insert((id, symbol), sink_id);
                } else {
                    let target_id = table.intern(reached);
                    if seen.insert(target_id) {
                        trace!("subset_construction: discovered state {target_id} from {id} on {symbol:?}");
                        worklist.push_back(target_id);
                    }
                    delta.insert((id, symbol), target_id);
                }
            }
        }

        if let Some(sink_id) = sink {
            for &symbol in &self.alphabet {
                delta.entry((sink_id, symbol)).or_insert(sink_id);
            }
        }

        let accept = table
            .all_ids()
            .filter(|&id| table.set_for(id).iter().any(|s| self.accept.contains(s)))
            .collect();

        Dfa {
            alphabet: self.alphabet.clone(),
            states: table.all_ids().collect(),
            start: start_id,
            delta,
            accept,
            subsets: table,
        }
    }
}

/// A DFA state id: a canonical, incrementing index assigned the first time a given frozen NFA
/// subset is encountered during subset construction.
pub type DfaState = u32;

/// Interns frozen NFA-state subsets to canonical `DfaState` ids, so equal subsets always map to
/// the same id (content-based identity, as SPEC_FULL.md §9 calls for), backed by a side table
/// rather than re-deriving identity from a formatted string.
#[derive(Debug, Clone, Default)]
pub struct SubsetTable {
    by_set: BTreeMap<BTreeSet<NfaState>, DfaState>,
    by_id: Vec<BTreeSet<NfaState>>,
}

impl SubsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, set: BTreeSet<NfaState>) -> DfaState {
        if let Some(&id) = self.by_set.get(&set) {
            return id;
        }
        let id = self.by_id.len() as DfaState;
        self.by_id.push(set.clone());
        self.by_set.insert(set, id);
        id
    }

    pub fn set_for(&self, id: DfaState) -> &BTreeSet<NfaState> {
        &self.by_id[id as usize]
    }

    pub fn all_ids(&self) -> impl Iterator<Item = DfaState> {
        0..self.by_id.len() as DfaState
    }
}

/// Deterministic finite automaton: `delta` is total over `states x alphabet` once constructed by
/// `Nfa::subset_construction`.
#[derive(Debug, Clone)]
pub struct Dfa {
    pub alphabet: BTreeSet<char>,
    pub states: BTreeSet<DfaState>,
    pub start: DfaState,
    pub delta: BTreeMap<(DfaState, char), DfaState>,
    pub accept: BTreeSet<DfaState>,
    /// The NFA-state subset each DFA state was built from; the lexer compiler uses this to
    /// recover which rule an accept state belongs to (SPEC_FULL.md §4.4).
    pub subsets: SubsetTable,
}

impl Dfa {
    /// Simulate the DFA on `word`; true iff it ends in an accept state. Pure over `self`.
    pub fn accept(&self, word: &str) -> bool {
        let mut state = self.start;
        for c in word.chars() {
            match self.delta.get(&(state, c)) {
                Some(&next) => state = next,
                None => return false,
            }
        }
        self.accept.contains(&state)
    }

    /// Whether `state` is a sink: every transition on every alphabet symbol loops back to itself,
    /// and it is not an accept state. Detected structurally, never by comparing the state's value
    /// identity (a frozen subset) to itself — that only coincides with "sink" for the empty
    /// subset, which is not guaranteed in general.
    pub fn is_sink(&self, state: DfaState) -> bool {
        if self.accept.contains(&state) {
            return false;
        }
        self.alphabet
            .iter()
            .all(|&c| self.delta.get(&(state, c)) == Some(&state))
    }

    /// Apply `f` uniformly to `start`, every state, every key/value in `delta`, and every accept
    /// state. `f` must be injective on the reachable state set.
    pub fn relabel(&self, f: impl Fn(DfaState) -> DfaState) -> Dfa {
        let states = self.states.iter().map(|&s| f(s)).collect();
        let accept = self.accept.iter().map(|&s| f(s)).collect();
        let delta = self
            .delta
            .iter()
            .map(|(&(s, c), &t)| ((f(s), c), f(t)))
            .collect();
        Dfa {
            alphabet: self.alphabet.clone(),
            states,
            start: f(self.start),
            delta,
            accept,
            subsets: self.subsets.clone(),
        }
    }
}
