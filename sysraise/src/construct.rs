//! Constructs and fixed-universe construct sets.
//!
//! A [Construct] is a structural feature that a program representation may
//! exhibit at some stage of the pipeline, such as local variables or nested
//! C-style conditionals. The set of constructs is closed: every pass and every
//! dialect preset is written against this exact list, so adding or removing a
//! variant is a breaking change.
//!
//! A [ConstructSet] is a bit vector over that universe. Sets are only
//! partially ordered by inclusion, which is why [ConstructSet] implements
//! [PartialOrd] but not [Ord]: `a <= b` means "a is a subset of b" and two
//! sets can be incomparable.

use std::cmp::Ordering;
use std::fmt;
use std::fmt::Display;
use std::ops::BitAnd;
use std::ops::BitAndAssign;
use std::ops::BitOr;
use std::ops::BitOrAssign;
use std::ops::Not;
use std::str::FromStr;

/// A structural program feature.
///
/// The declaration order is also the bit order and the display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Construct {
    LocalVariable,
    NestedIf,
    CondBranch,
    CppClass,
    GcseUnopt,
    LoopUnopt,
}

impl Construct {
    pub const ALL: [Construct; 6] = [
        Construct::LocalVariable,
        Construct::NestedIf,
        Construct::CondBranch,
        Construct::CppClass,
        Construct::GcseUnopt,
        Construct::LoopUnopt,
    ];
    pub const COUNT: usize = Self::ALL.len();

    fn bit(self) -> u64 {
        1 << (self as u32)
    }
    /// Stable kebab-case name; used in diagnostics and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Construct::LocalVariable => "local-variable",
            Construct::NestedIf => "nested-if",
            Construct::CondBranch => "cond-branch",
            Construct::CppClass => "cpp-class",
            Construct::GcseUnopt => "gcse-unopt",
            Construct::LoopUnopt => "loop-unopt",
        }
    }
    pub fn description(self) -> &'static str {
        match self {
            Construct::LocalVariable => "Automatic variables declared inside a function body",
            Construct::NestedIf => "C-style if statements nested inside other statements",
            Construct::CondBranch => "Flat conditional branches between labelled states",
            Construct::CppClass => "C++ classes that are not yet SystemC modules",
            Construct::GcseUnopt => "Common subexpressions that were not eliminated",
            Construct::LoopUnopt => "Loops whose induction variables were not reduced",
        }
    }
}

impl Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseConstructError {
    #[error("unknown construct `{0}`")]
    Unknown(String),
}

impl FromStr for Construct {
    type Err = ParseConstructError;

    /// Accepts `local-variable` as well as `LOCAL_VARIABLE`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Construct::ALL
            .iter()
            .find(|construct| construct.name() == normalized)
            .copied()
            .ok_or_else(|| ParseConstructError::Unknown(s.trim().to_string()))
    }
}

/// A set of [Construct]s.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConstructSet(u64);

impl ConstructSet {
    const UNIVERSE: u64 = (1 << Construct::COUNT) - 1;

    pub const fn empty() -> ConstructSet {
        ConstructSet(0)
    }
    /// The set containing every construct of the universe.
    pub const fn universal() -> ConstructSet {
        ConstructSet(Self::UNIVERSE)
    }
    /// Whether the set contains at least one construct.
    pub fn any(&self) -> bool {
        self.0 != 0
    }
    pub fn none(&self) -> bool {
        self.0 == 0
    }
    pub fn contains(&self, construct: Construct) -> bool {
        self.0 & construct.bit() != 0
    }
    pub fn insert(&mut self, construct: Construct) {
        self.0 |= construct.bit();
    }
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }
    pub fn is_empty(&self) -> bool {
        self.none()
    }
    /// Non-strict inclusion. Same as `self <= other`.
    pub fn is_subset(&self, other: &ConstructSet) -> bool {
        (*self & !*other).none()
    }
    /// Iterate over the members in universe order.
    pub fn iter(&self) -> impl Iterator<Item = Construct> + '_ {
        Construct::ALL
            .iter()
            .copied()
            .filter(move |construct| self.contains(*construct))
    }
}

impl From<Construct> for ConstructSet {
    fn from(construct: Construct) -> Self {
        ConstructSet(construct.bit())
    }
}

impl<const N: usize> From<[Construct; N]> for ConstructSet {
    fn from(constructs: [Construct; N]) -> Self {
        constructs.into_iter().collect()
    }
}

impl FromIterator<Construct> for ConstructSet {
    fn from_iter<I: IntoIterator<Item = Construct>>(iter: I) -> Self {
        let mut set = ConstructSet::empty();
        for construct in iter {
            set.insert(construct);
        }
        set
    }
}

impl BitOr for ConstructSet {
    type Output = ConstructSet;
    fn bitor(self, rhs: ConstructSet) -> ConstructSet {
        ConstructSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for ConstructSet {
    fn bitor_assign(&mut self, rhs: ConstructSet) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ConstructSet {
    type Output = ConstructSet;
    fn bitand(self, rhs: ConstructSet) -> ConstructSet {
        ConstructSet(self.0 & rhs.0)
    }
}

impl BitAndAssign for ConstructSet {
    fn bitand_assign(&mut self, rhs: ConstructSet) {
        self.0 &= rhs.0;
    }
}

/// Complement within the universe; bits outside of it stay clear.
impl Not for ConstructSet {
    type Output = ConstructSet;
    fn not(self) -> ConstructSet {
        ConstructSet(!self.0 & Self::UNIVERSE)
    }
}

/// Inclusion order. Returns `None` when neither set contains the other.
impl PartialOrd for ConstructSet {
    fn partial_cmp(&self, other: &ConstructSet) -> Option<Ordering> {
        if self == other {
            Some(Ordering::Equal)
        } else if self.is_subset(other) {
            Some(Ordering::Less)
        } else if other.is_subset(self) {
            Some(Ordering::Greater)
        } else {
            None
        }
    }
}

impl Display for ConstructSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.iter().map(|c| c.name()).collect::<Vec<_>>();
        write!(f, "{{{}}}", names.join(", "))
    }
}

impl FromStr for ConstructSet {
    type Err = ParseConstructError;

    /// Parse a comma-separated list such as `{nested-if, cpp-class}`. The
    /// braces are optional and an empty list is the empty set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('{').unwrap_or(s);
        let s = s.strip_suffix('}').unwrap_or(s);
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(Construct::from_str)
            .collect()
    }
}
