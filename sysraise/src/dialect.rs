//! Dialects and the effect of passes on them.
//!
//! A dialect is the set of constructs that MAY appear in the program at some
//! stage of the pipeline. It is an upper bound, not a requirement: a program
//! in dialect `{local-variable, nested-if}` might not contain a single
//! nested `if`.

use crate::construct::Construct;
use crate::construct::ConstructSet;
use crate::construct::ParseConstructError;
use crate::transformation::Transformation;

/// Constructs permitted at a pipeline stage.
pub type Dialect = ConstructSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DialectError {
    #[error("pass `{pass}` cannot be applied to {dialect}: it does not allow {disallowed}")]
    NotApplicable {
        pass: String,
        dialect: Dialect,
        disallowed: ConstructSet,
    },
}

impl ConstructSet {
    /// Whether every construct that may be present is tolerated by the pass.
    pub fn can_apply(&self, transformation: &Transformation) -> bool {
        *self <= transformation.allowed()
    }
    /// The dialect after running `transformation`.
    ///
    /// Elimination is applied after introduction, so a construct that the
    /// pass both meets and introduces is still gone if the pass eliminates
    /// it.
    ///
    /// # Panics
    ///
    /// Panics if [ConstructSet::can_apply] does not hold. Callers that take
    /// the pass from user input should use [ConstructSet::try_apply].
    pub fn apply(&self, transformation: &Transformation) -> Dialect {
        assert!(
            self.can_apply(transformation),
            "pass `{}` applied to {} outside of its allowed dialect {}",
            transformation.name(),
            self,
            transformation.allowed()
        );
        self.effect(transformation)
    }
    pub fn try_apply(&self, transformation: &Transformation) -> Result<Dialect, DialectError> {
        if !self.can_apply(transformation) {
            return Err(DialectError::NotApplicable {
                pass: transformation.name().to_string(),
                dialect: *self,
                disallowed: *self & !transformation.allowed(),
            });
        }
        Ok(self.effect(transformation))
    }
    fn effect(&self, transformation: &Transformation) -> Dialect {
        (*self | transformation.introduces()) & !transformation.eliminates()
    }
}

/// Names of the preset dialects, in the order they are listed in help texts.
pub const PRESETS: [&str; 4] = ["universal", "empty", "cpp-input", "systemc-output"];

/// Every construct.
pub fn universal() -> Dialect {
    Dialect::universal()
}

/// What the C++ front end produces: anything but flat conditional branches.
pub fn cpp_input() -> Dialect {
    Dialect::universal() & !Dialect::from(Construct::CondBranch)
}

/// What the SystemC back end accepts.
pub fn systemc_output() -> Dialect {
    Dialect::from(Construct::CondBranch)
}

pub fn preset(name: &str) -> Option<Dialect> {
    match name {
        "universal" => Some(universal()),
        "empty" => Some(Dialect::empty()),
        "cpp-input" => Some(cpp_input()),
        "systemc-output" => Some(systemc_output()),
        _ => None,
    }
}

/// Parse either a preset name or a comma-separated list of constructs.
pub fn parse_dialect(src: &str) -> Result<Dialect, ParseConstructError> {
    match preset(src.trim()) {
        Some(dialect) => Ok(dialect),
        None => src.parse::<Dialect>(),
    }
}
