use crate::construct::ConstructSet;
use crate::dialect::Dialect;
use std::fmt;
use std::fmt::Display;

/// Reasons why a pass descriptor is rejected when the catalog is assembled.
///
/// These are authoring bugs in the pass, so they are reported before any
/// scheduling runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformationError {
    #[error("pass `{name}` both introduces and eliminates {constructs}")]
    Overlap {
        name: String,
        constructs: ConstructSet,
    },
    #[error("pass `{name}` eliminates nothing and would never be scheduled")]
    NothingEliminated { name: String },
    #[error("pass `{name}` is not allowed on any dialect")]
    NothingAllowed { name: String },
    #[error("invalid pass name `{name}`; expected lowercase letters, digits and `-`")]
    InvalidName { name: String },
}

/// Metadata of a rewrite pass.
///
/// The scheduler only sees this declarative (precondition, effect) pair. The
/// actual rewrite is owned by the engine that registered the pass under
/// [Transformation::name].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transformation {
    name: String,
    allowed: Dialect,
    introduces: ConstructSet,
    eliminates: ConstructSet,
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

impl Transformation {
    pub fn new(
        name: &str,
        allowed: Dialect,
        introduces: ConstructSet,
        eliminates: ConstructSet,
    ) -> Result<Transformation, TransformationError> {
        let name = name.to_string();
        if !is_valid_name(&name) {
            return Err(TransformationError::InvalidName { name });
        }
        let overlap = introduces & eliminates;
        if overlap.any() {
            return Err(TransformationError::Overlap {
                name,
                constructs: overlap,
            });
        }
        if eliminates.none() {
            return Err(TransformationError::NothingEliminated { name });
        }
        if allowed.none() {
            return Err(TransformationError::NothingAllowed { name });
        }
        Ok(Transformation {
            name,
            allowed,
            introduces,
            eliminates,
        })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    /// The dialect the pass accepts as input.
    pub fn allowed(&self) -> Dialect {
        self.allowed
    }
    pub fn introduces(&self) -> ConstructSet {
        self.introduces
    }
    pub fn eliminates(&self) -> ConstructSet {
        self.eliminates
    }
}

impl Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: allowed {} introduces {} eliminates {}",
            self.name, self.allowed, self.introduces, self.eliminates
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::Construct::*;

    #[test]
    fn test_valid() {
        let t = Transformation::new(
            "if-lowering",
            ConstructSet::universal(),
            ConstructSet::from([CondBranch, LocalVariable]),
            ConstructSet::from([NestedIf]),
        )
        .unwrap();
        assert_eq!(t.name(), "if-lowering");
        assert_eq!(t.eliminates(), ConstructSet::from([NestedIf]));
        assert_eq!(
            t.to_string(),
            "if-lowering: allowed {local-variable, nested-if, cond-branch, cpp-class, \
             gcse-unopt, loop-unopt} introduces {local-variable, cond-branch} \
             eliminates {nested-if}"
        );
    }

    #[test]
    fn test_overlap_rejected() {
        let result = Transformation::new(
            "churn",
            ConstructSet::universal(),
            ConstructSet::from([GcseUnopt, LocalVariable]),
            ConstructSet::from([GcseUnopt]),
        );
        assert_eq!(
            result,
            Err(TransformationError::Overlap {
                name: "churn".to_string(),
                constructs: ConstructSet::from([GcseUnopt]),
            })
        );
    }

    #[test]
    fn test_empty_eliminates_rejected() {
        let result = Transformation::new(
            "noop",
            ConstructSet::universal(),
            ConstructSet::from([LocalVariable]),
            ConstructSet::empty(),
        );
        assert!(matches!(
            result,
            Err(TransformationError::NothingEliminated { .. })
        ));
    }

    #[test]
    fn test_empty_allowed_rejected() {
        let result = Transformation::new(
            "nowhere",
            ConstructSet::empty(),
            ConstructSet::empty(),
            ConstructSet::from([CppClass]),
        );
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "pass `nowhere` is not allowed on any dialect");
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "--if-lowering", "If-Lowering", "if lowering"] {
            let result = Transformation::new(
                name,
                ConstructSet::universal(),
                ConstructSet::empty(),
                ConstructSet::from([NestedIf]),
            );
            assert!(
                matches!(result, Err(TransformationError::InvalidName { .. })),
                "{name:?}"
            );
        }
    }
}
