//! The collection of passes that is available to the scheduler.

use crate::construct::Construct;
use crate::construct::ConstructSet;
use crate::dialect::Dialect;
use crate::schedule::Plan;
use crate::schedule::Step;
use crate::transform::Passes;
use crate::transformation::Transformation;
use crate::transformation::TransformationError;
use anyhow::Context;
use anyhow::Result;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("pass `{name}` is registered twice")]
    DuplicatePass { name: String },
    #[error(transparent)]
    Invalid(#[from] TransformationError),
}

/// An ordered collection of [Transformation]s.
///
/// The order is significant: when two plans are equally short, the
/// scheduler returns the one whose passes come first in the catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    passes: Vec<Transformation>,
}

impl Catalog {
    pub fn new() -> Catalog {
        Catalog { passes: vec![] }
    }
    pub fn from_vec(passes: Vec<Transformation>) -> Result<Catalog, CatalogError> {
        let mut catalog = Catalog::new();
        for pass in passes {
            catalog.register(pass)?;
        }
        Ok(catalog)
    }
    /// Add a pass at the end of the catalog.
    pub fn register(&mut self, pass: Transformation) -> Result<(), CatalogError> {
        if self.get(pass.name()).is_some() {
            return Err(CatalogError::DuplicatePass {
                name: pass.name().to_string(),
            });
        }
        debug!("Registered {pass}");
        self.passes.push(pass);
        Ok(())
    }
    pub fn get(&self, name: &str) -> Option<&Transformation> {
        self.passes.iter().find(|pass| pass.name() == name)
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Transformation> {
        self.passes.iter()
    }
    pub fn names(&self) -> Vec<&str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }
    pub fn len(&self) -> usize {
        self.passes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
    /// Run the given passes in order, starting from `start`.
    ///
    /// This is how hand-written pipelines are checked: every pass must exist
    /// and must be applicable to the dialect left by its predecessor. Unlike
    /// [crate::schedule()], no goal is involved.
    pub fn replay(&self, start: Dialect, passes: &Passes) -> Result<Plan> {
        let mut plan = Plan::new(start);
        for (i, single) in passes.vec().iter().enumerate() {
            let name = single.to_string();
            let pass = self
                .get(&name)
                .ok_or_else(|| anyhow::anyhow!("Unknown pass: {}", name))?;
            let dialect = plan
                .last()
                .try_apply(pass)
                .with_context(|| format!("Pipeline step {} is invalid", i + 1))?;
            plan.push(Step::new(pass.clone(), dialect));
        }
        Ok(plan)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Transformation;
    type IntoIter = std::slice::Iter<'a, Transformation>;
    fn into_iter(self) -> Self::IntoIter {
        self.passes.iter()
    }
}

fn raising_pass(
    name: &str,
    introduces: &[Construct],
    eliminates: &[Construct],
) -> Result<Transformation, TransformationError> {
    Transformation::new(
        name,
        Dialect::universal(),
        introduces.iter().copied().collect::<ConstructSet>(),
        eliminates.iter().copied().collect::<ConstructSet>(),
    )
}

/// The passes that the raising pipeline ships with.
pub fn default_catalog() -> Result<Catalog, CatalogError> {
    use Construct::*;
    Catalog::from_vec(vec![
        raising_pass("gcse-elimination", &[], &[GcseUnopt])?,
        raising_pass("loop-induction", &[LocalVariable, GcseUnopt], &[LoopUnopt])?,
        raising_pass("if-lowering", &[CondBranch, LocalVariable], &[NestedIf])?,
        raising_pass("staticise-locals", &[], &[LocalVariable])?,
        raising_pass("modularise-classes", &[NestedIf], &[CppClass])?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::Construct::*;

    #[test]
    fn test_default_catalog() {
        let catalog = default_catalog().unwrap();
        assert_eq!(
            catalog.names(),
            vec![
                "gcse-elimination",
                "loop-induction",
                "if-lowering",
                "staticise-locals",
                "modularise-classes"
            ]
        );
        let loop_induction = catalog.get("loop-induction").unwrap();
        assert!(loop_induction.introduces().contains(GcseUnopt));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut catalog = default_catalog().unwrap();
        let pass = raising_pass("if-lowering", &[], &[NestedIf]).unwrap();
        let err = catalog.register(pass).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicatePass {
                name: "if-lowering".to_string()
            }
        );
        assert_eq!(catalog.len(), 5);
    }

    #[test]
    fn test_replay() {
        let catalog = default_catalog().unwrap();
        let start = Dialect::from([NestedIf, LocalVariable]);
        let passes = Passes::from_vec(vec!["--if-lowering", "staticise-locals"]);
        let plan = catalog.replay(start, &passes).unwrap();
        assert_eq!(plan.pass_names(), vec!["if-lowering", "staticise-locals"]);
        assert_eq!(
            plan.dialects(),
            vec![
                start,
                Dialect::from([LocalVariable, CondBranch]),
                Dialect::from([CondBranch]),
            ]
        );
    }

    #[test]
    fn test_replay_unknown_pass() {
        let catalog = default_catalog().unwrap();
        let passes = Passes::from_vec(vec!["--inline-everything"]);
        let err = catalog.replay(Dialect::empty(), &passes).unwrap_err();
        assert_eq!(err.to_string(), "Unknown pass: inline-everything");
    }

    #[test]
    fn test_replay_inapplicable_pass() {
        let restricted = Transformation::new(
            "flatten-ifs",
            Dialect::from([NestedIf]),
            ConstructSet::empty(),
            ConstructSet::from([NestedIf]),
        )
        .unwrap();
        let catalog = Catalog::from_vec(vec![restricted]).unwrap();
        let passes = Passes::from_vec(vec!["flatten-ifs"]);
        let err = catalog
            .replay(Dialect::from([NestedIf, CppClass]), &passes)
            .unwrap_err();
        assert_eq!(err.to_string(), "Pipeline step 1 is invalid");
        assert!(format!("{err:#}").contains("does not allow {cpp-class}"));
    }
}
