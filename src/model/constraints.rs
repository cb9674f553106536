//! Constraints registry: single-point fixities and multi-point constraints

use crate::elements::{Fixity, MpConstraint, RigidLinkKind};
use crate::error::{BuildError, BuildResult};
use crate::registry::Registry;
use crate::session::EngineSession;

/// Owner of the boundary conditions of a model
///
/// Fixities are keyed by node tag; creating one at a node that already has
/// a fixity replaces it. Multi-point constraints are append-only and keep
/// their insertion order.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    fixities: Registry<u32, Fixity>,
    mp: Vec<MpConstraint>,
    pub(crate) locked: bool,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fixities(&self) -> &Registry<u32, Fixity> {
        &self.fixities
    }

    pub fn fixity(&self, node: u32) -> Option<&Fixity> {
        self.fixities.get(&node)
    }

    pub fn mp_constraints(&self) -> &[MpConstraint] {
        &self.mp
    }

    /// Fix the flagged DOFs of a node, replacing any earlier fixity
    pub fn create_constraint(&mut self, node: u32, dofs: [bool; 6]) -> &Fixity {
        self.add_constraint(Fixity::new(node, dofs))
    }

    pub fn add_constraint(&mut self, fixity: Fixity) -> &Fixity {
        if self.fixities.contains_key(&fixity.node) {
            log::info!("Replaced constraint at node {}", fixity.node);
        } else {
            log::info!("Added constraint at node {}", fixity.node);
        }
        self.fixities.upsert(fixity.node, fixity)
    }

    /// Merge per-DOF flags into an existing fixity; `None` keeps a DOF as is
    pub fn update_constraint(&mut self, node: u32, dofs: [Option<bool>; 6]) -> BuildResult<&Fixity> {
        if self.locked {
            return Err(BuildError::ModelBuilt {
                operation: "update constraints",
            });
        }
        let merged = self
            .fixities
            .get(&node)
            .map(|f| f.merged(dofs))
            .ok_or_else(|| BuildError::invalid(format!("no constraint at node {node}")))?;
        Ok(self.fixities.upsert(node, merged))
    }

    pub fn remove_constraint(&mut self, node: u32) -> BuildResult<bool> {
        if self.locked {
            return Err(BuildError::ModelBuilt {
                operation: "remove constraints",
            });
        }
        Ok(self.drop_fixity(node))
    }

    pub fn create_equal_dof(
        &mut self,
        retained: u32,
        constrained: u32,
        dofs: Vec<u8>,
    ) -> BuildResult<&MpConstraint> {
        Ok(self.add_mp_constraint(MpConstraint::equal_dof(retained, constrained, dofs)?))
    }

    pub fn create_rigid_diaphragm(
        &mut self,
        direction: u8,
        master: u32,
        slaves: Vec<u32>,
    ) -> BuildResult<&MpConstraint> {
        Ok(self.add_mp_constraint(MpConstraint::rigid_diaphragm(direction, master, slaves)?))
    }

    pub fn create_rigid_link(&mut self, kind: RigidLinkKind, master: u32, slave: u32) -> &MpConstraint {
        self.add_mp_constraint(MpConstraint::rigid_link(kind, master, slave))
    }

    pub fn add_mp_constraint(&mut self, constraint: MpConstraint) -> &MpConstraint {
        self.mp.push(constraint);
        let index = self.mp.len() - 1;
        log::info!("Added multi-point constraint #{index}");
        &self.mp[index]
    }

    /// Forget the fixity at a node without any state check
    pub(crate) fn drop_fixity(&mut self, node: u32) -> bool {
        let removed = self.fixities.remove(&node).is_some();
        if removed {
            log::info!("Removed constraint at node {node}");
        }
        removed
    }

    pub(crate) fn realize_fixities(&mut self, session: &mut dyn EngineSession) -> BuildResult<()> {
        for fixity in self.fixities.values_mut() {
            fixity.realize(session)?;
        }
        Ok(())
    }

    pub(crate) fn realize_mp(&mut self, session: &mut dyn EngineSession) -> BuildResult<()> {
        for constraint in &mut self.mp {
            constraint.realize(session)?;
        }
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.fixities.clear();
        self.mp.clear();
        self.locked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::RecordingSession;

    #[test]
    fn test_create_constraint_replaces_by_node() {
        let mut constraints = Constraints::new();
        constraints.create_constraint(1, [true; 6]);
        constraints.create_constraint(2, [true, true, true, false, false, false]);
        constraints.create_constraint(1, [true, true, true, false, false, false]);
        assert_eq!(constraints.fixities().len(), 2);
        assert_eq!(constraints.fixity(1).unwrap().dofs, [true, true, true, false, false, false]);
        let nodes: Vec<&u32> = constraints.fixities().keys().collect();
        assert_eq!(nodes, vec![&1, &2]);
    }

    #[test]
    fn test_update_merges_flags_and_is_guarded() {
        let mut constraints = Constraints::new();
        constraints.create_constraint(3, [true; 6]);
        let updated = constraints
            .update_constraint(3, [None, None, None, Some(false), Some(false), None])
            .unwrap();
        assert_eq!(updated.dofs, [true, true, true, false, false, true]);
        assert!(constraints.update_constraint(9, [None; 6]).is_err());

        constraints.locked = true;
        assert!(matches!(
            constraints.remove_constraint(3),
            Err(BuildError::ModelBuilt { .. })
        ));
        assert!(constraints.fixity(3).is_some());
    }

    #[test]
    fn test_fixities_realize_before_mp_in_insertion_order() {
        let mut constraints = Constraints::new();
        constraints.create_rigid_diaphragm(3, 10, vec![11, 12]).unwrap();
        constraints.create_equal_dof(1, 2, vec![1, 2]).unwrap();
        constraints.create_equal_dof(1, 2, vec![1, 2]).unwrap();
        constraints.create_constraint(1, [true; 6]);

        let mut session = RecordingSession::new();
        constraints.realize_fixities(&mut session).unwrap();
        constraints.realize_mp(&mut session).unwrap();
        constraints.realize_mp(&mut session).unwrap();
        assert_eq!(
            session.kinds(),
            vec!["fix", "rigidDiaphragm", "equalDOF", "equalDOF"]
        );
    }

    #[test]
    fn test_invalid_mp_constraints_are_rejected() {
        let mut constraints = Constraints::new();
        assert!(constraints.create_equal_dof(1, 2, vec![]).is_err());
        assert!(constraints.create_rigid_diaphragm(4, 1, vec![2]).is_err());
        assert!(constraints.mp_constraints().is_empty());
    }
}
