//! Single-point fixities and multi-point constraints

use crate::command::Command;
use crate::error::{BuildError, BuildResult};
use crate::session::EngineSession;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Single-point fixity of one node, one flag per DOF
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixity {
    pub node: u32,
    /// [UX, UY, UZ, RX, RY, RZ], true when fixed
    pub dofs: [bool; 6],

    #[serde(skip)]
    pub(crate) realized: bool,
}

impl Fixity {
    pub fn new(node: u32, dofs: [bool; 6]) -> Self {
        Self {
            node,
            dofs,
            realized: false,
        }
    }

    pub fn fixed(node: u32) -> Self {
        Self::new(node, [true; 6])
    }

    pub fn pinned(node: u32) -> Self {
        Self::new(node, [true, true, true, false, false, false])
    }

    pub fn is_realized(&self) -> bool {
        self.realized
    }

    /// Overwrite only the DOFs given as `Some`
    pub fn merged(&self, dofs: [Option<bool>; 6]) -> Self {
        let mut out = self.dofs;
        for (slot, flag) in out.iter_mut().zip(dofs) {
            if let Some(flag) = flag {
                *slot = flag;
            }
        }
        Self::new(self.node, out)
    }

    pub fn command(&self) -> Command {
        Command::new("fix").arg(self.node).args(self.dofs)
    }

    pub fn realize(&mut self, session: &mut dyn EngineSession) -> BuildResult<()> {
        if self.realized {
            return Ok(());
        }
        session.execute(&self.command())?;
        self.realized = true;
        log::debug!("Realized fixity at node {}", self.node);
        Ok(())
    }
}

/// Rigid link formulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RigidLinkKind {
    Bar,
    Beam,
}

impl RigidLinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Beam => "beam",
        }
    }
}

impl FromStr for RigidLinkKind {
    type Err = BuildError;

    fn from_str(s: &str) -> BuildResult<Self> {
        match s {
            "bar" => Ok(Self::Bar),
            "beam" => Ok(Self::Beam),
            other => Err(BuildError::invalid(format!(
                "rigid link type must be 'bar' or 'beam', got '{other}'"
            ))),
        }
    }
}

/// Multi-point constraint kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MpConstraintKind {
    EqualDof {
        retained: u32,
        constrained: u32,
        dofs: Vec<u8>,
    },
    RigidDiaphragm {
        direction: u8,
        master: u32,
        slaves: Vec<u32>,
    },
    RigidLink {
        kind: RigidLinkKind,
        master: u32,
        slave: u32,
    },
}

/// A multi-point constraint, realized in insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpConstraint {
    pub kind: MpConstraintKind,

    #[serde(skip)]
    pub(crate) realized: bool,
}

impl MpConstraint {
    pub fn equal_dof(retained: u32, constrained: u32, dofs: Vec<u8>) -> BuildResult<Self> {
        if dofs.is_empty() {
            return Err(BuildError::invalid("equalDOF needs at least one DOF"));
        }
        if let Some(bad) = dofs.iter().find(|d| !(1..=6).contains(*d)) {
            return Err(BuildError::invalid(format!(
                "equalDOF DOF {bad} is outside 1..=6"
            )));
        }
        Ok(Self::wrap(MpConstraintKind::EqualDof {
            retained,
            constrained,
            dofs,
        }))
    }

    pub fn rigid_diaphragm(direction: u8, master: u32, slaves: Vec<u32>) -> BuildResult<Self> {
        if !(1..=3).contains(&direction) {
            return Err(BuildError::invalid(format!(
                "rigid diaphragm direction must be 1, 2 or 3, got {direction}"
            )));
        }
        if slaves.is_empty() {
            return Err(BuildError::invalid("rigid diaphragm needs at least one slave node"));
        }
        Ok(Self::wrap(MpConstraintKind::RigidDiaphragm {
            direction,
            master,
            slaves,
        }))
    }

    pub fn rigid_link(kind: RigidLinkKind, master: u32, slave: u32) -> Self {
        Self::wrap(MpConstraintKind::RigidLink {
            kind,
            master,
            slave,
        })
    }

    fn wrap(kind: MpConstraintKind) -> Self {
        Self {
            kind,
            realized: false,
        }
    }

    pub fn is_realized(&self) -> bool {
        self.realized
    }

    /// Node tags this constraint touches
    pub fn nodes(&self) -> Vec<u32> {
        match &self.kind {
            MpConstraintKind::EqualDof {
                retained,
                constrained,
                ..
            } => vec![*retained, *constrained],
            MpConstraintKind::RigidDiaphragm { master, slaves, .. } => {
                std::iter::once(*master).chain(slaves.iter().copied()).collect()
            }
            MpConstraintKind::RigidLink { master, slave, .. } => vec![*master, *slave],
        }
    }

    pub fn command(&self) -> Command {
        match &self.kind {
            MpConstraintKind::EqualDof {
                retained,
                constrained,
                dofs,
            } => Command::new("equalDOF")
                .arg(*retained)
                .arg(*constrained)
                .args(dofs.iter().copied()),
            MpConstraintKind::RigidDiaphragm {
                direction,
                master,
                slaves,
            } => Command::new("rigidDiaphragm")
                .arg(*direction)
                .arg(*master)
                .args(slaves.iter().copied()),
            MpConstraintKind::RigidLink {
                kind,
                master,
                slave,
            } => Command::new("rigidLink")
                .arg(kind.as_str())
                .arg(*master)
                .arg(*slave),
        }
    }

    pub fn realize(&mut self, session: &mut dyn EngineSession) -> BuildResult<()> {
        if self.realized {
            return Ok(());
        }
        session.execute(&self.command())?;
        self.realized = true;
        Ok(())
    }
}
