//! Loads owned by a load pattern

use crate::command::Command;
use crate::error::{BuildError, BuildResult};
use crate::session::EngineSession;
use serde::{Deserialize, Serialize};

/// Nodal force and moment vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodalLoad {
    pub node: u32,
    /// [FX, FY, FZ, MX, MY, MZ]
    pub values: [f64; 6],
}

impl NodalLoad {
    pub fn new(node: u32, values: [f64; 6]) -> Self {
        Self { node, values }
    }

    /// Forces only, no moments
    pub fn force(node: u32, fx: f64, fy: f64, fz: f64) -> Self {
        Self::new(node, [fx, fy, fz, 0.0, 0.0, 0.0])
    }
}

/// Element load distributions, values in local axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BeamLoad {
    /// Uniform load per unit length; `wx` is axial
    Uniform { wy: f64, wz: f64, wx: f64 },
    /// Point load at relative position `x_l` along the element
    Point { py: f64, pz: f64, x_l: f64, px: f64 },
}

impl BeamLoad {
    /// Vertical uniform load
    pub fn uniform(wz: f64) -> Self {
        Self::Uniform {
            wy: 0.0,
            wz,
            wx: 0.0,
        }
    }

    /// Vertical point load at mid-span
    pub fn point(pz: f64) -> Self {
        Self::Point {
            py: 0.0,
            pz,
            x_l: 0.5,
            px: 0.0,
        }
    }

    fn append_to(&self, cmd: Command) -> Command {
        match *self {
            Self::Uniform { wy, wz, wx } => {
                let cmd = cmd.arg("-beamUniform").args([wy, wz]);
                if wx != 0.0 {
                    cmd.arg(wx)
                } else {
                    cmd
                }
            }
            Self::Point { py, pz, x_l, px } => {
                let cmd = cmd.arg("-beamPoint").args([py, pz, x_l]);
                if px != 0.0 {
                    cmd.arg(px)
                } else {
                    cmd
                }
            }
        }
    }
}

/// A load of any kind that a plain pattern can carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Load {
    Nodal(NodalLoad),
    Element { elements: Vec<u32>, load: BeamLoad },
    /// Prescribed displacement on one DOF
    SinglePoint { node: u32, dof: u8, value: f64 },
}

impl Load {
    pub fn element(elements: Vec<u32>, load: BeamLoad) -> BuildResult<Self> {
        if elements.is_empty() {
            return Err(BuildError::invalid("element load needs at least one element"));
        }
        if let BeamLoad::Point { x_l, .. } = load {
            if !(0.0..=1.0).contains(&x_l) {
                return Err(BuildError::invalid(format!(
                    "point load position {x_l} must lie in [0, 1]"
                )));
            }
        }
        Ok(Self::Element { elements, load })
    }

    pub fn single_point(node: u32, dof: u8, value: f64) -> BuildResult<Self> {
        if !(1..=6).contains(&dof) {
            return Err(BuildError::invalid(format!("DOF {dof} is outside 1..=6")));
        }
        Ok(Self::SinglePoint { node, dof, value })
    }

    pub fn command(&self) -> Command {
        match self {
            Self::Nodal(load) => Command::new("load").arg(load.node).args(load.values),
            Self::Element { elements, load } => load.append_to(
                Command::new("eleLoad")
                    .arg("-ele")
                    .args(elements.iter().copied())
                    .arg("-type"),
            ),
            Self::SinglePoint { node, dof, value } => {
                Command::new("sp").arg(*node).arg(*dof).arg(*value)
            }
        }
    }

    pub fn realize(&self, session: &mut dyn EngineSession) -> BuildResult<()> {
        session.execute(&self.command())
    }
}

impl From<NodalLoad> for Load {
    fn from(load: NodalLoad) -> Self {
        Self::Nodal(load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodal_load_command() {
        let load = Load::from(NodalLoad::force(3, 10.0, 0.0, -5.0));
        assert_eq!(load.command().to_string(), "load 3 10.0 0.0 -5.0 0.0 0.0 0.0");
    }

    #[test]
    fn test_uniform_load_omits_zero_axial() {
        let load = Load::element(vec![1, 2], BeamLoad::uniform(-10.0)).unwrap();
        assert_eq!(
            load.command().to_string(),
            "eleLoad -ele 1 2 -type -beamUniform 0.0 -10.0"
        );
        let axial = Load::element(
            vec![4],
            BeamLoad::Uniform {
                wy: 1.0,
                wz: -2.0,
                wx: 0.5,
            },
        )
        .unwrap();
        assert_eq!(
            axial.command().to_string(),
            "eleLoad -ele 4 -type -beamUniform 1.0 -2.0 0.5"
        );
    }

    #[test]
    fn test_point_load_defaults_to_midspan() {
        let load = Load::element(vec![7], BeamLoad::point(-20.0)).unwrap();
        assert_eq!(
            load.command().to_string(),
            "eleLoad -ele 7 -type -beamPoint 0.0 -20.0 0.5"
        );
        assert!(Load::element(
            vec![7],
            BeamLoad::Point {
                py: 0.0,
                pz: 1.0,
                x_l: 1.5,
                px: 0.0
            }
        )
        .is_err());
        assert!(Load::element(vec![], BeamLoad::point(1.0)).is_err());
    }

    #[test]
    fn test_single_point_command() {
        let sp = Load::single_point(5, 1, 0.02).unwrap();
        assert_eq!(sp.command().to_string(), "sp 5 1 0.02");
        assert!(Load::single_point(5, 0, 0.0).is_err());
    }
}
