//! Node - a point in 3D space with optional lumped mass

use crate::command::Command;
use crate::error::{BuildError, BuildResult};
use crate::math::{rotate_about_z, Vec3};
use crate::session::EngineSession;
use serde::{Deserialize, Serialize};

/// A 3D node of the structural model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    tag: u32,
    x: f64,
    y: f64,
    z: f64,
    /// Lumped mass [MX, MY, MZ, MRX, MRY, MRZ]
    mass: Option<[f64; 6]>,

    #[serde(skip)]
    pub(crate) realized: bool,
}

impl Node {
    /// Create a new node at the given coordinates
    pub fn new(tag: u32, x: f64, y: f64, z: f64) -> Self {
        Self {
            tag,
            x,
            y,
            z,
            mass: None,
            realized: false,
        }
    }

    /// Attach a lumped mass
    pub fn with_mass(mut self, mass: [f64; 6]) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn tag(&self) -> u32 {
        self.tag
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    /// Get the coordinates as an array
    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn mass(&self) -> Option<[f64; 6]> {
        self.mass
    }

    pub fn is_realized(&self) -> bool {
        self.realized
    }

    /// Replace the lumped mass; fails once the node exists in the engine
    pub fn set_mass(&mut self, mass: [f64; 6]) -> BuildResult<()> {
        self.ensure_mutable()?;
        self.mass = Some(mass);
        Ok(())
    }

    pub fn set_coordinates(&mut self, x: f64, y: f64, z: f64) -> BuildResult<()> {
        self.ensure_mutable()?;
        self.x = x;
        self.y = y;
        self.z = z;
        Ok(())
    }

    pub fn translate(&mut self, dx: f64, dy: f64, dz: f64) -> BuildResult<()> {
        self.set_coordinates(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Rotate about a vertical axis through `center`, angle in degrees
    pub fn rotate_about_z(&mut self, angle_deg: f64, center: [f64; 3]) -> BuildResult<()> {
        let p = rotate_about_z(&self.position(), angle_deg, &Vec3::from(center));
        self.set_coordinates(p.x, p.y, p.z)
    }

    /// Calculate distance to another node
    pub fn distance_to(&self, other: &Node) -> f64 {
        (other.position() - self.position()).norm()
    }

    /// True when the other node lies strictly within `tol`
    pub fn is_close_to(&self, other: &Node, tol: f64) -> bool {
        self.distance_to(other) < tol
    }

    /// Emit `node` (and `mass` when set) once
    pub fn realize(&mut self, session: &mut dyn EngineSession) -> BuildResult<()> {
        if self.realized {
            return Ok(());
        }
        session.execute(&Command::new("node").arg(self.tag).args(self.coords()))?;
        if let Some(mass) = self.mass {
            session.execute(&Command::new("mass").arg(self.tag).args(mass))?;
        }
        self.realized = true;
        log::debug!("Realized node {}", self.tag);
        Ok(())
    }

    fn ensure_mutable(&self) -> BuildResult<()> {
        if self.realized {
            return Err(BuildError::AlreadyRealized {
                entity: format!("Node {}", self.tag),
            });
        }
        Ok(())
    }
}
