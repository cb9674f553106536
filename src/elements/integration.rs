//! Beam integration rules for force/displacement-based frame elements
//!
//! Each rule has a fixed argument contract. Rules with explicit section,
//! location and weight lists are built through constructors that check the
//! list lengths up front, so a malformed rule never reaches the engine.

use super::StructuralType;
use crate::command::Command;
use crate::error::{BuildError, BuildResult};
use crate::session::EngineSession;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quadrature families that take a single section and a point count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quadrature {
    Lobatto,
    Legendre,
    NewtonCotes,
    Radau,
    Trapezoidal,
    CompositeSimpson,
}

impl Quadrature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lobatto => "Lobatto",
            Self::Legendre => "Legendre",
            Self::NewtonCotes => "NewtonCotes",
            Self::Radau => "Radau",
            Self::Trapezoidal => "Trapezoidal",
            Self::CompositeSimpson => "CompositeSimpson",
        }
    }
}

impl FromStr for Quadrature {
    type Err = BuildError;

    fn from_str(s: &str) -> BuildResult<Self> {
        match s {
            "Lobatto" => Ok(Self::Lobatto),
            "Legendre" => Ok(Self::Legendre),
            "NewtonCotes" => Ok(Self::NewtonCotes),
            "Radau" => Ok(Self::Radau),
            "Trapezoidal" => Ok(Self::Trapezoidal),
            "CompositeSimpson" => Ok(Self::CompositeSimpson),
            other => Err(BuildError::invalid(format!(
                "unknown integration type '{other}'"
            ))),
        }
    }
}

/// Plastic-hinge integration families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HingeScheme {
    Midpoint,
    Radau,
    RadauTwo,
    Endpoint,
}

impl HingeScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Midpoint => "HingeMidpoint",
            Self::Radau => "HingeRadau",
            Self::RadauTwo => "HingeRadauTwo",
            Self::Endpoint => "HingeEndpoint",
        }
    }
}

/// Integration points of one hinge region of a `UserHinge` rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HingeRegion {
    pub sections: Vec<u32>,
    pub locations: Vec<f64>,
    pub weights: Vec<f64>,
}

impl HingeRegion {
    /// Check that all three lists hold `num_points` entries
    pub fn new(
        num_points: usize,
        sections: Vec<u32>,
        locations: Vec<f64>,
        weights: Vec<f64>,
    ) -> BuildResult<Self> {
        expect_len("hinge section tags", num_points, sections.len())?;
        expect_len("hinge locations", num_points, locations.len())?;
        expect_len("hinge weights", num_points, weights.len())?;
        Ok(Self {
            sections,
            locations,
            weights,
        })
    }

    fn push_args(&self, cmd: Command) -> Command {
        cmd.arg(self.sections.len())
            .args(self.sections.iter().copied())
            .args(self.locations.iter().copied())
            .args(self.weights.iter().copied())
    }
}

/// The integration rule and its arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IntegrationRule {
    Quadrature {
        kind: Quadrature,
        section: u32,
        num_points: usize,
    },
    UserDefined {
        sections: Vec<u32>,
        locations: Vec<f64>,
        weights: Vec<f64>,
    },
    FixedLocation {
        sections: Vec<u32>,
        locations: Vec<f64>,
    },
    LowOrder {
        sections: Vec<u32>,
        locations: Vec<f64>,
        weights: Vec<f64>,
    },
    MidDistance {
        sections: Vec<u32>,
        locations: Vec<f64>,
    },
    UserHinge {
        interior: u32,
        hinge_i: HingeRegion,
        hinge_j: HingeRegion,
    },
    Hinge {
        scheme: HingeScheme,
        section_i: u32,
        length_i: f64,
        section_j: u32,
        length_j: f64,
        interior: u32,
    },
}

/// A tagged beam integration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamIntegration {
    pub tag: u32,
    pub rule: IntegrationRule,
    /// Element role this rule is meant for (informational)
    pub structural_use: Option<StructuralType>,

    #[serde(skip)]
    pub(crate) realized: bool,
}

impl BeamIntegration {
    fn with_rule(tag: u32, rule: IntegrationRule) -> Self {
        Self {
            tag,
            rule,
            structural_use: None,
            realized: false,
        }
    }

    /// Single-section quadrature rule
    pub fn quadrature(tag: u32, kind: Quadrature, section: u32, num_points: usize) -> Self {
        Self::with_rule(
            tag,
            IntegrationRule::Quadrature {
                kind,
                section,
                num_points,
            },
        )
    }

    /// Quadrature rule from its engine name, e.g. `"Lobatto"`
    pub fn from_kind_name(
        tag: u32,
        kind: &str,
        section: u32,
        num_points: usize,
    ) -> BuildResult<Self> {
        Ok(Self::quadrature(tag, kind.parse()?, section, num_points))
    }

    pub fn lobatto(tag: u32, section: u32, num_points: usize) -> Self {
        Self::quadrature(tag, Quadrature::Lobatto, section, num_points)
    }

    pub fn legendre(tag: u32, section: u32, num_points: usize) -> Self {
        Self::quadrature(tag, Quadrature::Legendre, section, num_points)
    }

    pub fn user_defined(
        tag: u32,
        num_points: usize,
        sections: Vec<u32>,
        locations: Vec<f64>,
        weights: Vec<f64>,
    ) -> BuildResult<Self> {
        expect_len("section tags", num_points, sections.len())?;
        expect_len("locations", num_points, locations.len())?;
        expect_len("weights", num_points, weights.len())?;
        Ok(Self::with_rule(
            tag,
            IntegrationRule::UserDefined {
                sections,
                locations,
                weights,
            },
        ))
    }

    pub fn fixed_location(
        tag: u32,
        num_points: usize,
        sections: Vec<u32>,
        locations: Vec<f64>,
    ) -> BuildResult<Self> {
        expect_len("section tags", num_points, sections.len())?;
        expect_len("locations", num_points, locations.len())?;
        Ok(Self::with_rule(
            tag,
            IntegrationRule::FixedLocation {
                sections,
                locations,
            },
        ))
    }

    /// Low-order rule; fewer weights than points are allowed
    pub fn low_order(
        tag: u32,
        num_points: usize,
        sections: Vec<u32>,
        locations: Vec<f64>,
        weights: Vec<f64>,
    ) -> BuildResult<Self> {
        expect_len("section tags", num_points, sections.len())?;
        expect_len("locations", num_points, locations.len())?;
        if weights.len() > num_points {
            return Err(BuildError::length_mismatch(
                "weights (at most)",
                num_points,
                weights.len(),
            ));
        }
        Ok(Self::with_rule(
            tag,
            IntegrationRule::LowOrder {
                sections,
                locations,
                weights,
            },
        ))
    }

    pub fn mid_distance(
        tag: u32,
        num_points: usize,
        sections: Vec<u32>,
        locations: Vec<f64>,
    ) -> BuildResult<Self> {
        expect_len("section tags", num_points, sections.len())?;
        expect_len("locations", num_points, locations.len())?;
        Ok(Self::with_rule(
            tag,
            IntegrationRule::MidDistance {
                sections,
                locations,
            },
        ))
    }

    pub fn user_hinge(tag: u32, interior: u32, hinge_i: HingeRegion, hinge_j: HingeRegion) -> Self {
        Self::with_rule(
            tag,
            IntegrationRule::UserHinge {
                interior,
                hinge_i,
                hinge_j,
            },
        )
    }

    /// Plastic-hinge rule with hinge lengths at both ends
    pub fn hinge(
        tag: u32,
        scheme: HingeScheme,
        (section_i, length_i): (u32, f64),
        (section_j, length_j): (u32, f64),
        interior: u32,
    ) -> Self {
        Self::with_rule(
            tag,
            IntegrationRule::Hinge {
                scheme,
                section_i,
                length_i,
                section_j,
                length_j,
                interior,
            },
        )
    }

    /// Tag the element role this rule serves
    pub fn for_use(mut self, structural_type: StructuralType) -> Self {
        self.structural_use = Some(structural_type);
        self
    }

    pub fn is_realized(&self) -> bool {
        self.realized
    }

    /// Engine name of the rule
    pub fn kind_name(&self) -> &'static str {
        match &self.rule {
            IntegrationRule::Quadrature { kind, .. } => kind.as_str(),
            IntegrationRule::UserDefined { .. } => "UserDefined",
            IntegrationRule::FixedLocation { .. } => "FixedLocation",
            IntegrationRule::LowOrder { .. } => "LowOrder",
            IntegrationRule::MidDistance { .. } => "MidDistance",
            IntegrationRule::UserHinge { .. } => "UserHinge",
            IntegrationRule::Hinge { scheme, .. } => scheme.as_str(),
        }
    }

    pub fn command(&self) -> Command {
        let cmd = Command::new("beamIntegration")
            .arg(self.kind_name())
            .arg(self.tag);
        match &self.rule {
            IntegrationRule::Quadrature {
                section,
                num_points,
                ..
            } => cmd.arg(*section).arg(*num_points),
            IntegrationRule::UserDefined {
                sections,
                locations,
                weights,
            }
            | IntegrationRule::LowOrder {
                sections,
                locations,
                weights,
            } => cmd
                .arg(sections.len())
                .args(sections.iter().copied())
                .args(locations.iter().copied())
                .args(weights.iter().copied()),
            IntegrationRule::FixedLocation {
                sections,
                locations,
            }
            | IntegrationRule::MidDistance {
                sections,
                locations,
            } => cmd
                .arg(sections.len())
                .args(sections.iter().copied())
                .args(locations.iter().copied()),
            IntegrationRule::UserHinge {
                interior,
                hinge_i,
                hinge_j,
            } => hinge_j.push_args(hinge_i.push_args(cmd.arg(*interior))),
            IntegrationRule::Hinge {
                section_i,
                length_i,
                section_j,
                length_j,
                interior,
                ..
            } => cmd
                .arg(*section_i)
                .arg(*length_i)
                .arg(*section_j)
                .arg(*length_j)
                .arg(*interior),
        }
    }

    pub fn realize(&mut self, session: &mut dyn EngineSession) -> BuildResult<()> {
        if self.realized {
            return Ok(());
        }
        session.execute(&self.command())?;
        self.realized = true;
        log::debug!("Realized beam integration {}", self.tag);
        Ok(())
    }
}

impl fmt::Display for BeamIntegration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BeamIntegration({}, {})", self.tag, self.kind_name())
    }
}

fn expect_len(what: &str, expected: usize, found: usize) -> BuildResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(BuildError::length_mismatch(what, expected, found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::RecordingSession;

    #[test]
    fn test_quadrature_command() {
        let integ = BeamIntegration::lobatto(1, 3, 5);
        assert_eq!(integ.command().to_string(), "beamIntegration Lobatto 1 3 5");
        let integ = BeamIntegration::from_kind_name(2, "CompositeSimpson", 3, 7).unwrap();
        assert_eq!(integ.kind_name(), "CompositeSimpson");
        assert!(BeamIntegration::from_kind_name(2, "Gauss", 3, 7).is_err());
    }

    #[test]
    fn test_user_defined_lengths_checked_at_construction() {
        let err = BeamIntegration::user_defined(1, 3, vec![1, 2, 3], vec![0.0, 1.0], vec![0.5; 3])
            .unwrap_err();
        assert!(matches!(err, BuildError::LengthMismatch { expected: 3, found: 2, .. }));

        let ok = BeamIntegration::user_defined(1, 2, vec![1, 2], vec![0.1, 0.9], vec![0.5, 0.5])
            .unwrap();
        assert_eq!(
            ok.command().to_string(),
            "beamIntegration UserDefined 1 2 1 2 0.1 0.9 0.5 0.5"
        );
    }

    #[test]
    fn test_low_order_allows_fewer_weights() {
        assert!(BeamIntegration::low_order(1, 3, vec![1, 2, 3], vec![0.0, 0.5, 1.0], vec![0.5])
            .is_ok());
        assert!(
            BeamIntegration::low_order(1, 2, vec![1, 2], vec![0.0, 1.0], vec![0.3, 0.3, 0.4])
                .is_err()
        );
        assert!(BeamIntegration::fixed_location(1, 2, vec![1], vec![0.0, 1.0]).is_err());
        assert!(BeamIntegration::mid_distance(1, 2, vec![1, 2], vec![0.0]).is_err());
    }

    #[test]
    fn test_hinge_rules() {
        let rule = BeamIntegration::hinge(4, HingeScheme::RadauTwo, (1, 0.3), (2, 0.3), 3);
        assert_eq!(
            rule.command().to_string(),
            "beamIntegration HingeRadauTwo 4 1 0.3 2 0.3 3"
        );

        let hinge_i = HingeRegion::new(1, vec![1], vec![0.05], vec![0.1]).unwrap();
        let hinge_j = HingeRegion::new(1, vec![2], vec![0.95], vec![0.1]).unwrap();
        let rule = BeamIntegration::user_hinge(5, 3, hinge_i, hinge_j);
        assert_eq!(
            rule.command().to_string(),
            "beamIntegration UserHinge 5 3 1 1 0.05 0.1 1 2 0.95 0.1"
        );
        assert!(HingeRegion::new(2, vec![1], vec![0.05], vec![0.1]).is_err());
    }

    #[test]
    fn test_realize_once() {
        let mut session = RecordingSession::new();
        let mut integ = BeamIntegration::legendre(1, 1, 3).for_use(StructuralType::Beam);
        integ.realize(&mut session).unwrap();
        integ.realize(&mut session).unwrap();
        assert_eq!(session.commands().len(), 1);
    }
}
