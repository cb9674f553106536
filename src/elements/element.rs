//! Frame elements: geometry-only lines, beam-columns and general elements

use super::node::Node;
use super::section::Section;
use super::transformation::{TransformKind, TransformationCache};
use crate::command::{Command, Params};
use crate::error::{BuildError, BuildResult};
use crate::math::{calculate_aligned_vecxz, Vec3};
use crate::registry::Registry;
use crate::session::EngineSession;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Engineering role of an element, used for grouping and default transformations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralType {
    Column,
    Beam,
    Wall,
    Slab,
    Truss,
    Tree,
    Infill,
    General,
    BeamX,
    BeamY,
    BeamXy,
    BeamBalcony,
    BeamBalconyX,
    BeamBalconyY,
    BeamBalconyXy,
    BeamBase,
    BeamBaseX,
    BeamBaseY,
    BeamBaseXy,
    InfillX,
    InfillBackslash,
    InfillForward,
    InfillXAndCross,
}

impl StructuralType {
    /// Every structural type, in declaration order
    pub const ALL: [StructuralType; 23] = [
        Self::Column,
        Self::Beam,
        Self::Wall,
        Self::Slab,
        Self::Truss,
        Self::Tree,
        Self::Infill,
        Self::General,
        Self::BeamX,
        Self::BeamY,
        Self::BeamXy,
        Self::BeamBalcony,
        Self::BeamBalconyX,
        Self::BeamBalconyY,
        Self::BeamBalconyXy,
        Self::BeamBase,
        Self::BeamBaseX,
        Self::BeamBaseY,
        Self::BeamBaseXy,
        Self::InfillX,
        Self::InfillBackslash,
        Self::InfillForward,
        Self::InfillXAndCross,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Column => "column",
            Self::Beam => "beam",
            Self::Wall => "wall",
            Self::Slab => "slab",
            Self::Truss => "truss",
            Self::Tree => "tree",
            Self::Infill => "infill",
            Self::General => "general",
            Self::BeamX => "beam_x",
            Self::BeamY => "beam_y",
            Self::BeamXy => "beam_xy",
            Self::BeamBalcony => "beam_balcony",
            Self::BeamBalconyX => "beam_balcony_x",
            Self::BeamBalconyY => "beam_balcony_y",
            Self::BeamBalconyXy => "beam_balcony_xy",
            Self::BeamBase => "beam_base",
            Self::BeamBaseX => "beam_base_x",
            Self::BeamBaseY => "beam_base_y",
            Self::BeamBaseXy => "beam_base_xy",
            Self::InfillX => "infill_x",
            Self::InfillBackslash => "infill_backslash",
            Self::InfillForward => "infill_forward",
            Self::InfillXAndCross => "infill_x_and_cross",
        }
    }

    /// Columns and walls carry P-Delta effects; everything else is linear
    pub fn default_transform(&self) -> TransformKind {
        match self {
            Self::Column | Self::Wall => TransformKind::PDelta,
            _ => TransformKind::Linear,
        }
    }
}

impl fmt::Display for StructuralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StructuralType {
    type Err = BuildError;

    fn from_str(s: &str) -> BuildResult<Self> {
        Self::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| BuildError::UnknownStructuralType(s.to_string()))
    }
}

/// Reference from an element to one of its end nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRef {
    /// Bare tag, not yet checked against the model
    Tag(u32),
    /// Tag known to exist in the geometry registry
    Node(u32),
}

impl NodeRef {
    pub fn tag(&self) -> u32 {
        match self {
            Self::Tag(t) | Self::Node(t) => *t,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Node(_))
    }
}

impl From<u32> for NodeRef {
    fn from(tag: u32) -> Self {
        Self::Tag(tag)
    }
}

impl From<&Node> for NodeRef {
    fn from(node: &Node) -> Self {
        Self::Node(node.tag())
    }
}

/// Element formulation of a beam-column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Formulation {
    Elastic,
    ForceBased,
    DisplacementBased,
}

impl Formulation {
    /// Engine element class
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Elastic => "elasticBeamColumn",
            Self::ForceBased => "forceBeamColumn",
            Self::DisplacementBased => "dispBeamColumn",
        }
    }
}

impl FromStr for Formulation {
    type Err = BuildError;

    fn from_str(s: &str) -> BuildResult<Self> {
        match s {
            "elasticBeamColumn" => Ok(Self::Elastic),
            "forceBeamColumn" => Ok(Self::ForceBased),
            "dispBeamColumn" => Ok(Self::DisplacementBased),
            other => Err(BuildError::invalid(format!(
                "unknown beam-column class '{other}'"
            ))),
        }
    }
}

/// Section-based frame element data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamColumn {
    /// Section name in the properties registry
    pub section: String,
    pub formulation: Formulation,
    /// Beam integration tag, required by force/displacement formulations
    pub integration: Option<u32>,
    /// Extra engine arguments appended after the fixed ones
    pub params: Params,
    /// Transformation override; defaults by structural type
    pub transform: Option<TransformKind>,
}

impl BeamColumn {
    pub fn new(section: impl Into<String>, formulation: Formulation) -> Self {
        Self {
            section: section.into(),
            formulation,
            integration: None,
            params: Params::new(),
            transform: None,
        }
    }

    pub fn elastic(section: impl Into<String>) -> Self {
        Self::new(section, Formulation::Elastic)
    }

    pub fn force_based(section: impl Into<String>, integration: u32) -> Self {
        Self::new(section, Formulation::ForceBased).with_integration(integration)
    }

    pub fn with_integration(mut self, tag: u32) -> Self {
        self.integration = Some(tag);
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_transform(mut self, kind: TransformKind) -> Self {
        self.transform = Some(kind);
        self
    }
}

/// How a general element receives its transformation tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformAttachment {
    /// Formulation; defaults by structural type
    pub kind: Option<TransformKind>,
    /// Parameter key the tag is written under
    pub keyword: String,
}

impl Default for TransformAttachment {
    fn default() -> Self {
        Self {
            kind: None,
            keyword: "transfTag".to_string(),
        }
    }
}

/// Arbitrary engine element type with free-form arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralElement {
    pub element_type: String,
    pub params: Params,
    pub transform: Option<TransformAttachment>,
}

impl GeneralElement {
    pub fn new(element_type: impl Into<String>, params: Params) -> Self {
        Self {
            element_type: element_type.into(),
            params,
            transform: None,
        }
    }

    /// Attach a transformation under the default `transfTag` keyword
    pub fn with_transformation(mut self) -> Self {
        self.transform = Some(TransformAttachment::default());
        self
    }

    pub fn with_attachment(mut self, attachment: TransformAttachment) -> Self {
        self.transform = Some(attachment);
        self
    }
}

/// Behavioral variant of an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementKind {
    /// Geometry only; must be converted before building
    Line { metadata: Params },
    BeamColumn(BeamColumn),
    General(GeneralElement),
}

/// Everything an element needs from the model while realizing
pub struct RealizeContext<'a> {
    pub session: &'a mut dyn EngineSession,
    pub nodes: &'a mut Registry<u32, Node>,
    pub sections: &'a Registry<String, Section>,
    pub transforms: &'a mut TransformationCache,
    pub tolerance: f64,
}

/// A two-node element of the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub tag: u32,
    start: NodeRef,
    end: NodeRef,
    pub structural_type: StructuralType,
    pub kind: ElementKind,

    #[serde(skip)]
    pub(crate) realized: bool,
}

impl Element {
    pub fn new(
        tag: u32,
        start: impl Into<NodeRef>,
        end: impl Into<NodeRef>,
        structural_type: StructuralType,
        kind: ElementKind,
    ) -> Self {
        Self {
            tag,
            start: start.into(),
            end: end.into(),
            structural_type,
            kind,
            realized: false,
        }
    }

    pub fn line(
        tag: u32,
        start: impl Into<NodeRef>,
        end: impl Into<NodeRef>,
        structural_type: StructuralType,
    ) -> Self {
        Self::new(
            tag,
            start,
            end,
            structural_type,
            ElementKind::Line {
                metadata: Params::new(),
            },
        )
    }

    pub fn beam_column(
        tag: u32,
        start: impl Into<NodeRef>,
        end: impl Into<NodeRef>,
        structural_type: StructuralType,
        data: BeamColumn,
    ) -> Self {
        Self::new(tag, start, end, structural_type, ElementKind::BeamColumn(data))
    }

    pub fn general(
        tag: u32,
        start: impl Into<NodeRef>,
        end: impl Into<NodeRef>,
        structural_type: StructuralType,
        data: GeneralElement,
    ) -> Self {
        Self::new(tag, start, end, structural_type, ElementKind::General(data))
    }

    pub fn start(&self) -> NodeRef {
        self.start
    }

    pub fn end(&self) -> NodeRef {
        self.end
    }

    pub fn node_tags(&self) -> [u32; 2] {
        [self.start.tag(), self.end.tag()]
    }

    pub fn uses_node(&self, tag: u32) -> bool {
        self.node_tags().contains(&tag)
    }

    pub fn is_line(&self) -> bool {
        matches!(self.kind, ElementKind::Line { .. })
    }

    pub fn is_realized(&self) -> bool {
        self.realized
    }

    /// Check both node references against the registry
    pub(crate) fn resolve(&mut self, nodes: &Registry<u32, Node>) -> BuildResult<()> {
        for node_ref in [&mut self.start, &mut self.end] {
            let tag = node_ref.tag();
            if !nodes.contains_key(&tag) {
                return Err(BuildError::NodeNotFound(tag));
            }
            *node_ref = NodeRef::Node(tag);
        }
        Ok(())
    }

    /// Geometric segment between the end nodes
    pub fn segment(&self, nodes: &Registry<u32, Node>) -> BuildResult<Segment> {
        let lookup = |r: NodeRef| {
            nodes
                .get(&r.tag())
                .map(Node::position)
                .ok_or(BuildError::NodeNotFound(r.tag()))
        };
        Ok(Segment::new(lookup(self.start)?, lookup(self.end)?))
    }

    /// Turn a line into a beam-column, keeping tag, nodes and structural type
    pub fn convert_to_beam_column(self, data: BeamColumn) -> BuildResult<Self> {
        if !self.is_line() {
            return Err(BuildError::invalid(format!(
                "element {} is not a line element",
                self.tag
            )));
        }
        Ok(Self {
            kind: ElementKind::BeamColumn(data),
            realized: false,
            ..self
        })
    }

    /// Same variant and parameters between other nodes, under a new tag
    pub(crate) fn respan(&self, tag: u32, start: u32, end: u32) -> Self {
        Self {
            tag,
            start: NodeRef::Node(start),
            end: NodeRef::Node(end),
            structural_type: self.structural_type,
            kind: self.kind.clone(),
            realized: false,
        }
    }

    fn geometry_only_error(&self) -> BuildError {
        BuildError::invalid(format!(
            "line element {} is geometry-only; convert it before realizing",
            self.tag
        ))
    }

    /// Emit the element (and its nodes and transformation when needed) once
    pub fn realize(&mut self, ctx: &mut RealizeContext<'_>) -> BuildResult<()> {
        if self.realized {
            return Ok(());
        }
        if self.is_line() {
            return Err(self.geometry_only_error());
        }
        let [i, j] = [self.start, self.end].map(|r| match r {
            NodeRef::Node(tag) => Ok(tag),
            NodeRef::Tag(tag) => Err(BuildError::UnresolvedNode(tag)),
        });
        let (i, j) = (i?, j?);
        let mut ends = [Vec3::zeros(); 2];
        for (slot, tag) in ends.iter_mut().zip([i, j]) {
            let node = ctx.nodes.get_mut(&tag).ok_or(BuildError::NodeNotFound(tag))?;
            node.realize(&mut *ctx.session)?;
            *slot = node.position();
        }

        let command = match &self.kind {
            ElementKind::Line { .. } => return Err(self.geometry_only_error()),
            ElementKind::BeamColumn(bc) => {
                // Nothing is emitted until the section or integration resolves
                let anchor = match bc.formulation {
                    Formulation::Elastic => {
                        ctx.sections
                            .get(&bc.section)
                            .ok_or_else(|| BuildError::SectionNotFound(bc.section.clone()))?
                            .tag
                    }
                    Formulation::ForceBased | Formulation::DisplacementBased => {
                        bc.integration.ok_or_else(|| BuildError::MissingArgument {
                            key: "integration_tag".to_string(),
                        })?
                    }
                };
                let extra = bc.params.flatten()?;
                let kind = bc
                    .transform
                    .unwrap_or_else(|| self.structural_type.default_transform());
                let transf = ctx.transforms.get_or_create(
                    &ends[0],
                    &ends[1],
                    kind,
                    ctx.tolerance,
                    Some(&mut *ctx.session),
                )?;
                let cmd = Command::new("element")
                    .arg(bc.formulation.as_str())
                    .arg(self.tag)
                    .arg(i)
                    .arg(j);
                let cmd = match bc.formulation {
                    Formulation::Elastic => cmd.arg(anchor).arg(transf),
                    Formulation::ForceBased | Formulation::DisplacementBased => {
                        cmd.arg(transf).arg(anchor)
                    }
                };
                cmd.args(extra)
            }
            ElementKind::General(general) => {
                let mut params = general.params.clone();
                if let Some(attachment) = &general.transform {
                    let kind = attachment
                        .kind
                        .unwrap_or_else(|| self.structural_type.default_transform());
                    let transf = ctx.transforms.get_or_create(
                        &ends[0],
                        &ends[1],
                        kind,
                        ctx.tolerance,
                        Some(&mut *ctx.session),
                    )?;
                    params.insert(attachment.keyword.clone(), transf);
                }
                Command::new("element")
                    .arg(general.element_type.as_str())
                    .arg(self.tag)
                    .arg(i)
                    .arg(j)
                    .args(params.flatten()?)
            }
        };

        ctx.session.execute(&command)?;
        self.realized = true;
        log::debug!("Realized element {} ({})", self.tag, self.structural_type);
        Ok(())
    }
}

/// Straight segment between two points, for geometric classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vec3,
    pub end: Vec3,
}

impl Segment {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    pub fn is_zero_length(&self, tol: f64) -> bool {
        self.length() <= tol
    }

    /// Unit direction, or zero for a degenerate segment
    pub fn direction(&self) -> Vec3 {
        let d = self.end - self.start;
        let len = d.norm();
        if len > 0.0 {
            d / len
        } else {
            Vec3::zeros()
        }
    }

    pub fn is_vertical(&self, tol: f64) -> bool {
        if self.is_zero_length(tol) {
            return false;
        }
        let d = self.direction();
        d.x.abs() <= tol && d.y.abs() <= tol && (d.z.abs() - 1.0).abs() <= tol
    }

    pub fn is_horizontal(&self, tol: f64) -> bool {
        !self.is_zero_length(tol) && self.direction().z.abs() <= tol
    }

    /// Parallel to the XY plane, and lying in the plane at `z` when given
    pub fn is_in_xy_plane(&self, z: Option<f64>, tol: f64) -> bool {
        self.in_plane(2, z, tol)
    }

    pub fn is_in_xz_plane(&self, y: Option<f64>, tol: f64) -> bool {
        self.in_plane(1, y, tol)
    }

    pub fn is_in_yz_plane(&self, x: Option<f64>, tol: f64) -> bool {
        self.in_plane(0, x, tol)
    }

    pub fn is_diagonal(&self, tol: f64) -> bool {
        !self.is_zero_length(tol) && !(self.is_horizontal(tol) || self.is_vertical(tol))
    }

    /// Diagonal running downward from start to end
    pub fn is_backslash_diagonal(&self, tol: f64) -> bool {
        self.is_diagonal(tol) && self.direction().z < 0.0
    }

    /// Diagonal running upward from start to end
    pub fn is_forward_diagonal(&self, tol: f64) -> bool {
        self.is_diagonal(tol) && self.direction().z > 0.0
    }

    /// Lowest z of the two ends
    pub fn floor_level(&self) -> f64 {
        self.start.z.min(self.end.z)
    }

    pub fn aligned_vecxz(&self, tol: f64) -> BuildResult<Vec3> {
        calculate_aligned_vecxz(&self.start, &self.end, tol)
    }

    fn in_plane(&self, axis: usize, level: Option<f64>, tol: f64) -> bool {
        if self.is_zero_length(tol) || self.direction()[axis].abs() > tol {
            return false;
        }
        level.map_or(true, |c| {
            (self.start[axis] - c).abs() <= tol && (self.end[axis] - c).abs() <= tol
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::section::ElasticSectionSpec;
    use crate::sections::{PolygonAnalyzer, SectionShape};
    use crate::session::RecordingSession;
    use serde_json::json;

    struct Fixture {
        session: RecordingSession,
        nodes: Registry<u32, Node>,
        sections: Registry<String, Section>,
        transforms: TransformationCache,
    }

    impl Fixture {
        fn new() -> Self {
            let mut nodes = Registry::new();
            nodes.insert(1, Node::new(1, 0.0, 0.0, 0.0));
            nodes.insert(2, Node::new(2, 0.0, 0.0, 3.0));
            nodes.insert(3, Node::new(3, 5.0, 0.0, 3.0));
            let mut sections = Registry::new();
            let spec = ElasticSectionSpec::new(SectionShape::rectangle(0.3, 0.3), 30e9, 12.5e9);
            let sec = Section::elastic(
                4,
                "C30",
                StructuralType::Column,
                &spec,
                &PolygonAnalyzer::default(),
            )
            .unwrap();
            sections.insert(sec.name.clone(), sec);
            Self {
                session: RecordingSession::new(),
                nodes,
                sections,
                transforms: TransformationCache::new(),
            }
        }

        fn realize(&mut self, element: &mut Element) -> BuildResult<()> {
            let mut ctx = RealizeContext {
                session: &mut self.session,
                nodes: &mut self.nodes,
                sections: &self.sections,
                transforms: &mut self.transforms,
                tolerance: 1e-6,
            };
            element.realize(&mut ctx)
        }
    }

    #[test]
    fn test_structural_type_parsing() {
        assert_eq!("beam_x".parse::<StructuralType>().unwrap(), StructuralType::BeamX);
        assert_eq!(StructuralType::InfillXAndCross.as_str(), "infill_x_and_cross");
        assert!(matches!(
            "line".parse::<StructuralType>(),
            Err(BuildError::UnknownStructuralType(_))
        ));
    }

    #[test]
    fn test_elastic_column_realization() {
        let mut fx = Fixture::new();
        let mut col = Element::beam_column(
            10,
            NodeRef::Node(1),
            NodeRef::Node(2),
            StructuralType::Column,
            BeamColumn::elastic("C30"),
        );
        fx.realize(&mut col).unwrap();
        fx.realize(&mut col).unwrap();
        assert_eq!(fx.session.kinds(), vec!["node", "node", "geomTransf", "element"]);
        assert_eq!(fx.session.commands()[2].args[0], crate::command::Arg::Str("PDelta".into()));
        assert_eq!(
            fx.session.commands()[3].to_string(),
            "element elasticBeamColumn 10 1 2 4 1"
        );
    }

    #[test]
    fn test_missing_section_emits_no_transformation() {
        let mut fx = Fixture::new();
        let mut col = Element::beam_column(
            16,
            NodeRef::Node(1),
            NodeRef::Node(2),
            StructuralType::Column,
            BeamColumn::elastic("C99"),
        );
        assert!(matches!(
            fx.realize(&mut col),
            Err(BuildError::SectionNotFound(name)) if name == "C99"
        ));
        assert!(fx.session.commands_of("geomTransf").is_empty());
        assert!(fx.transforms.is_empty());
        assert!(!col.is_realized());
    }

    #[test]
    fn test_force_based_requires_integration() {
        let mut fx = Fixture::new();
        let mut beam = Element::beam_column(
            11,
            NodeRef::Node(2),
            NodeRef::Node(3),
            StructuralType::Beam,
            BeamColumn::new("C30", Formulation::ForceBased),
        );
        let err = fx.realize(&mut beam).unwrap_err();
        assert!(matches!(err, BuildError::MissingArgument { .. }));
        assert!(!beam.is_realized());
        assert!(fx.session.commands_of("geomTransf").is_empty());

        let mut beam = Element::beam_column(
            12,
            NodeRef::Node(2),
            NodeRef::Node(3),
            StructuralType::Beam,
            BeamColumn::force_based("C30", 7).with_params(Params::new().with("-mass", 240.0)),
        );
        fx.realize(&mut beam).unwrap();
        let last = fx.session.commands().last().unwrap().to_string();
        assert_eq!(last, "element forceBeamColumn 12 2 3 1 7 -mass 240.0");
    }

    #[test]
    fn test_general_element_inserts_transformation_tag() {
        let mut fx = Fixture::new();
        let params = Params::try_from(json!({"A": 0.01, "E": 200e9})).unwrap();
        let mut truss = Element::general(
            13,
            NodeRef::Node(1),
            NodeRef::Node(3),
            StructuralType::Truss,
            GeneralElement::new("elasticTimoshenkoBeamColumn", params).with_transformation(),
        );
        fx.realize(&mut truss).unwrap();
        let last = fx.session.commands().last().unwrap();
        assert_eq!(last.args[0], crate::command::Arg::Str("elasticTimoshenkoBeamColumn".into()));
        assert_eq!(last.args.last(), Some(&crate::command::Arg::Int(1)));
    }

    #[test]
    fn test_line_and_unresolved_elements_cannot_realize() {
        let mut fx = Fixture::new();
        let mut line = Element::line(14, NodeRef::Node(1), NodeRef::Node(2), StructuralType::Column);
        assert!(fx.realize(&mut line).is_err());

        let mut loose = Element::beam_column(15, 1, 2, StructuralType::Column, BeamColumn::elastic("C30"));
        assert!(matches!(fx.realize(&mut loose), Err(BuildError::UnresolvedNode(1))));
        assert!(fx.session.commands().is_empty());
    }

    #[test]
    fn test_convert_line_keeps_identity() {
        let line = Element::line(20, NodeRef::Node(1), NodeRef::Node(2), StructuralType::Column);
        let bc = line.convert_to_beam_column(BeamColumn::elastic("C30")).unwrap();
        assert_eq!(bc.tag, 20);
        assert_eq!(bc.node_tags(), [1, 2]);
        assert!(!bc.is_line());
        assert!(bc.convert_to_beam_column(BeamColumn::elastic("C30")).is_err());
    }

    #[test]
    fn test_segment_classification() {
        let tol = 1e-6;
        let col = Segment::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 3.0));
        assert!(col.is_vertical(tol));
        assert!(!col.is_diagonal(tol));
        assert!(col.is_in_xz_plane(Some(0.0), tol));

        let beam = Segment::new(Vec3::new(0.0, 0.0, 3.0), Vec3::new(5.0, 0.0, 3.0));
        assert!(beam.is_horizontal(tol));
        assert!(beam.is_in_xy_plane(Some(3.0), tol));
        assert!(!beam.is_in_xy_plane(Some(0.0), tol));
        assert!(!beam.is_in_yz_plane(None, tol));
        assert!((beam.floor_level() - 3.0).abs() < 1e-12);

        let brace = Segment::new(Vec3::new(0.0, 0.0, 3.0), Vec3::new(5.0, 0.0, 0.0));
        assert!(brace.is_backslash_diagonal(tol));
        assert!(!brace.is_forward_diagonal(tol));
        assert!((brace.floor_level()).abs() < 1e-12);

        let point = Segment::new(Vec3::zeros(), Vec3::zeros());
        assert!(point.is_zero_length(tol));
        assert!(!point.is_vertical(tol));
        assert!(!point.is_horizontal(tol));
    }
}
