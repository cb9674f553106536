//! Geometry registry: nodes, elements, groups and floors

use crate::elements::{
    BeamColumn, Element, ElementKind, Formulation, GeneralElement, Node, NodeRef, RealizeContext,
    Section, StructuralType, TransformationCache,
};
use crate::error::{BuildError, BuildResult};
use crate::registry::Registry;
use crate::session::EngineSession;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Elements grouped under one floor level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorBucket {
    pub level: f64,
    pub elements: BTreeSet<u32>,
}

/// Counts reported by [`Geometry::create_grid`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GridSummary {
    pub nodes_created: usize,
    pub elements_created: usize,
}

/// What [`Geometry::create_grid_with`] generates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    pub create_columns: bool,
    pub create_beams: bool,
    pub column_type: StructuralType,
    pub beam_x_type: StructuralType,
    pub beam_y_type: StructuralType,
    pub column_section: Option<String>,
    pub beam_section: Option<String>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            create_columns: true,
            create_beams: true,
            column_type: StructuralType::Column,
            beam_x_type: StructuralType::BeamX,
            beam_y_type: StructuralType::BeamY,
            column_section: None,
            beam_section: None,
        }
    }
}

impl GridOptions {
    pub fn with_sections(column: Option<&str>, beam: Option<&str>) -> Self {
        Self {
            column_section: column.map(str::to_string),
            beam_section: beam.map(str::to_string),
            ..Self::default()
        }
    }
}

/// Owner of every node and element of a model
#[derive(Debug, Clone)]
pub struct Geometry {
    nodes: Registry<u32, Node>,
    elements: Registry<u32, Element>,
    groups: BTreeMap<String, BTreeSet<u32>>,
    floors: Vec<FloorBucket>,
    node_tolerance: f64,
    floor_tolerance: f64,
    /// Set while the model is built and not force-released
    pub(crate) locked: bool,
}

impl Geometry {
    pub fn new(node_tolerance: f64, floor_tolerance: f64) -> Self {
        Self {
            nodes: Registry::new(),
            elements: Registry::new(),
            groups: BTreeMap::new(),
            floors: Vec::new(),
            node_tolerance,
            floor_tolerance,
            locked: false,
        }
    }

    pub fn nodes(&self) -> &Registry<u32, Node> {
        &self.nodes
    }

    pub fn elements(&self) -> &Registry<u32, Element> {
        &self.elements
    }

    pub fn node(&self, tag: u32) -> Option<&Node> {
        self.nodes.get(&tag)
    }

    pub fn element(&self, tag: u32) -> Option<&Element> {
        self.elements.get(&tag)
    }

    fn guard(&self, operation: &'static str) -> BuildResult<()> {
        if self.locked {
            return Err(BuildError::ModelBuilt { operation });
        }
        Ok(())
    }

    // ---- nodes ----

    /// Create a node under the next free tag
    pub fn create_node(&mut self, x: f64, y: f64, z: f64) -> u32 {
        let tag = self.nodes.next_tag();
        self.insert_node(Node::new(tag, x, y, z));
        tag
    }

    /// Create a node under an explicit tag
    pub fn create_node_with_tag(&mut self, tag: u32, x: f64, y: f64, z: f64) -> BuildResult<u32> {
        self.add_node(Node::new(tag, x, y, z))
    }

    /// Register a prebuilt node; its tag must be free
    pub fn add_node(&mut self, node: Node) -> BuildResult<u32> {
        let tag = node.tag();
        if tag == 0 {
            return Err(BuildError::invalid("node tag must be a positive integer"));
        }
        if self.nodes.contains_key(&tag) {
            return Err(BuildError::DuplicateTag {
                category: "node",
                tag,
            });
        }
        self.insert_node(node);
        Ok(tag)
    }

    fn insert_node(&mut self, node: Node) {
        log::info!("Added node {} at {:?}", node.tag(), node.coords());
        self.nodes.insert(node.tag(), node);
    }

    pub fn assign_node_mass(&mut self, tag: u32, mass: [f64; 6]) -> BuildResult<()> {
        self.nodes
            .get_mut(&tag)
            .ok_or(BuildError::NodeNotFound(tag))?
            .set_mass(mass)
    }

    /// First node strictly within `tol` (default: node merge tolerance)
    pub fn find_node(&self, x: f64, y: f64, z: f64, tol: Option<f64>) -> Option<&Node> {
        let tol = tol.unwrap_or(self.node_tolerance);
        let candidate = Node::new(0, x, y, z);
        self.nodes.values().find(|n| n.is_close_to(&candidate, tol))
    }

    // ---- elements ----

    fn element_tag(&self, tag: Option<u32>) -> u32 {
        tag.unwrap_or_else(|| self.elements.next_tag())
    }

    /// Create a beam-column element
    pub fn create_element(
        &mut self,
        tag: Option<u32>,
        start: impl Into<NodeRef>,
        end: impl Into<NodeRef>,
        structural_type: StructuralType,
        data: BeamColumn,
    ) -> BuildResult<u32> {
        let tag = self.element_tag(tag);
        self.add_element(Element::beam_column(tag, start, end, structural_type, data))
    }

    /// Create an element of arbitrary engine type
    pub fn create_general_element(
        &mut self,
        tag: Option<u32>,
        start: impl Into<NodeRef>,
        end: impl Into<NodeRef>,
        structural_type: StructuralType,
        data: GeneralElement,
    ) -> BuildResult<u32> {
        let tag = self.element_tag(tag);
        self.add_element(Element::general(tag, start, end, structural_type, data))
    }

    /// Create a geometry-only line; the type defaults to `general`
    pub fn create_line_element(
        &mut self,
        tag: Option<u32>,
        start: impl Into<NodeRef>,
        end: impl Into<NodeRef>,
        structural_type: Option<StructuralType>,
    ) -> BuildResult<u32> {
        let tag = self.element_tag(tag);
        let stype = structural_type.unwrap_or(StructuralType::General);
        self.add_element(Element::line(tag, start, end, stype))
    }

    /// Register a prebuilt element, resolving its node references
    ///
    /// The element joins its structural-type group and the nearest floor.
    pub fn add_element(&mut self, mut element: Element) -> BuildResult<u32> {
        let tag = element.tag;
        if tag == 0 {
            return Err(BuildError::invalid("element tag must be a positive integer"));
        }
        if self.elements.contains_key(&tag) {
            return Err(BuildError::DuplicateTag {
                category: "element",
                tag,
            });
        }
        element.resolve(&self.nodes)?;
        let level = element.segment(&self.nodes)?.floor_level();

        self.groups
            .entry(element.structural_type.as_str().to_string())
            .or_default()
            .insert(tag);
        match self.nearest_floor(level) {
            Some(i) => {
                self.floors[i].elements.insert(tag);
            }
            None => self.floors.push(FloorBucket {
                level,
                elements: BTreeSet::from([tag]),
            }),
        }

        log::info!(
            "Added element {} ({}) between nodes {:?}",
            tag,
            element.structural_type,
            element.node_tags()
        );
        self.elements.insert(tag, element);
        Ok(tag)
    }

    /// Index of the closest floor strictly within the tolerance; first minimum wins
    fn nearest_floor(&self, z: f64) -> Option<usize> {
        let mut best = None;
        let mut min_dist = f64::INFINITY;
        for (i, floor) in self.floors.iter().enumerate() {
            let dist = (z - floor.level).abs();
            if dist < min_dist && dist < self.floor_tolerance {
                min_dist = dist;
                best = Some(i);
            }
        }
        best
    }

    pub fn has_line_elements(&self) -> bool {
        self.elements.values().any(Element::is_line)
    }

    pub fn line_element_count(&self) -> usize {
        self.elements.values().filter(|e| e.is_line()).count()
    }

    /// Turn every line into a beam-column
    ///
    /// Each line takes the section mapped to its structural type, or the
    /// default. Fails without converting anything when some type has neither.
    pub fn convert_line_elements(
        &mut self,
        mapping: &BTreeMap<StructuralType, String>,
        default_section: Option<&str>,
        formulation: Formulation,
        integration: Option<u32>,
    ) -> BuildResult<usize> {
        if default_section.is_none() {
            let unmapped: BTreeSet<StructuralType> = self
                .elements
                .values()
                .filter(|e| e.is_line() && !mapping.contains_key(&e.structural_type))
                .map(|e| e.structural_type)
                .collect();
            if !unmapped.is_empty() {
                return Err(BuildError::UnmappedLineTypes(
                    unmapped.iter().map(ToString::to_string).collect(),
                ));
            }
        }

        let lines: Vec<u32> = self
            .elements
            .values()
            .filter(|e| e.is_line())
            .map(|e| e.tag)
            .collect();
        let mut converted = 0;
        for tag in lines {
            let Some(line) = self.elements.get(&tag) else {
                continue;
            };
            let Some(section) = mapping
                .get(&line.structural_type)
                .map(String::as_str)
                .or(default_section)
            else {
                continue;
            };
            let mut data = BeamColumn::new(section, formulation);
            data.integration = integration;
            let element = line.clone().convert_to_beam_column(data)?;
            self.elements.insert(tag, element);
            converted += 1;
        }
        log::info!("Converted {converted} line elements to beam-column elements");
        Ok(converted)
    }

    /// Add an element to a named group, creating the group if needed
    pub fn add_to_element_group(&mut self, tag: u32, group: &str) -> BuildResult<()> {
        if !self.elements.contains_key(&tag) {
            return Err(BuildError::ElementNotFound(tag));
        }
        self.groups.entry(group.to_string()).or_default().insert(tag);
        log::info!("Added element {tag} to group {group}");
        Ok(())
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Elements of a group (structural type name or custom group)
    pub fn elements_by_group(&self, group: &str) -> Vec<&Element> {
        match self.groups.get(group) {
            Some(tags) => tags.iter().filter_map(|t| self.elements.get(t)).collect(),
            None => {
                log::warn!("Group '{group}' not found");
                Vec::new()
            }
        }
    }

    /// Elements on the floor nearest to `level`
    pub fn elements_by_floor(&self, level: f64) -> Vec<&Element> {
        match self.nearest_floor(level) {
            Some(i) => self.floors[i]
                .elements
                .iter()
                .filter_map(|t| self.elements.get(t))
                .collect(),
            None => {
                log::warn!("Floor level {level} not found");
                Vec::new()
            }
        }
    }

    /// Floor levels in creation order
    pub fn floor_levels(&self) -> Vec<f64> {
        self.floors.iter().map(|f| f.level).collect()
    }

    // ---- checks ----

    /// Nodes no element connects to
    pub fn check_free_nodes(&self) -> Vec<u32> {
        let used: BTreeSet<u32> = self
            .elements
            .values()
            .flat_map(|e| e.node_tags())
            .collect();
        self.nodes.keys().copied().filter(|t| !used.contains(t)).collect()
    }

    /// Pairs of nodes strictly closer than `tol`
    pub fn check_duplicate_nodes(&self, tol: Option<f64>) -> Vec<(u32, u32)> {
        let tol = tol.unwrap_or(self.node_tolerance);
        let nodes: Vec<&Node> = self.nodes.values().collect();
        let mut pairs = Vec::new();
        for (i, a) in nodes.iter().enumerate() {
            for b in &nodes[i + 1..] {
                if a.is_close_to(b, tol) {
                    pairs.push((a.tag(), b.tag()));
                }
            }
        }
        pairs
    }

    /// Pairs of elements joining the same two nodes, in either direction
    pub fn check_duplicate_elements(&self) -> Vec<(u32, u32)> {
        let elements: Vec<&Element> = self.elements.values().collect();
        let mut pairs = Vec::new();
        for (i, a) in elements.iter().enumerate() {
            let [s1, e1] = a.node_tags();
            for b in &elements[i + 1..] {
                let [s2, e2] = b.node_tags();
                if (s1 == s2 && e1 == e2) || (s1 == e2 && e1 == s2) {
                    pairs.push((a.tag, b.tag));
                }
            }
        }
        pairs
    }

    // ---- mutation ----

    pub fn translate_structure(&mut self, dx: f64, dy: f64, dz: f64) -> BuildResult<()> {
        self.guard("translate the structure")?;
        for node in self.nodes.values_mut() {
            node.translate(dx, dy, dz)?;
        }
        log::info!("Translated structure by ({dx}, {dy}, {dz})");
        Ok(())
    }

    pub fn rotate_structure_about_z(&mut self, angle_deg: f64, cx: f64, cy: f64) -> BuildResult<()> {
        self.guard("rotate the structure")?;
        for node in self.nodes.values_mut() {
            node.rotate_about_z(angle_deg, [cx, cy, 0.0])?;
        }
        log::info!("Rotated structure by {angle_deg} degrees about ({cx}, {cy})");
        Ok(())
    }

    /// Split an element into `segments` pieces through new intermediate nodes
    ///
    /// The pieces keep the structural type and every formulation parameter of
    /// the original, which is removed. Returns the new element tags in order
    /// from the start node to the end node.
    pub fn subdivide_element(&mut self, tag: u32, segments: usize) -> BuildResult<Vec<u32>> {
        self.guard("subdivide elements")?;
        let element = self
            .elements
            .get(&tag)
            .cloned()
            .ok_or(BuildError::ElementNotFound(tag))?;
        if segments < 2 {
            return Err(BuildError::invalid(format!(
                "element {tag} needs at least 2 segments, got {segments}"
            )));
        }
        let segment = element.segment(&self.nodes)?;
        let [start, end] = element.node_tags();

        let mut chain = vec![start];
        for i in 1..segments {
            let t = i as f64 / segments as f64;
            let p = segment.start + (segment.end - segment.start) * t;
            chain.push(self.create_node(p.x, p.y, p.z));
        }
        chain.push(end);

        let mut created = Vec::with_capacity(segments);
        for pair in chain.windows(2) {
            let piece = element.respan(self.elements.next_tag(), pair[0], pair[1]);
            created.push(self.add_element(piece)?);
        }
        self.remove_element(tag)?;
        log::info!("Subdivided element {tag} into {segments} segments");
        Ok(created)
    }

    /// Remove an element from the registry, its groups and its floor
    pub fn remove_element(&mut self, tag: u32) -> BuildResult<bool> {
        self.guard("remove elements")?;
        if self.elements.remove(&tag).is_none() {
            log::warn!("Element {tag} not found for removal");
            return Ok(false);
        }
        for group in self.groups.values_mut() {
            group.remove(&tag);
        }
        for floor in &mut self.floors {
            floor.elements.remove(&tag);
        }
        log::info!("Removed element {tag}");
        Ok(true)
    }

    /// Remove an unused node; fails while any element references it
    pub(crate) fn remove_node(&mut self, tag: u32) -> BuildResult<bool> {
        self.guard("remove nodes")?;
        if !self.nodes.contains_key(&tag) {
            log::warn!("Node {tag} not found for removal");
            return Ok(false);
        }
        if let Some(element) = self.elements.values().find(|e| e.uses_node(tag)) {
            return Err(BuildError::NodeInUse {
                node: tag,
                element: element.tag,
            });
        }
        self.nodes.remove(&tag);
        log::info!("Removed node {tag}");
        Ok(true)
    }

    /// Remove every free node, returning their tags
    pub(crate) fn remove_free_nodes(&mut self) -> BuildResult<Vec<u32>> {
        self.guard("remove nodes")?;
        let free = self.check_free_nodes();
        for tag in &free {
            self.nodes.remove(tag);
        }
        log::info!("Removed {} free nodes", free.len());
        Ok(free)
    }

    /// Generate a Cartesian grid of nodes with column and beam lines
    ///
    /// Nodes are created z, then y, then x, reusing any node already within
    /// the merge tolerance. Columns run along z at every (x, y); `beam_x`
    /// lines run along x and `beam_y` lines along y on every level. Section
    /// names are kept as line metadata for later conversion.
    pub fn create_grid(
        &mut self,
        xs: &[f64],
        ys: &[f64],
        zs: &[f64],
        column_section: Option<&str>,
        beam_section: Option<&str>,
    ) -> BuildResult<GridSummary> {
        let options = GridOptions::with_sections(column_section, beam_section);
        self.create_grid_with(xs, ys, zs, &options)
    }

    /// [`Geometry::create_grid`] with explicit line types and switches
    pub fn create_grid_with(
        &mut self,
        xs: &[f64],
        ys: &[f64],
        zs: &[f64],
        options: &GridOptions,
    ) -> BuildResult<GridSummary> {
        self.guard("create a grid")?;
        let mut summary = GridSummary::default();
        let mut grid: HashMap<(usize, usize, usize), u32> = HashMap::new();
        for (k, &z) in zs.iter().enumerate() {
            for (j, &y) in ys.iter().enumerate() {
                for (i, &x) in xs.iter().enumerate() {
                    let tag = match self.find_node(x, y, z, None) {
                        Some(node) => node.tag(),
                        None => {
                            summary.nodes_created += 1;
                            self.create_node(x, y, z)
                        }
                    };
                    grid.insert((i, j, k), tag);
                }
            }
        }

        let mut line = |geo: &mut Self,
                        a: (usize, usize, usize),
                        b: (usize, usize, usize),
                        stype: StructuralType,
                        section: Option<&str>|
         -> BuildResult<()> {
            let tag = geo.elements.next_tag();
            let mut element = Element::line(tag, grid[&a], grid[&b], stype);
            if let (ElementKind::Line { metadata }, Some(section)) = (&mut element.kind, section) {
                metadata.insert("section", section);
            }
            geo.add_element(element)?;
            summary.elements_created += 1;
            Ok(())
        };

        let column_section = options.column_section.as_deref();
        let beam_section = options.beam_section.as_deref();
        if options.create_columns {
            for i in 0..xs.len() {
                for j in 0..ys.len() {
                    for k in 1..zs.len() {
                        line(self, (i, j, k - 1), (i, j, k), options.column_type, column_section)?;
                    }
                }
            }
        }
        if options.create_beams {
            for k in 0..zs.len() {
                for j in 0..ys.len() {
                    for i in 1..xs.len() {
                        line(self, (i - 1, j, k), (i, j, k), options.beam_x_type, beam_section)?;
                    }
                }
                for i in 0..xs.len() {
                    for j in 1..ys.len() {
                        line(self, (i, j - 1, k), (i, j, k), options.beam_y_type, beam_section)?;
                    }
                }
            }
        }

        log::info!(
            "Created grid with {} new nodes and {} line elements",
            summary.nodes_created,
            summary.elements_created
        );
        Ok(summary)
    }

    // ---- realization ----

    pub(crate) fn realize_nodes(&mut self, session: &mut dyn EngineSession) -> BuildResult<()> {
        for node in self.nodes.values_mut() {
            node.realize(session)?;
        }
        Ok(())
    }

    pub(crate) fn realize_elements(
        &mut self,
        session: &mut dyn EngineSession,
        sections: &Registry<String, Section>,
        transforms: &mut TransformationCache,
        tolerance: f64,
    ) -> BuildResult<()> {
        let mut ctx = RealizeContext {
            session,
            nodes: &mut self.nodes,
            sections,
            transforms,
            tolerance,
        };
        for element in self.elements.values_mut() {
            element.realize(&mut ctx)?;
        }
        Ok(())
    }

    /// Tags of nodes carrying a non-zero mass
    pub fn nodes_with_mass(&self) -> Vec<u32> {
        self.nodes
            .values()
            .filter(|n| n.mass().is_some_and(|m| m.iter().any(|v| *v != 0.0)))
            .map(Node::tag)
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.elements.clear();
        self.groups.clear();
        self.floors.clear();
        self.locked = false;
    }
}

/// Line metadata written by [`Geometry::create_grid`]
pub fn line_section(element: &Element) -> Option<&str> {
    match &element.kind {
        ElementKind::Line { metadata } => metadata.get("section").and_then(|v| v.as_str()),
        _ => None,
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(1e-6, 0.1)
    }
}
