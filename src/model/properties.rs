//! Properties registry: materials, sections, beam integrations and transformations

use crate::command::Params;
use crate::elements::{
    BeamIntegration, ElasticSectionSpec, FiberSectionSpec, Section, StructuralType,
    TransformationCache, UniaxialMaterial,
};
use crate::error::{BuildError, BuildResult};
use crate::registry::Registry;
use crate::sections::{PolygonAnalyzer, SectionAnalyzer};
use crate::session::EngineSession;

/// Owner of the cross-section and material definitions of a model
///
/// Materials and sections are keyed by name. Registering under an existing
/// name replaces the old entry with the new, unrealized one.
pub struct Properties {
    materials: Registry<String, UniaxialMaterial>,
    sections: Registry<String, Section>,
    integrations: Registry<u32, BeamIntegration>,
    transforms: TransformationCache,
    analyzer: Box<dyn SectionAnalyzer>,
}

impl Properties {
    pub fn new() -> Self {
        Self::with_analyzer(Box::new(PolygonAnalyzer::default()))
    }

    /// Use a custom section-properties service
    pub fn with_analyzer(analyzer: Box<dyn SectionAnalyzer>) -> Self {
        Self {
            materials: Registry::new(),
            sections: Registry::new(),
            integrations: Registry::new(),
            transforms: TransformationCache::new(),
            analyzer,
        }
    }

    pub fn set_analyzer(&mut self, analyzer: Box<dyn SectionAnalyzer>) {
        self.analyzer = analyzer;
    }

    pub fn materials(&self) -> &Registry<String, UniaxialMaterial> {
        &self.materials
    }

    pub fn material(&self, name: &str) -> Option<&UniaxialMaterial> {
        self.materials.get(name)
    }

    pub fn sections(&self) -> &Registry<String, Section> {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn integrations(&self) -> &Registry<u32, BeamIntegration> {
        &self.integrations
    }

    pub fn integration(&self, tag: u32) -> Option<&BeamIntegration> {
        self.integrations.get(&tag)
    }

    pub fn transformations(&self) -> &TransformationCache {
        &self.transforms
    }

    pub(crate) fn transforms_mut(&mut self) -> &mut TransformationCache {
        &mut self.transforms
    }

    pub fn create_uniaxial_material(
        &mut self,
        tag: u32,
        name: &str,
        material_type: &str,
        params: Params,
    ) -> BuildResult<&UniaxialMaterial> {
        self.add_uniaxial_material(UniaxialMaterial::new(tag, name, material_type, params))
    }

    pub fn add_uniaxial_material(
        &mut self,
        material: UniaxialMaterial,
    ) -> BuildResult<&UniaxialMaterial> {
        if let Some(other) = self
            .materials
            .values()
            .find(|m| m.tag == material.tag && m.name != material.name)
        {
            log::warn!("Material tag {} already used by '{}'", material.tag, other.name);
            return Err(BuildError::DuplicateTag {
                category: "material",
                tag: material.tag,
            });
        }
        if self.materials.contains_key(material.name.as_str()) {
            log::info!("Replaced material {}", material.name);
        } else {
            log::info!("Added material {}", material.name);
        }
        Ok(self.materials.upsert(material.name.clone(), material))
    }

    /// Create an elastic section, computing its properties now
    pub fn create_elastic_section(
        &mut self,
        tag: u32,
        name: &str,
        structural_type: StructuralType,
        spec: &ElasticSectionSpec,
    ) -> BuildResult<&Section> {
        let section = Section::elastic(tag, name, structural_type, spec, self.analyzer.as_ref())?;
        self.add_section(section)
    }

    /// Create a fiber section, meshing it now
    pub fn create_fiber_section(
        &mut self,
        tag: u32,
        name: &str,
        structural_type: StructuralType,
        spec: &FiberSectionSpec,
    ) -> BuildResult<&Section> {
        let section = Section::fiber(tag, name, structural_type, spec, self.analyzer.as_ref())?;
        self.add_section(section)
    }

    pub fn add_section(&mut self, section: Section) -> BuildResult<&Section> {
        if self
            .sections
            .values()
            .any(|s| s.tag == section.tag && s.name != section.name)
        {
            return Err(BuildError::DuplicateTag {
                category: "section",
                tag: section.tag,
            });
        }
        log::info!(
            "Added section {} (A={:.6}, Iz={:.6e}, Iy={:.6e})",
            section.name,
            section.properties.area,
            section.properties.iz,
            section.properties.iy
        );
        Ok(self.sections.upsert(section.name.clone(), section))
    }

    /// Create a quadrature-type beam integration from its engine name
    pub fn create_beam_integration(
        &mut self,
        tag: u32,
        kind: &str,
        section: u32,
        num_points: usize,
    ) -> BuildResult<&BeamIntegration> {
        let integration = BeamIntegration::from_kind_name(tag, kind, section, num_points)?;
        Ok(self.add_beam_integration(integration))
    }

    /// Register a beam integration; an existing tag is replaced
    pub fn add_beam_integration(&mut self, integration: BeamIntegration) -> &BeamIntegration {
        let tag = integration.tag;
        log::info!("Added {} beam integration {tag}", integration.kind_name());
        self.integrations.upsert(tag, integration)
    }

    pub(crate) fn realize_materials(&mut self, session: &mut dyn EngineSession) -> BuildResult<()> {
        for material in self.materials.values_mut() {
            material.realize(session)?;
        }
        Ok(())
    }

    pub(crate) fn realize_sections(&mut self, session: &mut dyn EngineSession) -> BuildResult<()> {
        for section in self.sections.values_mut() {
            section.realize(session)?;
        }
        Ok(())
    }

    pub(crate) fn realize_integrations(
        &mut self,
        session: &mut dyn EngineSession,
    ) -> BuildResult<()> {
        for integration in self.integrations.values_mut() {
            integration.realize(session)?;
        }
        Ok(())
    }

    /// Split borrow used while realizing elements
    pub(crate) fn element_inputs(
        &mut self,
    ) -> (&Registry<String, Section>, &mut TransformationCache) {
        (&self.sections, &mut self.transforms)
    }

    pub(crate) fn clear(&mut self) {
        self.materials.clear();
        self.sections.clear();
        self.integrations.clear();
        self.transforms.clear();
    }
}

impl Default for Properties {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Properties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Properties")
            .field("materials", &self.materials.len())
            .field("sections", &self.sections.len())
            .field("integrations", &self.integrations.len())
            .field("transformations", &self.transforms.len())
            .finish()
    }
}
