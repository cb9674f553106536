//! Uniaxial material definitions

use crate::command::{Command, Params};
use crate::error::BuildResult;
use crate::session::EngineSession;
use serde::{Deserialize, Serialize};

/// A named uniaxial material with a free-form parameter map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniaxialMaterial {
    /// Material tag
    pub tag: u32,
    /// Unique name used as the registry key
    pub name: String,
    /// Engine material type, e.g. `Steel01`, `Concrete02`
    pub material_type: String,
    /// Parameters in engine order
    pub params: Params,

    #[serde(skip)]
    pub(crate) realized: bool,
}

impl UniaxialMaterial {
    pub fn new(
        tag: u32,
        name: impl Into<String>,
        material_type: impl Into<String>,
        params: Params,
    ) -> Self {
        Self {
            tag,
            name: name.into(),
            material_type: material_type.into(),
            params,
            realized: false,
        }
    }

    pub fn is_realized(&self) -> bool {
        self.realized
    }

    /// Engine command for this material
    pub fn command(&self) -> BuildResult<Command> {
        Ok(Command::new("uniaxialMaterial")
            .arg(self.material_type.as_str())
            .arg(self.tag)
            .args(self.params.flatten()?))
    }

    pub fn realize(&mut self, session: &mut dyn EngineSession) -> BuildResult<()> {
        if self.realized {
            return Ok(());
        }
        session.execute(&self.command()?)?;
        self.realized = true;
        log::debug!("Realized material {} (tag={})", self.name, self.tag);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;
    use crate::session::RecordingSession;
    use serde_json::json;

    fn steel() -> UniaxialMaterial {
        let params = Params::try_from(json!({"Fy": 420.0e6, "E0": 200.0e9, "b": 0.01})).unwrap();
        UniaxialMaterial::new(1, "S420", "Steel01", params)
    }

    #[test]
    fn test_material_command() {
        let cmd = steel().command().unwrap();
        assert_eq!(cmd.to_string(), "uniaxialMaterial Steel01 1 420000000.0 200000000000.0 0.01");
    }

    #[test]
    fn test_realize_once() {
        let mut session = RecordingSession::new();
        let mut mat = steel();
        mat.realize(&mut session).unwrap();
        mat.realize(&mut session).unwrap();
        assert_eq!(session.commands().len(), 1);
        assert!(mat.is_realized());
    }

    #[test]
    fn test_missing_parameter_fails_before_emission() {
        let mut session = RecordingSession::new();
        let params = Params::try_from(json!({"Fy": 420.0e6, "E0": null})).unwrap();
        let mut mat = UniaxialMaterial::new(2, "bad", "Steel01", params);
        let err = mat.realize(&mut session).unwrap_err();
        assert!(matches!(err, BuildError::MissingArgument { .. }));
        assert!(session.commands().is_empty());
        assert!(!mat.is_realized());
    }
}
