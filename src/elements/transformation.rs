//! Geometric transformations and their deduplicating cache

use crate::command::Command;
use crate::error::BuildResult;
use crate::math::{calculate_aligned_vecxz, Vec3};
use crate::registry::Registry;
use crate::session::EngineSession;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Coordinate transformation formulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformKind {
    Linear,
    PDelta,
    Corotational,
}

impl TransformKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "Linear",
            Self::PDelta => "PDelta",
            Self::Corotational => "Corotational",
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transformation shared by every element with the same orientation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    pub tag: u32,
    pub kind: TransformKind,
    pub vecxz: [f64; 3],

    #[serde(skip)]
    pub(crate) realized: bool,
}

impl Transformation {
    pub fn is_realized(&self) -> bool {
        self.realized
    }

    pub fn command(&self) -> Command {
        Command::new("geomTransf")
            .arg(self.kind.as_str())
            .arg(self.tag)
            .args(self.vecxz)
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

type CacheKey = (TransformKind, [i64; 3]);

/// Orientation-keyed transformation store
///
/// Keys round `vecxz` to 6 decimals so floating-point noise does not mint
/// extra transformations. New tags are one past the largest existing tag.
#[derive(Debug, Clone, Default)]
pub struct TransformationCache {
    entries: Registry<u32, Transformation>,
    by_key: HashMap<CacheKey, u32>,
}

impl TransformationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, tag: u32) -> Option<&Transformation> {
        self.entries.get(&tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transformation> {
        self.entries.values()
    }

    /// Tag for a (kind, vecxz) pair, minting a new transformation on a miss.
    /// Returns the tag and whether it was newly created.
    pub fn resolve(&mut self, kind: TransformKind, vecxz: Vec3) -> (u32, bool) {
        let key = (kind, cache_key(&vecxz));
        if let Some(&tag) = self.by_key.get(&key) {
            return (tag, false);
        }
        let tag = self.entries.next_tag();
        self.entries.insert(
            tag,
            Transformation {
                tag,
                kind,
                vecxz: [vecxz.x, vecxz.y, vecxz.z],
                realized: false,
            },
        );
        self.by_key.insert(key, tag);
        (tag, true)
    }

    /// Tag of the transformation aligned with the member `start -> end`.
    ///
    /// With a session the transformation is emitted immediately; without one
    /// emission is deferred until an element realizes against it.
    pub fn get_or_create(
        &mut self,
        start: &Vec3,
        end: &Vec3,
        kind: TransformKind,
        tol: f64,
        session: Option<&mut dyn EngineSession>,
    ) -> BuildResult<u32> {
        let vecxz = calculate_aligned_vecxz(start, end, tol)?;
        let (tag, created) = self.resolve(kind, vecxz);
        if created {
            log::debug!("Created {kind} transformation {tag}");
        }
        if let Some(session) = session {
            self.ensure_realized(tag, session)?;
        }
        Ok(tag)
    }

    /// Emit a cached transformation if it has not been emitted yet
    pub fn ensure_realized(&mut self, tag: u32, session: &mut dyn EngineSession) -> BuildResult<()> {
        match self.entries.get_mut(&tag) {
            Some(transformation) => transformation.realize(session),
            None => Ok(()),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_key.clear();
    }
}

fn cache_key(v: &Vec3) -> [i64; 3] {
    [v.x, v.y, v.z].map(|c| (c * 1e6).round() as i64)
}
