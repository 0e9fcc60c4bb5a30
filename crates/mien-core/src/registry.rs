//! Enrolled identity registry.
//!
//! Volatile, in-memory mapping of person name to enrolled feature templates.
//! Shared across tasks behind one interior `RwLock`: `enroll` and `remove`
//! take the write lock, `identify` and `list` take the read lock, so a
//! reader never observes a partially-updated person entry. People and
//! templates iterate in enrollment order, which makes `identify`
//! deterministic.
//!
//! Persistence across process restarts is deliberately out of scope; a
//! store layered on top of `enroll`/`list` owns that.

use std::sync::RwLock;

use serde::Serialize;
use thiserror::Error;

use crate::types::FeatureVector;

/// Default similarity threshold for a positive identification.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.8;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("enrollment name must not be empty")]
    InvalidName,
}

/// A stored feature template with metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub id: String,
    pub features: FeatureVector,
    pub created_at: String,
}

/// One person's enrolled templates, as returned by [`IdentityRegistry::list`].
#[derive(Debug, Clone, Serialize)]
pub struct EnrolledPerson {
    pub name: String,
    pub templates: Vec<Template>,
}

/// A positive identification produced by [`IdentityRegistry::identify`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityMatch {
    pub name: String,
    /// Similarity of the matching template. Not a normalized metric; see
    /// [`FeatureVector::similarity`].
    pub similarity: f32,
}

struct PersonEntry {
    name: String,
    templates: Vec<Template>,
}

/// Registry of enrolled people. The sole owner of all templates.
#[derive(Default)]
pub struct IdentityRegistry {
    entries: RwLock<Vec<PersonEntry>>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enroll one template under a person name, returning the template id.
    ///
    /// Appends: enrolling the same name again keeps both templates. An empty
    /// name is rejected synchronously and the registry is left unchanged.
    pub fn enroll(&self, name: &str, features: FeatureVector) -> Result<String, RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::InvalidName);
        }

        let template = Template {
            id: uuid::Uuid::new_v4().to_string(),
            features,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let id = template.id.clone();

        let mut entries = self.entries.write().expect("registry lock poisoned");
        match entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.templates.push(template),
            None => entries.push(PersonEntry {
                name: name.to_string(),
                templates: vec![template],
            }),
        }

        tracing::debug!(name, template_id = %id, "template enrolled");
        Ok(id)
    }

    /// Find the first enrolled template meeting the threshold.
    ///
    /// Walks people and their templates in enrollment order and returns on
    /// the first score `>= threshold`. Templates whose length differs from
    /// the probe are skipped: incomparable means "not a match", never an
    /// error. Returns `None` when nothing qualifies or the registry is empty.
    pub fn identify(&self, features: &FeatureVector, threshold: f32) -> Option<IdentityMatch> {
        let entries = self.entries.read().expect("registry lock poisoned");
        for entry in entries.iter() {
            for template in &entry.templates {
                let Ok(score) = features.similarity(&template.features) else {
                    continue;
                };
                if score >= threshold {
                    tracing::debug!(name = %entry.name, score, "identity matched");
                    return Some(IdentityMatch {
                        name: entry.name.clone(),
                        similarity: score,
                    });
                }
            }
        }
        None
    }

    /// Snapshot of everyone enrolled, in enrollment order.
    pub fn list(&self) -> Vec<EnrolledPerson> {
        let entries = self.entries.read().expect("registry lock poisoned");
        entries
            .iter()
            .map(|entry| EnrolledPerson {
                name: entry.name.clone(),
                templates: entry.templates.clone(),
            })
            .collect()
    }

    /// Remove a person and all their templates.
    ///
    /// Returns whether the person was enrolled.
    pub fn remove(&self, name: &str) -> bool {
        let mut entries = self.entries.write().expect("registry lock poisoned");
        let before = entries.len();
        entries.retain(|entry| entry.name != name);
        let removed = entries.len() != before;
        if removed {
            tracing::debug!(name, "person removed");
        }
        removed
    }

    /// Number of enrolled people.
    pub fn len(&self) -> usize {
        self.entries.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
