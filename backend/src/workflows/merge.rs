// Merge fields - resolves <%name%> placeholders in action parameters

use automate_shared::{Entity, value_to_text};
use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use tracing::warn;

use crate::error::{WorkflowError, WorkflowResult};
use crate::services::EntityStore;

/// Upper bound on substitutions for a single value
pub const MAX_MERGE_ITERATIONS: usize = 5000;

/// Upper bound on segments in a dotted reference path
pub const MAX_REFERENCE_DEPTH: usize = 16;

static MERGE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<%(.*?)%>").expect("merge field pattern is valid"));

/// Resolves merge fields against an entity.
///
/// Besides plain field names it understands `id`, `entity_link`, and dotted
/// paths such as `owner_id.manager_id.name` that walk object references.
#[derive(Clone)]
pub struct MergeFieldResolver {
    entity_store: Arc<dyn EntityStore>,
    application_url: String,
    max_iterations: usize,
}

impl MergeFieldResolver {
    pub fn new(entity_store: Arc<dyn EntityStore>, application_url: &str) -> Self {
        Self {
            entity_store,
            application_url: application_url.trim_end_matches('/').to_string(),
            max_iterations: MAX_MERGE_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn entity_link(&self, entity: &Entity) -> String {
        format!("{}/browse/{}", self.application_url, entity.entity_id().unwrap_or_default())
    }

    /// Strings are merged; every other value is returned unchanged.
    pub async fn resolve(&self, value: &Value, entity: &Entity) -> WorkflowResult<Value> {
        match value {
            Value::String(text) => Ok(Value::String(self.resolve_str(text, entity).await?)),
            other => Ok(other.clone()),
        }
    }

    pub async fn resolve_str(&self, text: &str, entity: &Entity) -> WorkflowResult<String> {
        let mut merged = text.to_string();
        let mut iterations = 0;

        // Substituted values are scanned again, so a value can expand into further fields.
        // Every replaced occurrence counts toward the bound.
        while let Some((token, name)) = first_merge_field(&merged) {
            iterations += merged.matches(token.as_str()).count();
            if iterations > self.max_iterations {
                return Err(WorkflowError::ExcessiveIterations {
                    limit: self.max_iterations,
                });
            }

            let replacement = match name.as_str() {
                "entity_link" => self.entity_link(entity),
                "id" => entity.entity_id().unwrap_or_default().to_string(),
                path => self.field_value(entity, path).await?,
            };
            merged = merged.replace(&token, &replacement);
        }

        Ok(merged)
    }

    /// Text of a field, following object references for dotted paths.
    /// Anything that cannot be followed yields an empty string.
    async fn field_value(&self, entity: &Entity, path: &str) -> WorkflowResult<String> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.len() > MAX_REFERENCE_DEPTH {
            warn!(path, "Merge field path exceeds {} segments", MAX_REFERENCE_DEPTH);
            return Ok(String::new());
        }

        let mut referenced: Option<Entity> = None;
        for (position, segment) in segments.iter().enumerate() {
            let current = referenced.as_ref().unwrap_or(entity);

            if position == segments.len() - 1 {
                return Ok(current.get_value(segment).map(value_to_text).unwrap_or_default());
            }

            let Some(field) = current.definition.get_field(segment) else {
                return Ok(String::new());
            };
            if !field.field_type.is_reference() {
                return Ok(String::new());
            }
            let Some(obj_type) = field.subtype.clone() else {
                return Ok(String::new());
            };
            let reference_id = current.get_value_text(segment);
            if reference_id.is_empty() {
                return Ok(String::new());
            }
            let account_id = current.account_id.clone();

            match self.entity_store.get(&obj_type, &reference_id, &account_id).await? {
                Some(next) => referenced = Some(next),
                None => return Ok(String::new()),
            }
        }

        Ok(String::new())
    }
}

fn first_merge_field(text: &str) -> Option<(String, String)> {
    MERGE_FIELD
        .captures(text)
        .map(|caps| (caps[0].to_string(), caps[1].to_string()))
}
