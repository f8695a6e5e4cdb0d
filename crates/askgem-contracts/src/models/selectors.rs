use super::registry::ModelRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    /// Id sent on the wire, exactly as configured.
    pub name: String,
    /// Catalog family the id matched, if any.
    pub family: Option<String>,
    pub accepts_reasoning: bool,
}

/// Resolves a configured model id. The catalog never replaces the id; it only
/// decides whether reasoning options may be sent with it.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    registry: ModelRegistry,
}

impl ModelSelector {
    pub fn new(registry: Option<ModelRegistry>) -> Self {
        Self {
            registry: registry.unwrap_or_else(|| ModelRegistry::new(None)),
        }
    }

    /// Blank `requested` resolves to `default`. Ids outside the catalog are
    /// assumed to accept reasoning options.
    pub fn select(&self, requested: &str, default: &str) -> ModelSelection {
        let name = match requested.trim() {
            "" => default.trim(),
            value => value,
        };
        let lookup = name.strip_prefix("models/").unwrap_or(name);
        match self.registry.family_of(lookup) {
            Some(spec) => ModelSelection {
                name: name.to_string(),
                family: Some(spec.name.clone()),
                accepts_reasoning: spec.thinking,
            },
            None => ModelSelection {
                name: name.to_string(),
                family: None,
                accepts_reasoning: true,
            },
        }
    }
}
