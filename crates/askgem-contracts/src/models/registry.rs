use indexmap::IndexMap;

/// A Gemini model family and whether it accepts `thinkingConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub thinking: bool,
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name)
    }

    /// Exact entry for `name`, else the longest entry that `name` extends
    /// with a `-` suffix (`gemini-2.5-flash-preview-04-17` → `gemini-2.5-flash`).
    pub fn family_of(&self, name: &str) -> Option<&ModelSpec> {
        if let Some(spec) = self.get(name) {
            return Some(spec);
        }
        self.models
            .values()
            .filter(|spec| {
                name.strip_prefix(spec.name.as_str())
                    .is_some_and(|rest| rest.starts_with('-'))
            })
            .max_by_key(|spec| spec.name.len())
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();
    for (name, thinking) in [
        ("gemini-2.5-flash", true),
        ("gemini-2.5-flash-lite", true),
        ("gemini-2.5-pro", true),
        ("gemini-2.0-flash", false),
        ("gemini-2.0-flash-lite", false),
        ("gemini-1.5-flash", false),
        ("gemini-1.5-pro", false),
    ] {
        map.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                thinking,
            },
        );
    }
    map
}
