//! Per-capability behavior layered on the generic injection steps.
//!
//! A [`Capability`] bundles everything that varies by middleware name. Names
//! with no registry entry resolve to a generic bundle: the name is its own
//! import symbol and every side effect is absent.

use std::collections::BTreeMap;

/// Kind of companion file provisioned next to the target source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    /// `<stem>.m.css` plus `<stem>.m.css.d.ts`
    Stylesheet,
    /// `<stem>.nls.ts`
    MessageBundle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub name: String,
    /// Identifier bound by the generated import
    pub symbol: String,
    /// Emit `const <name> = <symbol>();` before the factory call
    pub instantiate: bool,
    /// Line inserted after the widget-factory anchor
    pub follow_up: Option<String>,
    pub asset: Option<AssetKind>,
}

impl Capability {
    /// Bundle for a name with no special behavior.
    pub fn generic(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            symbol: name.clone(),
            name,
            instantiate: false,
            follow_up: None,
            asset: None,
        }
    }

    /// Declaration inserted before the factory call, if any.
    pub fn pre_call_line(&self) -> Option<String> {
        self.instantiate
            .then(|| format!("const {} = {}();", self.name, self.symbol))
    }
}

/// `store` -> `createStoreMiddleware`
pub fn constructor_symbol(name: &str) -> String {
    let mut chars = name.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    format!("create{capitalized}Middleware")
}

/// Lookup table from capability name to bundle.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    entries: BTreeMap<String, Capability>,
}

impl CapabilityRegistry {
    /// Registry with the framework's built-in middleware.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register(Capability {
            instantiate: true,
            symbol: constructor_symbol("store"),
            ..Capability::generic("store")
        });
        registry.register(Capability {
            follow_up: Some("const themedCss = theme.classes(css);".to_string()),
            asset: Some(AssetKind::Stylesheet),
            ..Capability::generic("theme")
        });
        registry.register(Capability {
            follow_up: Some("const { messages } = i18n.localize(bundle);".to_string()),
            asset: Some(AssetKind::MessageBundle),
            ..Capability::generic("i18n")
        });
        registry
    }

    /// Add or replace an entry.
    pub fn register(&mut self, capability: Capability) {
        self.entries.insert(capability.name.clone(), capability);
    }

    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Bundle for `name`, falling back to the generic one.
    pub fn resolve(&self, name: &str) -> Capability {
        self.get(name)
            .cloned()
            .unwrap_or_else(|| Capability::generic(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.entries.values()
    }

    /// Closest registered name to `name` by Jaro-Winkler similarity.
    pub fn suggest(&self, name: &str) -> Option<&str> {
        self.entries
            .keys()
            .map(|known| (known, strsim::jaro_winkler(name, known)))
            .filter(|(_, score)| *score >= 0.8)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(known, _)| known.as_str())
    }
}
