//! Model catalogue and flat per-model pricing.

use enhance_core::Credits;

/// Model used when a request names none.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Price charged for a model missing from the catalogue.
pub const DEFAULT_PRICE: Credits = Credits::from_cents(10);

/// A priced model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedModel {
    /// Name accepted from callers and stored on the entry.
    pub name: &'static str,
    /// Dated snapshot id, also accepted from callers and sent to the provider.
    pub snapshot: Option<&'static str>,
    pub price: Credits,
}

impl PricedModel {
    /// Whether `model` names this entry by either id.
    pub fn matches(&self, model: &str) -> bool {
        self.name == model || self.snapshot == Some(model)
    }

    /// The id the provider is called with.
    pub fn provider_id(&self) -> &'static str {
        self.snapshot.unwrap_or(self.name)
    }
}

/// Every model that can be requested.
pub const CATALOGUE: [PricedModel; 4] = [
    PricedModel {
        name: "gpt-4o-mini",
        snapshot: None,
        price: Credits::from_cents(10),
    },
    PricedModel {
        name: "gpt-4o",
        snapshot: None,
        price: Credits::from_cents(50),
    },
    PricedModel {
        name: "claude-3-5-sonnet",
        snapshot: Some("claude-3-5-sonnet-20241022"),
        price: Credits::from_cents(75),
    },
    PricedModel {
        name: "claude-3-5-haiku",
        snapshot: Some("claude-3-5-haiku-20241022"),
        price: Credits::from_cents(25),
    },
];

/// Look up a model by name or snapshot id.
pub fn lookup(model: &str) -> Option<&'static PricedModel> {
    CATALOGUE.iter().find(|priced| priced.matches(model))
}

/// Credits charged for one enhancement with `model`.
pub fn price_for(model: &str) -> Credits {
    lookup(model).map(|priced| priced.price).unwrap_or(DEFAULT_PRICE)
}

/// The id to send to the provider for `model`.
pub fn provider_model_id(model: &str) -> &str {
    match lookup(model) {
        Some(priced) => priced.provider_id(),
        None => model,
    }
}

/// Comma-separated list of accepted model names.
pub fn accepted_models() -> String {
    CATALOGUE
        .iter()
        .map(|priced| priced.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Which provider serves a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFamily {
    /// `gpt-` models, served by OpenAI.
    Gpt,
    /// `claude-` models, served by Anthropic.
    Claude,
}

impl ProviderFamily {
    /// Route a model name by prefix.
    pub fn for_model(model: &str) -> Option<Self> {
        if model.starts_with("gpt-") {
            Some(ProviderFamily::Gpt)
        } else if model.starts_with("claude-") {
            Some(ProviderFamily::Claude)
        } else {
            None
        }
    }
}
