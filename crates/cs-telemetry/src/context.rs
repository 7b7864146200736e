//! Per-component telemetry context.
//!
//! A [`TelemetryContext`] is handed to each long-lived component at
//! construction. Components open its span around their work so every event
//! they emit carries the component name and chain.

use shared_types::ChainType;
use tracing::Span;

/// Identity attached to a component's log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryContext {
    component: &'static str,
    chain: Option<ChainType>,
}

impl TelemetryContext {
    /// Context for a named component.
    pub fn new(component: &'static str) -> Self {
        Self {
            component,
            chain: None,
        }
    }

    /// Attach the chain this component serves.
    pub fn with_chain(mut self, chain: ChainType) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Derive a context for a sub-component on the same chain.
    pub fn child(&self, component: &'static str) -> Self {
        Self {
            component,
            chain: self.chain,
        }
    }

    /// Component name.
    pub fn component(&self) -> &'static str {
        self.component
    }

    /// Chain, if one was attached.
    pub fn chain(&self) -> Option<ChainType> {
        self.chain
    }

    /// Span under which the component's events are recorded.
    pub fn span(&self) -> Span {
        match self.chain {
            Some(chain) => tracing::info_span!(
                "component",
                name = self.component,
                chain = chain.name()
            ),
            None => tracing::info_span!("component", name = self.component),
        }
    }
}

impl Default for TelemetryContext {
    fn default() -> Self {
        Self::new("chain-scan")
    }
}
