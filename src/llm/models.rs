//! Static model catalog
//!
//! Every selectable backend model is declared here once, with the
//! temperatures the UI is allowed to offer for it.

use serde::Serialize;

/// Catalog entry for one selectable model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSpec {
    /// Human-readable name, also used for prefix-based role assignment
    pub display_name: &'static str,
    /// Model URI sent to the endpoint
    pub endpoint_id: &'static str,
    /// Ascending list of permitted temperatures
    pub allowed_temperatures: &'static [f32],
}

impl ModelSpec {
    pub fn allows_temperature(&self, temperature: f32) -> bool {
        self.allowed_temperatures
            .iter()
            .any(|t| (t - temperature).abs() < f32::EPSILON)
    }

    /// Nearest allowed temperature; ties resolve to the lower value
    pub fn coerce_temperature(&self, temperature: f32) -> f32 {
        let mut best = self.allowed_temperatures.first().copied().unwrap_or(0.0);
        for &candidate in self.allowed_temperatures {
            if (candidate - temperature).abs() < (best - temperature).abs() {
                best = candidate;
            }
        }
        best
    }

    /// Middle of the allowed range
    pub fn default_temperature(&self) -> f32 {
        self.allowed_temperatures
            .get(self.allowed_temperatures.len() / 2)
            .copied()
            .unwrap_or(0.0)
    }
}

/// All selectable models
pub fn all_models() -> &'static [ModelSpec] {
    &[
        ModelSpec {
            display_name: "Qwen3 235B",
            endpoint_id: "gpt://b1gppgv3fk1p5vm1kq4f/qwen3-235b-a22b-fp8/latest",
            allowed_temperatures: &[0.0, 0.3, 0.6, 0.9],
        },
        ModelSpec {
            display_name: "GPT OSS 120B",
            endpoint_id: "gpt://b1gppgv3fk1p5vm1kq4f/gpt-oss-120b/latest",
            allowed_temperatures: &[0.0, 0.5, 1.0],
        },
        ModelSpec {
            display_name: "YandexGPT 5 Pro",
            endpoint_id: "gpt://b1gppgv3fk1p5vm1kq4f/yandexgpt/latest",
            allowed_temperatures: &[0.0, 0.3, 0.6, 1.0],
        },
    ]
}

/// Exact display-name lookup
pub fn find_by_name<'a>(catalog: &'a [ModelSpec], name: &str) -> Option<&'a ModelSpec> {
    catalog.iter().find(|m| m.display_name == name)
}

/// First entry whose display name starts with `prefix`
pub fn find_by_prefix<'a>(catalog: &'a [ModelSpec], prefix: &str) -> Option<&'a ModelSpec> {
    catalog.iter().find(|m| m.display_name.starts_with(prefix))
}
