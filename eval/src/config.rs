/// Knobs of the evaluation engine. Built by the CLI from flags and the fixture's `[config]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    /// Retry a failed hierarchical field search with a direct lookup on the qualifier type.
    pub direct_lookup_fallback: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            direct_lookup_fallback: true,
        }
    }
}
