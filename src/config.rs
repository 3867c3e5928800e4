/// Tunable limits and policies for the query engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Power-set candidate families over more vertices than this fail with
    /// [`crate::MonacError::OverLimit`].
    pub max_power_set_vertices: usize,
    /// Collection mode fails with [`crate::MonacError::TooLargeResult`] once
    /// more subsets than this have been admitted.
    pub max_result_subsets: usize,
    /// When true, filter-expression failures coerce to `false`; when false
    /// they propagate and abort the query.
    pub catch_expression_errors: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_power_set_vertices: 20,
            max_result_subsets: 10_000,
            catch_expression_errors: true,
        }
    }
}

impl EngineConfig {
    /// Configuration that surfaces expression errors instead of recovering.
    pub fn strict() -> Self {
        Self {
            catch_expression_errors: false,
            ..Self::default()
        }
    }
}
