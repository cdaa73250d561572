//! Tolerances and switches shared by one CSG operation.

/// Default tolerance for plane classification, split-point snapping and
/// degenerate fragment rejection.
pub const CSG_EPSILON: f32 = 1e-4;

/// Default tolerance for the final compaction pass.
/// Triangles with two corners closer than this are dropped.
pub const CLEANUP_EPSILON: f32 = 1e-5;

/// Environment variable overriding [`CsgOptions::epsilon`] in [`CsgOptions::from_env`].
pub const EPSILON_ENV: &str = "BSP_CSG_EPSILON";

/// Environment variable overriding [`CsgOptions::cleanup_epsilon`] in [`CsgOptions::from_env`].
pub const CLEANUP_EPSILON_ENV: &str = "BSP_CSG_CLEANUP_EPSILON";

/// Options threaded through tree building, classification and combination.
///
/// A single value is shared by every call made during one
/// [`combine`](crate::combine), so all stages agree on what "close enough" means.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CsgOptions {
    /// Tolerance used by the plane classifier and the splitting code.
    pub epsilon: f32,
    /// Tolerance used when dropping degenerate triangles after combination.
    pub cleanup_epsilon: f32,
    /// Recompute smoothed normals over the whole result once combination is done.
    pub recompute_normals: bool,
}

impl Default for CsgOptions {
    fn default() -> Self {
        Self {
            epsilon: CSG_EPSILON,
            cleanup_epsilon: CLEANUP_EPSILON,
            recompute_normals: false,
        }
    }
}

impl CsgOptions {
    /// Creates options with the default tolerances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default options, with the tolerances overridden by [`EPSILON_ENV`] and
    /// [`CLEANUP_EPSILON_ENV`] when those variables hold a positive float.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(value) = read_tolerance(EPSILON_ENV) {
            options.epsilon = value;
        }
        if let Some(value) = read_tolerance(CLEANUP_EPSILON_ENV) {
            options.cleanup_epsilon = value;
        }
        options
    }

    /// Sets the classification tolerance (clamped to at least `f32::EPSILON`).
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon.max(f32::EPSILON);
        self
    }

    /// Sets the cleanup tolerance (clamped to at least `f32::EPSILON`).
    pub fn with_cleanup_epsilon(mut self, epsilon: f32) -> Self {
        self.cleanup_epsilon = epsilon.max(f32::EPSILON);
        self
    }

    /// Enables or disables the final normal recomputation.
    pub fn with_recompute_normals(mut self, enabled: bool) -> Self {
        self.recompute_normals = enabled;
        self
    }
}

fn read_tolerance(key: &str) -> Option<f32> {
    let raw = std::env::var(key).ok()?;
    parse_tolerance(&raw)
}

fn parse_tolerance(raw: &str) -> Option<f32> {
    let value: f32 = raw.trim().parse().ok()?;
    if value.is_finite() && value > 0.0 {
        Some(value.max(f32::EPSILON))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let options = CsgOptions::default();
        assert_eq!(options.epsilon, CSG_EPSILON);
        assert_eq!(options.cleanup_epsilon, CLEANUP_EPSILON);
        assert!(!options.recompute_normals);
    }

    #[test]
    fn builder_clamps_tiny_values() {
        let options = CsgOptions::new().with_epsilon(0.0).with_cleanup_epsilon(-1.0);
        assert_eq!(options.epsilon, f32::EPSILON);
        assert_eq!(options.cleanup_epsilon, f32::EPSILON);
    }

    #[test]
    fn parse_accepts_positive_floats_only() {
        assert_eq!(parse_tolerance(" 0.001 "), Some(0.001));
        assert_eq!(parse_tolerance("1e-6"), Some(1e-6));
        assert_eq!(parse_tolerance("0"), None);
        assert_eq!(parse_tolerance("-0.5"), None);
        assert_eq!(parse_tolerance("NaN"), None);
        assert_eq!(parse_tolerance("inf"), None);
        assert_eq!(parse_tolerance("tiny"), None);
    }

    #[test]
    fn from_env_without_variables_is_default() {
        if std::env::var(EPSILON_ENV).is_err() && std::env::var(CLEANUP_EPSILON_ENV).is_err() {
            assert_eq!(CsgOptions::from_env(), CsgOptions::default());
        }
    }
}
