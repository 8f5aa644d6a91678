//! Environment-driven sink selection.

use rokvi_config::Environment;

/// Optional sinks attached when the logger is reloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkPlan {
    /// Production telemetry backend.
    pub telemetry: bool,
    /// Compact JSON console and debug output.
    pub structured_console: bool,
    /// External error reporting.
    pub error_reporting: bool,
}

impl SinkPlan {
    /// Sinks for `environment`.
    #[must_use]
    pub const fn for_environment(environment: Environment) -> Self {
        Self {
            telemetry: environment.is_production(),
            structured_console: environment.is_development(),
            error_reporting: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_depends_only_on_environment() {
        let plan = |telemetry, structured_console| SinkPlan {
            telemetry,
            structured_console,
            error_reporting: true,
        };
        assert_eq!(
            SinkPlan::for_environment(Environment::Production),
            plan(true, false)
        );
        assert_eq!(
            SinkPlan::for_environment(Environment::Development),
            plan(false, true)
        );
        assert_eq!(
            SinkPlan::for_environment(Environment::Staging),
            plan(false, false)
        );
        assert_eq!(
            SinkPlan::for_environment(Environment::Test),
            plan(false, false)
        );
    }
}
