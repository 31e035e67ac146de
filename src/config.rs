//! Resolver configuration. See SPEC_FULL.md §2.3.

use derive_builder::Builder;

use crate::http::DEFAULT_USER_AGENT;

/// Platform/version identity sent to processors, plus the defensive
/// phase cap. Built the way the teacher crate builds its connection
/// configuration: `setter(into)` on string fields, explicit defaults on
/// optionals.
#[derive(Builder, Debug, Clone)]
#[builder(setter(into), build_fn(name = "try_build"))]
pub struct ResolverConfig {
    /// Reported to processors as part of the `platform=` cookie value.
    #[builder(default = "\"unknown\".to_string()")]
    pub platform: String,

    /// Reported to processors as part of the `version=` cookie value.
    #[builder(default = "\"3.7\".to_string()")]
    pub version: String,

    /// Default `User-Agent` sent on the processor fetch and any scrape
    /// that does not set `s_agent`.
    #[builder(default = "DEFAULT_USER_AGENT.to_string()")]
    pub default_agent: String,

    /// Defensive cap on the number of phases a session may run, on top of
    /// fingerprint-based loop detection. `None` relies solely on the
    /// fingerprint detector, matching the original interpreter.
    #[builder(default = "None", setter(strip_option))]
    pub max_phases: Option<u32>,
}

impl ResolverConfigBuilder {
    pub fn build(&self) -> ResolverConfig {
        self.try_build()
            .expect("all ResolverConfig fields have defaults")
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfigBuilder::default().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_original_constants() {
        let cfg = ResolverConfig::default();
        assert_eq!(cfg.platform, "unknown");
        assert_eq!(cfg.version, "3.7");
        assert_eq!(cfg.max_phases, None);
    }

    #[test]
    fn builder_overrides_take_effect() {
        let cfg = ResolverConfigBuilder::default()
            .platform("Linux")
            .max_phases(25u32)
            .build();
        assert_eq!(cfg.platform, "Linux");
        assert_eq!(cfg.max_phases, Some(25));
    }
}
