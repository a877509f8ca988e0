use clap::Args;
use cms_core::{AliasTable, ContentError};

pub const DEFAULT_BASE_URL: &str = "https://api.headless-cms.example";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_DOMAIN: &str = "example.com";

/// Where the content API lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub api_version: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

/// Immutable process-wide configuration, built once at startup and passed
/// into the server.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub upstream: UpstreamConfig,
    pub default_domain: String,
    pub aliases: AliasTable,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig::default(),
            default_domain: DEFAULT_DOMAIN.to_string(),
            aliases: AliasTable::default(),
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    /// Content API base URL
    #[arg(long, env = "CMS_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
    /// API version path segment
    #[arg(long, env = "CMS_API_VERSION", default_value = DEFAULT_API_VERSION)]
    pub api_version: String,
    /// Domain used when a tool call omits `domain`
    #[arg(long, env = "CMS_DEFAULT_DOMAIN", default_value = DEFAULT_DOMAIN)]
    pub domain: String,
    /// Alias table override, e.g. "blogs=posts,events=mec-events"
    #[arg(long, env = "CMS_MCP_ALIASES")]
    pub aliases: Option<String>,
}

impl ConfigArgs {
    pub fn into_config(self) -> Result<RuntimeConfig, ContentError> {
        let aliases = match self.aliases.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => AliasTable::parse(raw)?,
            _ => AliasTable::default(),
        };
        let default_domain = self.domain.trim().to_string();
        if default_domain.is_empty() {
            return Err(ContentError::invalid_input(
                "domain",
                "Default domain must not be empty",
            ));
        }
        Ok(RuntimeConfig {
            upstream: UpstreamConfig {
                base_url: self.base_url.trim().to_string(),
                api_version: self.api_version.trim().to_string(),
            },
            default_domain,
            aliases,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(aliases: Option<&str>) -> ConfigArgs {
        ConfigArgs {
            base_url: " https://cms.test/ ".to_string(),
            api_version: "v2".to_string(),
            domain: "blog.test".to_string(),
            aliases: aliases.map(str::to_string),
        }
    }

    #[test]
    fn missing_alias_override_uses_builtin_table() {
        let config = args(None).into_config().unwrap();
        assert_eq!(config.aliases, AliasTable::default());
        assert_eq!(config.upstream.base_url, "https://cms.test/");
        assert_eq!(config.default_domain, "blog.test");

        let config = args(Some("  ")).into_config().unwrap();
        assert_eq!(config.aliases, AliasTable::default());
    }

    #[test]
    fn alias_override_replaces_builtin_table() {
        let config = args(Some("news=articles")).into_config().unwrap();
        assert_eq!(config.aliases.resolve("NEWS"), "articles");
        assert_eq!(config.aliases.resolve("blogs"), "blogs");
    }

    #[test]
    fn invalid_alias_override_is_rejected() {
        assert!(args(Some("a=b,b=c")).into_config().is_err());
    }
}
