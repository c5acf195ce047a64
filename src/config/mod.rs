//! Configuration management
//!
//! Configuration is read from a flat key/value store (see [`store`]) and
//! validated once into [`Settings`]. Nothing below the command layer looks
//! keys up by name; every recognized key and its default is listed here.

pub mod paths;
pub mod store;

use std::path::Path;

use crate::error::{Result, config as config_error};

pub use paths::{APP_NAME, AppPaths};
pub use store::KeyValueStore;

/// Optional backing services of an environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServiceFlags {
    /// Redis as session, cache and page cache backend
    pub redis: bool,
    /// Varnish as full-page cache
    pub varnish: bool,
    /// RabbitMQ as message queue
    pub rabbitmq: bool,
    /// Elasticsearch as search engine
    pub elasticsearch: bool,
}

/// Global services started by `berth install`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalServices {
    pub dnsmasq: bool,
    pub tunnel: bool,
    pub mailhog: bool,
}

impl Default for GlobalServices {
    fn default() -> Self {
        Self {
            dnsmasq: true,
            tunnel: true,
            mailhog: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MagentoEdition {
    #[default]
    Community,
    Enterprise,
}

impl MagentoEdition {
    pub fn as_str(self) -> &'static str {
        match self {
            MagentoEdition::Community => "community",
            MagentoEdition::Enterprise => "enterprise",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MagentoMode {
    #[default]
    Developer,
    Production,
}

impl MagentoMode {
    pub fn as_str(self) -> &'static str {
        match self {
            MagentoMode::Developer => "developer",
            MagentoMode::Production => "production",
        }
    }
}

/// Options consulted while resolving a bootstrap plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapSettings {
    pub full: bool,
    pub composer_no_parallel: bool,
    pub skip_composer_install: bool,
    pub no_pull: bool,
    pub with_sample_data: bool,
    pub disable_tfa: bool,
    pub reset_admin_url: bool,
    pub magento_edition: MagentoEdition,
    pub magento_mode: MagentoMode,
    pub db_prefix: String,
    pub backend_frontname: String,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            full: false,
            composer_no_parallel: false,
            skip_composer_install: false,
            no_pull: false,
            with_sample_data: false,
            disable_tfa: false,
            reset_admin_url: false,
            magento_edition: MagentoEdition::Community,
            magento_mode: MagentoMode::Developer,
            db_prefix: String::new(),
            backend_frontname: "admin".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallSettings {
    /// Permission bits of the app home directory
    pub app_home_mode: u32,
    pub ignore_init_services: bool,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            app_home_mode: 0o755,
            ignore_init_services: false,
        }
    }
}

/// Validated configuration for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub env_type: Option<String>,
    pub domain: String,
    pub subdomain: String,
    pub magento_version: Option<String>,
    pub composer_version: Option<String>,
    pub services: ServiceFlags,
    pub global_services: GlobalServices,
    pub bootstrap: BootstrapSettings,
    pub install: InstallSettings,
    pub debug: bool,
    pub log_level: String,
}

/// Keys understood by [`Settings::from_store`]
const KNOWN_KEYS: &[&str] = &[
    "berth_env_type",
    "traefik_domain",
    "traefik_subdomain",
    "magento_version",
    "composer_version",
    "berth_redis",
    "berth_varnish",
    "berth_rabbitmq",
    "berth_elasticsearch",
    "berth_dnsmasq",
    "berth_tunnel",
    "berth_mailhog",
    "berth_full_bootstrap",
    "berth_composer_no_parallel",
    "berth_skip_composer_install",
    "berth_no_pull",
    "berth_with_sampledata",
    "berth_magento_disable_tfa",
    "berth_reset_admin_url",
    "berth_magento_type",
    "berth_magento_mode",
    "berth_db_prefix",
    "magento_backend_frontname",
    "berth_install_app_home_mode",
    "berth_install_ignore_init_svcs",
    "debug",
    "berth_debug",
    "log_level",
];

impl Settings {
    /// Build settings for a project, falling back to defaults for unset keys
    ///
    /// `project_name` seeds the default domain (`<project_name>.test`).
    pub fn from_store(store: &KeyValueStore, project_name: &str) -> Result<Self> {
        for key in store.keys() {
            if !KNOWN_KEYS.contains(&key) {
                tracing::debug!("Ignoring unrecognized configuration key: {key}");
            }
        }

        let bootstrap_defaults = BootstrapSettings::default();
        let install_defaults = InstallSettings::default();
        let global_defaults = GlobalServices::default();

        let bootstrap = BootstrapSettings {
            full: flag(store, "berth_full_bootstrap", false)?,
            composer_no_parallel: flag(store, "berth_composer_no_parallel", false)?,
            skip_composer_install: flag(store, "berth_skip_composer_install", false)?,
            no_pull: flag(store, "berth_no_pull", false)?,
            with_sample_data: flag(store, "berth_with_sampledata", false)?,
            disable_tfa: flag(store, "berth_magento_disable_tfa", false)?,
            reset_admin_url: flag(store, "berth_reset_admin_url", false)?,
            magento_edition: match non_empty(store, "berth_magento_type") {
                None => bootstrap_defaults.magento_edition,
                Some(v) if v.eq_ignore_ascii_case("community") => MagentoEdition::Community,
                Some(v)
                    if v.eq_ignore_ascii_case("enterprise")
                        || v.eq_ignore_ascii_case("commerce") =>
                {
                    MagentoEdition::Enterprise
                }
                Some(v) => {
                    return Err(config_error::invalid(
                        "berth_magento_type",
                        v,
                        "expected community, enterprise or commerce",
                    ));
                }
            },
            magento_mode: match non_empty(store, "berth_magento_mode") {
                None => bootstrap_defaults.magento_mode,
                Some(v) if v.eq_ignore_ascii_case("developer") => MagentoMode::Developer,
                Some(v) if v.eq_ignore_ascii_case("production") => MagentoMode::Production,
                Some(v) => {
                    return Err(config_error::invalid(
                        "berth_magento_mode",
                        v,
                        "expected developer or production",
                    ));
                }
            },
            db_prefix: store.get("berth_db_prefix").unwrap_or_default().to_string(),
            backend_frontname: non_empty(store, "magento_backend_frontname")
                .map_or(bootstrap_defaults.backend_frontname, str::to_string),
        };

        let install = InstallSettings {
            app_home_mode: match non_empty(store, "berth_install_app_home_mode") {
                Some(v) => parse_mode("berth_install_app_home_mode", v)?,
                None => install_defaults.app_home_mode,
            },
            ignore_init_services: flag(store, "berth_install_ignore_init_svcs", false)?,
        };

        Ok(Self {
            env_type: non_empty(store, "berth_env_type").map(str::to_string),
            domain: non_empty(store, "traefik_domain")
                .map_or_else(|| format!("{project_name}.test"), str::to_string),
            subdomain: store
                .get("traefik_subdomain")
                .unwrap_or("app")
                .to_string(),
            magento_version: non_empty(store, "magento_version").map(str::to_string),
            composer_version: non_empty(store, "composer_version").map(str::to_string),
            services: ServiceFlags {
                redis: flag(store, "berth_redis", false)?,
                varnish: flag(store, "berth_varnish", false)?,
                rabbitmq: flag(store, "berth_rabbitmq", false)?,
                elasticsearch: flag(store, "berth_elasticsearch", false)?,
            },
            global_services: GlobalServices {
                dnsmasq: flag(store, "berth_dnsmasq", global_defaults.dnsmasq)?,
                tunnel: flag(store, "berth_tunnel", global_defaults.tunnel)?,
                mailhog: flag(store, "berth_mailhog", global_defaults.mailhog)?,
            },
            bootstrap,
            install,
            debug: flag(store, "debug", false)? || flag(store, "berth_debug", false)?,
            log_level: non_empty(store, "log_level").unwrap_or("info").to_string(),
        })
    }

    /// Fully qualified domain of the environment (`app.shop.test`)
    pub fn full_domain(&self) -> String {
        if self.subdomain.is_empty() {
            self.domain.clone()
        } else {
            format!("{}.{}", self.subdomain, self.domain)
        }
    }
}

/// Read the global config and the project `.env` into one store
pub fn load_store(paths: &AppPaths, project_root: &Path) -> Result<KeyValueStore> {
    let mut store = KeyValueStore::new();
    store.merge_yaml_file(paths.config_file())?;
    store.merge_env_file(&project_root.join(".env"))?;
    Ok(store)
}

fn non_empty<'a>(store: &'a KeyValueStore, key: &str) -> Option<&'a str> {
    store.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn flag(store: &KeyValueStore, key: &str, default: bool) -> Result<bool> {
    match non_empty(store, key) {
        None => Ok(default),
        Some(value) => parse_bool(value)
            .ok_or_else(|| config_error::invalid(key, value, "expected a boolean (1/0, true/false)")),
    }
}

/// Parse the boolean spellings accepted in config files and `.env`
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_mode(key: &str, value: &str) -> Result<u32> {
    let digits = value.trim_start_matches("0o");
    u32::from_str_radix(digits, 8)
        .ok()
        .filter(|mode| *mode <= 0o7777)
        .ok_or_else(|| config_error::invalid(key, value, "expected an octal permission mode"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BerthError;

    fn store(pairs: &[(&str, &str)]) -> KeyValueStore {
        let mut store = KeyValueStore::new();
        for (key, value) in pairs {
            store.set(key, *value);
        }
        store
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_store(&KeyValueStore::new(), "shop").unwrap();

        assert_eq!(settings.env_type, None);
        assert_eq!(settings.domain, "shop.test");
        assert_eq!(settings.full_domain(), "app.shop.test");
        assert_eq!(settings.services, ServiceFlags::default());
        assert_eq!(settings.global_services, GlobalServices::default());
        assert_eq!(settings.bootstrap, BootstrapSettings::default());
        assert_eq!(settings.install.app_home_mode, 0o755);
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_service_flags() {
        let settings = Settings::from_store(
            &store(&[
                ("berth_redis", "1"),
                ("berth_varnish", "true"),
                ("berth_rabbitmq", "off"),
                ("berth_elasticsearch", "Yes"),
            ]),
            "shop",
        )
        .unwrap();

        assert!(settings.services.redis);
        assert!(settings.services.varnish);
        assert!(!settings.services.rabbitmq);
        assert!(settings.services.elasticsearch);
    }

    #[test]
    fn test_invalid_boolean_names_key() {
        let err = Settings::from_store(&store(&[("berth_redis", "maybe")]), "shop").unwrap_err();
        match err {
            BerthError::ConfigInvalid { key, value, .. } => {
                assert_eq!(key, "berth_redis");
                assert_eq!(value, "maybe");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_value_uses_default() {
        let settings = Settings::from_store(&store(&[("berth_dnsmasq", "")]), "shop").unwrap();
        assert!(settings.global_services.dnsmasq);
    }

    #[test]
    fn test_magento_options() {
        let settings = Settings::from_store(
            &store(&[
                ("berth_magento_type", "commerce"),
                ("berth_magento_mode", "production"),
                ("berth_db_prefix", "m2_"),
                ("magento_backend_frontname", "backoffice"),
            ]),
            "shop",
        )
        .unwrap();

        assert_eq!(settings.bootstrap.magento_edition, MagentoEdition::Enterprise);
        assert_eq!(settings.bootstrap.magento_mode, MagentoMode::Production);
        assert_eq!(settings.bootstrap.db_prefix, "m2_");
        assert_eq!(settings.bootstrap.backend_frontname, "backoffice");
    }

    #[test]
    fn test_invalid_magento_mode() {
        let result = Settings::from_store(&store(&[("berth_magento_mode", "staging")]), "shop");
        assert!(matches!(result, Err(BerthError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_domain_overrides() {
        let settings = Settings::from_store(
            &store(&[("traefik_domain", "example.test"), ("traefik_subdomain", "")]),
            "shop",
        )
        .unwrap();
        assert_eq!(settings.full_domain(), "example.test");
    }

    #[test]
    fn test_app_home_mode_is_octal() {
        let settings =
            Settings::from_store(&store(&[("berth_install_app_home_mode", "0700")]), "shop")
                .unwrap();
        assert_eq!(settings.install.app_home_mode, 0o700);

        let result =
            Settings::from_store(&store(&[("berth_install_app_home_mode", "0999")]), "shop");
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_from_either_key() {
        let settings = Settings::from_store(&store(&[("berth_debug", "1")]), "shop").unwrap();
        assert!(settings.debug);
    }

    #[test]
    fn test_parse_bool_spellings() {
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool("2"), None);
    }
}
