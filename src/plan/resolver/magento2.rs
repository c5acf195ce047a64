use crate::error::{Result, config as config_error};
use crate::exec::PHP_SERVICE;
use crate::plan::ProvisioningPlan;
use crate::plan::params::{Gates, install_params, search_config};
use crate::version::{PlatformVersion, VersionConstraint};

use super::{ADMIN_EMAIL, ADMIN_USER, Resolver};

const PARALLEL_PLUGIN: &str = "hirak/prestissimo";
const STAGING_DIR: &str = "/tmp/magento-tmp/";
const DOCUMENT_ROOT: &str = "/var/www/html/";

/// Decide the version-dependent behaviour for one plan
///
/// Composer 2 is used from platform 2.4.2 on, or whenever the configured
/// composer version is 2.0.0 or newer. Patch releases such as `2.4.1-p1`
/// count as newer than their base release.
pub fn gates(version: &PlatformVersion, composer_version: Option<&str>) -> Result<Gates> {
    let composer2_by_setting = match composer_version {
        Some(text) => VersionConstraint::at_least(2, 0, 0).matches(
            &PlatformVersion::parse(text).map_err(|_| {
                config_error::invalid(
                    "composer_version",
                    text,
                    "expected a version such as 1.10.22 or 2.1.6",
                )
            })?,
        ),
        None => false,
    };
    let modern = VersionConstraint::at_least(2, 4, 1).matches(version);

    Ok(Gates {
        composer2: VersionConstraint::at_least(2, 4, 2).matches(version) || composer2_by_setting,
        search_engine: modern,
        consumers_wait: modern,
        tfa: modern,
    })
}

pub(super) fn plan(resolver: &Resolver<'_>, version: &PlatformVersion) -> Result<ProvisioningPlan> {
    let settings = resolver.settings;
    let bootstrap = &settings.bootstrap;
    let gates = gates(version, settings.composer_version.as_deref())?;
    tracing::debug!(%version, ?gates, "Magento 2 gates");

    let fresh_install = !resolver.facts.has_composer_json;
    let parallel = resolver.parallel_downloads() && !gates.composer2;

    let mut plan = ProvisioningPlan::new();
    resolver.prelude(
        &mut plan,
        format!("Would you like to bootstrap Magento v{version}?"),
    );

    if gates.composer2 {
        plan.exec_in(
            PHP_SERVICE,
            "Select Composer 2",
            "sudo alternatives --set composer /usr/bin/composer2",
        );
    }

    if !bootstrap.skip_composer_install {
        if parallel {
            plan.exec_in(
                PHP_SERVICE,
                "Enable parallel downloads",
                format!(
                    "composer global require {} --profile {PARALLEL_PLUGIN}",
                    resolver.pick("--verbose", "-vvv")
                ),
            );
        }

        if fresh_install {
            let edition = bootstrap.magento_edition.as_str();
            plan.exec_in(
                PHP_SERVICE,
                "Create project",
                format!(
                    "composer create-project {} --profile --no-install \
                     --repository-url=https://repo.magento.com/ \
                     magento/project-{edition}-edition={version} {STAGING_DIR}",
                    resolver.pick("--verbose", "-vvv")
                ),
            );
            plan.exec_in(
                PHP_SERVICE,
                "Move project into place",
                format!(
                    "rsync {} --remove-source-files --chmod=D2775,F644 {STAGING_DIR} {DOCUMENT_ROOT}",
                    resolver.pick("-au", "-vau")
                ),
            );
        }

        plan.exec_in(
            PHP_SERVICE,
            "Install dependencies",
            format!("composer install {} --profile", resolver.pick("-v", "-vvv")),
        );

        if parallel {
            plan.exec_in(
                PHP_SERVICE,
                "Disable parallel downloads",
                format!(
                    "composer global remove {PARALLEL_PLUGIN} {} --profile",
                    resolver.pick("--verbose", "-vvv")
                ),
            );
        }
    }

    plan.exec_in(
        PHP_SERVICE,
        "Install Magento",
        format!("bin/magento setup:install {}", install_params(settings, gates).join(" ")),
    );

    let full_domain = settings.full_domain();
    let mut config: Vec<String> = vec![
        format!("web/unsecure/base_url http://{full_domain}/"),
        format!("web/secure/base_url https://{full_domain}/"),
        "--lock-env web/secure/offloader_header X-Forwarded-Proto".to_string(),
        "web/secure/use_in_frontend 1".to_string(),
        "web/secure/use_in_adminhtml 1".to_string(),
        "web/seo/use_rewrites 1".to_string(),
    ];
    if settings.services.varnish {
        config.push("--lock-env system/full_page_cache/caching_application 2".to_string());
        config.push("--lock-env system/full_page_cache/ttl 604800".to_string());
    }
    config.push("--lock-env catalog/search/enable_eav_indexer 1".to_string());
    if settings.services.elasticsearch && gates.search_engine {
        config.extend(search_config());
    }
    for args in config {
        plan.exec_in(
            PHP_SERVICE,
            "Configure store",
            format!("bin/magento config:set {args}"),
        );
    }

    plan.exec_in(
        PHP_SERVICE,
        "Set deploy mode",
        format!(
            "bin/magento deploy:mode:set -s {}",
            bootstrap.magento_mode.as_str()
        ),
    );

    if bootstrap.disable_tfa && gates.tfa {
        plan.exec_in(
            PHP_SERVICE,
            "Disable two-factor auth",
            "bin/magento module:disable Magento_TwoFactorAuth",
        );
    }

    let password = &resolver.credentials.admin_password;
    plan.exec_in_masked(
        PHP_SERVICE,
        "Create admin user",
        format!(
            "bin/magento admin:user:create --admin-password={password} --admin-user={ADMIN_USER} \
             --admin-firstname=Local --admin-lastname=Admin --admin-email=\"{ADMIN_EMAIL}\""
        ),
        password,
    );

    if fresh_install && (bootstrap.with_sample_data || bootstrap.full) {
        plan.exec_in(
            PHP_SERVICE,
            "Copy composer credentials",
            "mkdir -p /var/www/html/var/composer_home/ \
             && cp -va ~/.composer/auth.json /var/www/html/var/composer_home/auth.json",
        );
        plan.exec_in(
            PHP_SERVICE,
            "Deploy sample data",
            format!("php bin/magento {} sampledata:deploy", resolver.pick("-v", "-vvv")),
        );
        plan.exec_in(
            PHP_SERVICE,
            "Upgrade schema",
            format!("bin/magento setup:upgrade {}", resolver.pick("-v", "-vvv")),
        );
    }

    if bootstrap.full {
        plan.exec_in(PHP_SERVICE, "Reindex", "bin/magento indexer:reindex");
    }

    if bootstrap.reset_admin_url {
        plan.exec_in(
            PHP_SERVICE,
            "Reset admin URL",
            "bin/magento config:set admin/url/use_custom 0",
        );
        plan.exec_in(
            PHP_SERVICE,
            "Reset admin URL",
            "bin/magento config:set admin/url/use_custom_path 0",
        );
    }

    plan.exec_in(PHP_SERVICE, "Flush cache", "bin/magento cache:flush");

    plan.add_summary(format!("Base Url: https://{full_domain}"));
    plan.add_summary(format!(
        "Backend Url: https://{full_domain}/{}",
        bootstrap.backend_frontname
    ));
    plan.add_summary(format!("Admin user: {ADMIN_USER}"));
    plan.add_summary(format!("Admin password: {password}"));

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::super::testing::{credentials, facts, settings};
    use super::*;
    use crate::exec::Verbosity;
    use crate::plan::resolver::ProjectFacts;
    use crate::plan::{StepKind, TrustAction};

    fn v(text: &str) -> PlatformVersion {
        PlatformVersion::parse(text).unwrap()
    }

    fn resolve(pairs: &[(&str, &str)], version: &str, facts: &ProjectFacts) -> ProvisioningPlan {
        let settings = settings(pairs);
        let credentials = credentials();
        Resolver::new(&settings, facts, &credentials)
            .resolve(crate::target::PlatformKind::Magento2, Some(&v(version)))
            .unwrap()
    }

    fn lines(pairs: &[(&str, &str)], version: &str) -> Vec<String> {
        resolve(pairs, version, &facts()).command_lines()
    }

    fn setup_install(lines: &[String]) -> &str {
        lines
            .iter()
            .find(|l| l.starts_with("bin/magento setup:install"))
            .unwrap()
    }

    #[test]
    fn test_composer_gate_boundary() {
        assert!(gates(&v("2.4.2"), None).unwrap().composer2);
        assert!(gates(&v("2.4.2-p1"), None).unwrap().composer2);
        assert!(!gates(&v("2.4.1"), None).unwrap().composer2);
        assert!(!gates(&v("2.4.1-p1"), None).unwrap().composer2);
        assert!(!gates(&v("2.4.2-beta1"), None).unwrap().composer2);
        assert!(gates(&v("2.3.7"), Some("2.1.6")).unwrap().composer2);
        assert!(!gates(&v("2.3.7"), Some("1.10.22")).unwrap().composer2);
        assert!(gates(&v("2.3.7"), Some("two")).is_err());
    }

    #[test]
    fn test_modern_gates_include_patch_releases() {
        let g = gates(&v("2.4.1"), None).unwrap();
        assert!(g.search_engine && g.consumers_wait && g.tfa);
        let g = gates(&v("2.3.7-p1"), None).unwrap();
        assert!(!g.search_engine && !g.consumers_wait && !g.tfa);
    }

    #[test]
    fn test_242_selects_composer_two_without_parallel_plugin() {
        let lines = lines(&[], "2.4.2");
        assert!(lines.contains(&"sudo alternatives --set composer /usr/bin/composer2".to_string()));
        assert!(!lines.iter().any(|l| l.contains(PARALLEL_PLUGIN)));
    }

    #[test]
    fn test_composer_one_wraps_install_with_parallel_plugin() {
        let lines = lines(&[], "2.3.7");
        let require = lines
            .iter()
            .position(|l| l.starts_with("composer global require"))
            .unwrap();
        let install = lines.iter().position(|l| l.starts_with("composer install")).unwrap();
        let remove = lines
            .iter()
            .position(|l| l.starts_with("composer global remove"))
            .unwrap();
        assert!(require < install && install < remove);
        assert!(!lines.iter().any(|l| l.contains("alternatives")));

        let no_parallel = self::lines(&[("berth_composer_no_parallel", "1")], "2.3.7");
        assert!(!no_parallel.iter().any(|l| l.contains(PARALLEL_PLUGIN)));
    }

    #[test]
    fn test_242_elasticsearch_block() {
        let lines = lines(&[("berth_elasticsearch", "1")], "2.4.2");
        let install = setup_install(&lines);
        let engine = install.find("--search-engine=elasticsearch7").unwrap();
        let host = install.find("--elasticsearch-host=elasticsearch").unwrap();
        let port = install.find("--elasticsearch-port=9200").unwrap();
        assert!(engine < host && host < port);

        assert!(lines.contains(
            &"bin/magento config:set --lock-env catalog/search/engine elasticsearch7".to_string()
        ));
    }

    #[test]
    fn test_230_rabbitmq_omits_consumers_wait() {
        let lines = lines(&[("berth_rabbitmq", "1")], "2.3.0");
        let install = setup_install(&lines);
        assert!(install.contains("--amqp-host=rabbitmq"));
        assert!(!install.contains("--consumers-wait-for-messages"));

        let newer = self::lines(&[("berth_rabbitmq", "1")], "2.4.3");
        assert!(setup_install(&newer).contains("--consumers-wait-for-messages=0"));
    }

    #[test]
    fn test_fresh_install_creates_project_and_deploys_sample_data() {
        let lines = lines(&[("berth_with_sampledata", "1")], "2.4.3");
        assert!(lines.iter().any(|l| l.starts_with(
            "composer create-project --verbose --profile --no-install \
             --repository-url=https://repo.magento.com/ magento/project-community-edition=2.4.3 /tmp/magento-tmp/"
        )));
        assert!(lines.contains(
            &"rsync -au --remove-source-files --chmod=D2775,F644 /tmp/magento-tmp/ /var/www/html/"
                .to_string()
        ));
        assert!(lines.contains(&"php bin/magento -v sampledata:deploy".to_string()));
        assert!(lines.contains(&"bin/magento setup:upgrade -v".to_string()));
    }

    #[test]
    fn test_existing_project_skips_create_project_and_sample_data() {
        let facts = ProjectFacts {
            has_composer_json: true,
            ..facts()
        };
        let lines = resolve(&[("berth_full_bootstrap", "1")], "2.4.3", &facts).command_lines();
        assert!(!lines.iter().any(|l| l.contains("create-project")));
        assert!(!lines.iter().any(|l| l.contains("sampledata:deploy")));
        assert!(lines.contains(&"bin/magento indexer:reindex".to_string()));
    }

    #[test]
    fn test_skip_composer_install_keeps_consumers() {
        let lines = lines(&[("berth_skip_composer_install", "1")], "2.4.3");
        assert!(!lines.iter().any(|l| l.starts_with("composer ")));
        assert!(!lines.iter().any(|l| l.starts_with("rsync")));
        assert!(lines.iter().any(|l| l.starts_with("bin/magento setup:install")));
        assert_eq!(lines.last().unwrap(), "bin/magento cache:flush");
    }

    #[test]
    fn test_debug_verbosity_changes_flags_only() {
        let settings = settings(&[]);
        let facts = facts();
        let credentials = credentials();
        let normal = Resolver::new(&settings, &facts, &credentials)
            .resolve(crate::target::PlatformKind::Magento2, Some(&v("2.3.7")))
            .unwrap();
        let debug = Resolver::new(&settings, &facts, &credentials)
            .with_verbosity(Verbosity::Debug)
            .resolve(crate::target::PlatformKind::Magento2, Some(&v("2.3.7")))
            .unwrap();

        assert_eq!(normal.len(), debug.len());
        assert!(debug.command_lines().contains(&"composer install -vvv --profile".to_string()));
        assert!(debug.command_lines().iter().any(|l| l.starts_with("rsync -vau ")));
        assert!(debug.command_lines().contains(&format!(
            "composer global remove {PARALLEL_PLUGIN} -vvv --profile"
        )));
        assert!(normal.command_lines().contains(&format!(
            "composer global remove {PARALLEL_PLUGIN} --verbose --profile"
        )));
    }

    #[test]
    fn test_store_configuration_order() {
        let lines = lines(&[("berth_varnish", "1")], "2.4.3");
        let config: Vec<&str> = lines
            .iter()
            .filter_map(|l| l.strip_prefix("bin/magento config:set "))
            .collect();
        assert_eq!(
            config,
            vec![
                "web/unsecure/base_url http://app.shop.test/",
                "web/secure/base_url https://app.shop.test/",
                "--lock-env web/secure/offloader_header X-Forwarded-Proto",
                "web/secure/use_in_frontend 1",
                "web/secure/use_in_adminhtml 1",
                "web/seo/use_rewrites 1",
                "--lock-env system/full_page_cache/caching_application 2",
                "--lock-env system/full_page_cache/ttl 604800",
                "--lock-env catalog/search/enable_eav_indexer 1",
            ]
        );
    }

    #[test]
    fn test_admin_user_tfa_and_summary() {
        let plan = resolve(
            &[("berth_magento_disable_tfa", "1"), ("berth_reset_admin_url", "1")],
            "2.4.3",
            &facts(),
        );
        let lines = plan.command_lines();
        let tfa = lines
            .iter()
            .position(|l| l == "bin/magento module:disable Magento_TwoFactorAuth")
            .unwrap();
        let admin = lines
            .iter()
            .position(|l| l.starts_with("bin/magento admin:user:create"))
            .unwrap();
        assert!(tfa < admin);
        assert!(lines[admin].contains("--admin-password=s3cretPassw0rdXy --admin-user=localadmin"));
        assert!(lines.contains(&"bin/magento config:set admin/url/use_custom_path 0".to_string()));

        assert_eq!(
            plan.summary(),
            &[
                "Base Url: https://app.shop.test".to_string(),
                "Backend Url: https://app.shop.test/admin".to_string(),
                "Admin user: localadmin".to_string(),
                "Admin password: s3cretPassw0rdXy".to_string(),
            ]
        );
    }

    #[test]
    fn test_admin_password_masked_in_step_display() {
        let plan = resolve(&[], "2.4.3", &facts());
        let step = plan
            .steps()
            .iter()
            .find(|s| s.label == "Create admin user")
            .unwrap();
        let shown = step.to_string();
        assert!(shown.contains("--admin-password=******** --admin-user=localadmin"));
        assert!(!shown.contains("s3cretPassw0rdXy"));
    }

    #[test]
    fn test_certificate_step_signs_base_domain() {
        let plan = resolve(&[("traefik_domain", "store.test")], "2.4.3", &facts());
        let hostnames = plan
            .steps()
            .iter()
            .find_map(|s| match &s.kind {
                StepKind::ProvisionTrust(TrustAction::IssueCertificate { hostnames }) => {
                    Some(hostnames.clone())
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(hostnames, vec!["store.test".to_string()]);
    }
}
