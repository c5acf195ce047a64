use chrono::Utc;

use crate::exec::PHP_SERVICE;
use crate::plan::{ProvisioningPlan, Step};
use crate::template::TemplateContext;
use crate::version::PlatformVersion;

use super::{ADMIN_EMAIL, ADMIN_USER, Resolver};

const PARALLEL_PLUGIN: &str = "hirak/prestissimo";
const MAGERUN: &str = "/usr/bin/n98-magerun";

pub(super) fn plan(resolver: &Resolver<'_>, version: &PlatformVersion) -> ProvisioningPlan {
    let settings = resolver.settings;
    let bootstrap = &settings.bootstrap;

    let mut plan = ProvisioningPlan::new();
    resolver.prelude(
        &mut plan,
        format!("Would you like to bootstrap Magento v{version}?"),
    );

    // Magento 1 projects only use composer when they ship a composer.json
    if resolver.facts.has_composer_json && !bootstrap.skip_composer_install {
        let parallel = resolver.parallel_downloads();
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

    let context = TemplateContext::new()
        .with("install_date", Utc::now().to_rfc2822())
        .with("crypt_key", resolver.credentials.crypt_key.as_str())
        .with("db_prefix", bootstrap.db_prefix.as_str())
        .with("redis", settings.services.redis)
        .with("backend_frontname", bootstrap.backend_frontname.as_str());
    plan.push(Step::render(
        "app/etc/local.xml",
        &["magento1/local.xml"],
        resolver.facts.root.join("app").join("etc").join("local.xml"),
        context,
    ));

    let full_domain = settings.full_domain();
    for args in [
        format!("web/unsecure/base_url http://{full_domain}/"),
        format!("web/secure/base_url https://{full_domain}/"),
        "web/secure/use_in_frontend 1".to_string(),
        "web/secure/use_in_adminhtml 1".to_string(),
    ] {
        plan.exec_in(
            PHP_SERVICE,
            "Configure store",
            format!("{MAGERUN} config:set {args}"),
        );
    }

    let password = &resolver.credentials.admin_password;
    plan.exec_in_masked(
        PHP_SERVICE,
        "Create admin user",
        format!("{MAGERUN} admin:user:create {ADMIN_USER} {ADMIN_EMAIL} {password} Local Admin"),
        password,
    );
    plan.exec_in(PHP_SERVICE, "Flush cache", format!("{MAGERUN} cache:flush"));

    plan.add_summary(format!("Base Url: https://{full_domain}"));
    plan.add_summary(format!(
        "Backend Url: https://{full_domain}/{}",
        bootstrap.backend_frontname
    ));
    plan.add_summary(format!("Admin user: {ADMIN_USER}"));
    plan.add_summary(format!("Admin password: {password}"));
    plan
}

#[cfg(test)]
mod tests {
    use super::super::testing::{credentials, facts, settings};
    use super::*;
    use crate::plan::StepKind;
    use crate::plan::resolver::ProjectFacts;
    use crate::target::PlatformKind;

    fn resolve(pairs: &[(&str, &str)], facts: &ProjectFacts) -> ProvisioningPlan {
        let settings = settings(pairs);
        let credentials = credentials();
        Resolver::new(&settings, facts, &credentials)
            .resolve(
                PlatformKind::Magento1,
                Some(&PlatformVersion::parse("1.9.4.5").unwrap()),
            )
            .unwrap()
    }

    #[test]
    fn test_composer_only_with_composer_json() {
        let lines = resolve(&[], &facts()).command_lines();
        assert!(!lines.iter().any(|l| l.starts_with("composer")));

        let facts = ProjectFacts {
            has_composer_json: true,
            ..facts()
        };
        let lines = resolve(&[], &facts).command_lines();
        assert_eq!(
            &lines[..3],
            &[
                "composer global require --verbose --profile hirak/prestissimo".to_string(),
                "composer install -v --profile".to_string(),
                "composer global remove hirak/prestissimo --verbose --profile".to_string(),
            ]
        );
    }

    #[test]
    fn test_renders_local_xml_before_magerun() {
        let plan = resolve(&[("berth_redis", "1"), ("berth_db_prefix", "mg_")], &facts());
        let render = plan
            .steps()
            .iter()
            .position(|s| matches!(s.kind, StepKind::RenderTemplate { .. }))
            .unwrap();
        let first_magerun = plan
            .steps()
            .iter()
            .position(|s| s.to_string().contains("n98-magerun"))
            .unwrap();
        assert!(render < first_magerun);

        match &plan.steps()[render].kind {
            StepKind::RenderTemplate {
                templates,
                target,
                context,
            } => {
                assert_eq!(templates, &["magento1/local.xml".to_string()]);
                assert!(target.ends_with("app/etc/local.xml"));
                assert_eq!(context.get("db_prefix").unwrap(), "mg_");
                assert_eq!(context.get("redis").unwrap(), true);
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn test_debug_verbosity_removes_plugin_with_debug_flag() {
        let settings = settings(&[]);
        let facts = ProjectFacts {
            has_composer_json: true,
            ..facts()
        };
        let credentials = credentials();
        let lines = Resolver::new(&settings, &facts, &credentials)
            .with_verbosity(crate::exec::Verbosity::Debug)
            .resolve(
                PlatformKind::Magento1,
                Some(&PlatformVersion::parse("1.9.4.5").unwrap()),
            )
            .unwrap()
            .command_lines();
        assert!(lines.contains(&"composer global remove hirak/prestissimo -vvv --profile".to_string()));
    }

    #[test]
    fn test_admin_password_masked_in_step_display() {
        let plan = resolve(&[], &facts());
        let shown: Vec<String> = plan.steps().iter().map(|s| s.to_string()).collect();
        assert!(shown.iter().any(|l| l.contains("admin:user:create localadmin admin@example.com ********")));
        assert!(!shown.iter().any(|l| l.contains("s3cretPassw0rdXy")));
    }

    #[test]
    fn test_magerun_commands() {
        let lines = resolve(&[], &facts()).command_lines();
        assert_eq!(
            lines,
            vec![
                "/usr/bin/n98-magerun config:set web/unsecure/base_url http://app.shop.test/",
                "/usr/bin/n98-magerun config:set web/secure/base_url https://app.shop.test/",
                "/usr/bin/n98-magerun config:set web/secure/use_in_frontend 1",
                "/usr/bin/n98-magerun config:set web/secure/use_in_adminhtml 1",
                "/usr/bin/n98-magerun admin:user:create localadmin admin@example.com s3cretPassw0rdXy Local Admin",
                "/usr/bin/n98-magerun cache:flush",
            ]
        );
    }
}
