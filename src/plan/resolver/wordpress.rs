use crate::exec::PHP_SERVICE;
use crate::plan::{ProvisioningPlan, Step};
use crate::template::TemplateContext;

use super::Resolver;

const DOWNLOAD_URL: &str = "https://wordpress.org/latest.tar.gz";
const ARCHIVE: &str = "/tmp/wordpress.tar.gz";
const DEFAULT_TABLE_PREFIX: &str = "wp_";

pub(super) fn plan(resolver: &Resolver<'_>) -> ProvisioningPlan {
    let settings = resolver.settings;

    let mut plan = ProvisioningPlan::new();
    resolver.prelude(&mut plan, "Would you like to bootstrap Wordpress?".to_string());

    if !resolver.facts.has_index_php {
        plan.exec_in(
            PHP_SERVICE,
            "Download WordPress",
            format!("wget -qO {ARCHIVE} {DOWNLOAD_URL}"),
        );
        plan.exec_in(
            PHP_SERVICE,
            "Extract WordPress",
            format!("tar -zxf {ARCHIVE} --strip-components=1 -C /var/www/html"),
        );
        plan.exec_in(PHP_SERVICE, "Remove archive", format!("rm -f {ARCHIVE}"));
    }

    let table_prefix = match settings.bootstrap.db_prefix.as_str() {
        "" => DEFAULT_TABLE_PREFIX,
        prefix => prefix,
    };
    let base_url = format!("https://{}", settings.full_domain());
    let context = TemplateContext::new()
        .with(
            "salts",
            resolver
                .credentials
                .salts
                .iter()
                .map(|(name, salt)| (name.as_str(), salt.as_str()))
                .collect::<serde_json::Value>(),
        )
        .with("table_prefix", table_prefix)
        .with("base_url", base_url.as_str())
        .with("debug", settings.debug);
    plan.push(Step::render(
        "wp-config.php",
        &["wordpress/wp-config.php"],
        resolver.facts.root.join("wp-config.php"),
        context,
    ));

    plan.add_summary(format!("Base Url: {base_url}"));
    plan
}
