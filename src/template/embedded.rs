//! Templates compiled into the binary

/// `(name, content)` of every embedded template
pub const ALL_TEMPLATES: &[(&str, &str)] = &[
    (
        "config/berth.yml",
        include_str!("../../templates/config/berth.yml"),
    ),
    (
        "services/docker-compose.yml",
        include_str!("../../templates/services/docker-compose.yml"),
    ),
    (
        "magento1/local.xml",
        include_str!("../../templates/magento1/local.xml"),
    ),
    (
        "wordpress/wp-config.php",
        include_str!("../../templates/wordpress/wp-config.php"),
    ),
];
