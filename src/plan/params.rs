//! `setup:install` parameters
//!
//! Each optional backing service contributes one block. Blocks are always
//! appended in this order, whatever order the flags were read in:
//!
//! 1. base (admin path, database)
//! 2. table prefix, when set
//! 3. cache: redis for session, cache and page cache, or file sessions
//! 4. full-page cache: varnish
//! 5. message queue: rabbitmq
//! 6. search engine: elasticsearch

use crate::config::Settings;

/// Version-dependent behaviour, decided once per resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Gates {
    /// Use Composer 2 instead of Composer 1
    pub composer2: bool,
    /// Elasticsearch parameters and configuration are supported
    pub search_engine: bool,
    /// `--consumers-wait-for-messages` is supported
    pub consumers_wait: bool,
    /// The two-factor auth module exists and may be disabled
    pub tfa: bool,
}

pub fn install_params(settings: &Settings, gates: Gates) -> Vec<String> {
    let bootstrap = &settings.bootstrap;
    let services = settings.services;

    let mut params = vec![
        format!("--backend-frontname={}", bootstrap.backend_frontname),
        "--db-host=db".to_string(),
        "--db-name=magento".to_string(),
        "--db-user=magento".to_string(),
        "--db-password=magento".to_string(),
    ];

    if !bootstrap.db_prefix.is_empty() {
        params.push(format!("--db-prefix={}", bootstrap.db_prefix));
    }

    if services.redis {
        params.extend(owned(&[
            "--session-save=redis",
            "--session-save-redis-host=redis",
            "--session-save-redis-port=6379",
            "--session-save-redis-db=2",
            "--session-save-redis-max-concurrency=20",
            "--cache-backend=redis",
            "--cache-backend-redis-server=redis",
            "--cache-backend-redis-db=0",
            "--cache-backend-redis-port=6379",
            "--page-cache=redis",
            "--page-cache-redis-server=redis",
            "--page-cache-redis-db=1",
            "--page-cache-redis-port=6379",
        ]));
    } else {
        params.push("--session-save=files".to_string());
    }

    if services.varnish {
        params.push("--http-cache-hosts=varnish:80".to_string());
    }

    if services.rabbitmq {
        params.extend(owned(&[
            "--amqp-host=rabbitmq",
            "--amqp-port=5672",
            "--amqp-user=guest",
            "--amqp-password=guest",
        ]));
        if gates.consumers_wait {
            params.push("--consumers-wait-for-messages=0".to_string());
        }
    }

    if services.elasticsearch && gates.search_engine {
        params.extend(owned(&[
            "--search-engine=elasticsearch7",
            "--elasticsearch-host=elasticsearch",
            "--elasticsearch-port=9200",
            "--elasticsearch-index-prefix=magento2",
            "--elasticsearch-enable-auth=0",
            "--elasticsearch-timeout=15",
        ]));
    }

    params
}

/// `config:set` arguments pointing the search configuration at elasticsearch
pub fn search_config() -> Vec<String> {
    owned(&[
        "--lock-env catalog/search/engine elasticsearch7",
        "--lock-env catalog/search/elasticsearch7_server_hostname elasticsearch",
        "--lock-env catalog/search/elasticsearch7_server_port 9200",
        "--lock-env catalog/search/elasticsearch7_index_prefix magento2",
        "--lock-env catalog/search/elasticsearch7_enable_auth 0",
        "--lock-env catalog/search/elasticsearch7_server_timeout 15",
    ])
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
