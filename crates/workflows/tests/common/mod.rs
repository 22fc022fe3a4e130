#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use devnet_topology::DevnetConfig;
use devnet_transport_memory::MemoryTransport;
use devnet_workflows::{WorkflowContext, WorkflowSettings};
use tempfile::TempDir;

pub const SIGNER_DUMP: &str = r#"[
    {"address":"0xaaaa","priv_key":"0x1111","pub_key":"0x04aa"},
    {"address":"0xbbbb","priv_key":"0x2222","pub_key":"0x04bb"},
    {"address":"0xcccc","priv_key":"0x3333","pub_key":"0x04cc"}
]"#;

pub const CONTRACT_ADDRESSES: &str = r#"{
    "root": {
        "StakeManagerProxy": "0x5e3e",
        "tokens": {"MaticToken": "0x4b5f", "TestToken": "0x7c1e"}
    }
}"#;

/// Two bor validators and a sentry on 10.0.0.1-3.
pub fn three_node_config() -> DevnetConfig {
    config_for(&["10.0.0.1", "10.0.0.2", "10.0.0.3"], 2)
}

pub fn config_for(hosts: &[&str], validators: usize) -> DevnetConfig {
    DevnetConfig {
        devnet_bor_hosts: hosts.iter().map(ToString::to_string).collect(),
        devnet_bor_users: vec!["ubuntu".to_string(); hosts.len()],
        num_of_bor_validators: validators,
        num_of_bor_sentries: hosts.len() - validators,
        eth_host_user: "ubuntu".to_string(),
        ..DevnetConfig::default()
    }
}

pub fn fast_settings(work_dir: &TempDir) -> WorkflowSettings {
    WorkflowSettings {
        max_retries: 1,
        poll_interval: Duration::from_millis(10),
        poll_timeout: Some(Duration::from_secs(5)),
        deploy_delay: Duration::ZERO,
        restart_settle_delay: Duration::ZERO,
        work_dir: work_dir.path().to_path_buf(),
        ..WorkflowSettings::default()
    }
}

pub fn context(
    config: DevnetConfig,
    transport: &MemoryTransport,
    settings: WorkflowSettings,
) -> WorkflowContext<MemoryTransport> {
    WorkflowContext::new(Arc::new(config), Arc::new(transport.clone()), settings).unwrap()
}

pub fn validator_body(signer: &str, power: u64) -> String {
    format!(r#"{{"height":"1","result":{{"ID":1,"signer":"{signer}","power":"{power}"}}}}"#)
}

pub fn validator_set_body(size: usize) -> String {
    let validators = vec![r#"{"ID":1}"#; size].join(",");
    format!(r#"{{"result":{{"validators":[{validators}]}}}}"#)
}
