mod common;

use devnet_fleet::Error as FleetError;
use devnet_transport_memory::MemoryTransport;
use devnet_workflows::{Error, WorkflowState, cleanup, stop};

use common::{context, fast_settings, three_node_config};

#[tokio::test]
async fn test_cleanup_runs_stages_in_order() {
    let _ = tracing_subscriber::fmt::try_init();

    let dir = tempfile::tempdir().unwrap();
    let transport = MemoryTransport::new();
    let ctx = context(three_node_config(), &transport, fast_settings(&dir));

    let report = cleanup(&ctx).await.unwrap();

    assert_eq!(report.state, WorkflowState::Completed);
    assert_eq!(
        report.completed,
        vec![
            "stop",
            "clean",
            "start",
            "deploy-bor-contracts",
            "deploy-state-sync-contracts"
        ]
    );

    let last_stop = transport.last_seq("systemctl stop").unwrap();
    let first_clean = transport.first_seq("unsafe-reset-all").unwrap();
    let last_clean = transport.last_seq("rm -rf").unwrap();
    let first_start = transport.first_seq("systemctl start").unwrap();
    let last_start = transport.last_seq("systemctl start bor.service").unwrap();
    let deploy_bor = transport.first_seq("anvil-deployment-bor.sh").unwrap();
    let deploy_sync = transport.first_seq("anvil-deployment-sync.sh").unwrap();

    assert!(last_stop < first_clean);
    assert!(last_clean < first_start);
    assert!(last_start < deploy_bor);
    assert!(deploy_bor < deploy_sync);

    // Contract deployment only happens on the monitor node.
    for host in ["10.0.0.2", "10.0.0.3"] {
        let commands = transport.commands_for(host);
        assert!(commands.iter().all(|c| !c.contains("anvil")));
        assert!(commands.iter().any(|c| c.contains("heimdalld-setup.sh")));
    }
    let monitor = transport.commands_for("10.0.0.1");
    assert!(monitor.iter().any(|c| c.contains("anvil-stake.sh")));
}

#[tokio::test]
async fn test_failed_stop_prevents_clean() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MemoryTransport::new();
    transport.fail(Some("10.0.0.2"), "systemctl stop heimdalld");
    let ctx = context(three_node_config(), &transport, fast_settings(&dir));

    let err = cleanup(&ctx).await.unwrap_err();

    let (report, source) = match err {
        Error::StageFailed { report, source } => (report, source),
        other => panic!("unexpected error: {other}"),
    };
    assert_eq!(report.workflow, "cleanup");
    assert_eq!(report.state, WorkflowState::Failed("stop".to_string()));
    assert!(report.completed.is_empty());
    match *source {
        Error::Fleet(FleetError::FleetFailed { failed, total, .. }) => {
            assert_eq!(failed, vec![1]);
            assert_eq!(total, 3);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Every node attempted the stop, nobody moved on.
    for host in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
        assert!(
            transport
                .commands_for(host)
                .iter()
                .any(|c| c.contains("systemctl stop heimdalld"))
        );
    }
    assert!(transport.first_seq("unsafe-reset-all").is_none());
    assert!(transport.first_seq("anvil-deployment-bor.sh").is_none());
}

#[tokio::test]
async fn test_stop_only_stops() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MemoryTransport::new();
    let ctx = context(three_node_config(), &transport, fast_settings(&dir));

    let report = stop(&ctx).await.unwrap();

    assert_eq!(report.completed, vec!["stop"]);
    assert!(
        transport
            .calls()
            .iter()
            .filter_map(|call| call.command())
            .all(|c| c.contains("systemctl stop"))
    );
    assert_eq!(
        transport.commands_for("10.0.0.1"),
        vec![
            "sudo systemctl stop anvil.service || echo \"anvil not running on current machine...\"",
            "sudo systemctl stop bor.service || echo \"bor not running on current machine...\"",
            "sudo systemctl stop heimdalld.service || echo \"heimdall not running on current machine...\"",
        ]
    );
}

#[tokio::test]
async fn test_cleanup_without_monitor_makes_no_calls() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MemoryTransport::new();
    let mut config = three_node_config();
    config.devnet_type = "docker".to_string();
    config.num_of_bor_validators = 0;
    config.num_of_bor_sentries = 3;
    let ctx = context(config, &transport, fast_settings(&dir));

    assert!(matches!(cleanup(&ctx).await, Err(Error::NoMonitorNode)));
    assert!(transport.calls().is_empty());
}
