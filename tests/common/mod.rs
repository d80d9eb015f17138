//! Shared fixtures for integration tests

#![allow(dead_code)]

use rmon::ResourceCatalog;
use serde_json::{json, Value};

/// Backend response covering every category, two regions and a record with
/// no region or savings
pub fn sample_response() -> Value {
    json!({
        "ec2_instances": [
            {
                "instance_id": "i-001",
                "instance_type": "t3.micro",
                "region": "us-east-1",
                "status": "running",
                "potential_cost_savings": 12.5,
                "tags": [{"Key": "Env", "Value": "Prod"}],
                "recommendations": "Downsize. See https://aws.amazon.com/ec2/pricing for details."
            },
            {
                "instance_id": "i-002",
                "instance_type": "m5.large",
                "region": "us-west-2",
                "status": "stopped",
                "potential_cost_savings": 40.0,
                "tags": [{"Key": "Env", "Value": "Dev"}, {"Key": "Team", "Value": "Data"}]
            },
            {
                "instance_id": "i-003",
                "instance_type": "t3.micro",
                "region": "us-west-2",
                "status": "running",
                "potential_cost_savings": "3.25"
            }
        ],
        "rds_instances": [
            {
                "db_instance_identifier": "orders-db",
                "db_instance_class": "db.t3.micro",
                "region": "us-east-1",
                "status": "available",
                "potential_cost_savings": 25.0,
                "tags": [{"Key": "Env", "Value": "Prod"}]
            }
        ],
        "ebs_volumes": [
            {
                "volume_id": "vol-1",
                "size": 100,
                "region": "us-east-1",
                "status": "available",
                "potential_cost_savings": 8.0
            },
            {
                "volume_id": "vol-2",
                "size": 20,
                "status": "in-use"
            }
        ],
        "rds_snapshots": [
            {
                "db_snapshot_identifier": "orders-snap",
                "region": "us-west-2",
                "potential_cost_savings": 1.5
            }
        ],
        "ec2_snapshots": [],
        "elastic_ips": [
            {
                "allocation_id": "eipalloc-1",
                "public_ip": "203.0.113.10",
                "region": "us-east-1",
                "potential_cost_savings": 3.6
            }
        ]
    })
}

pub fn sample_catalog() -> ResourceCatalog {
    ResourceCatalog::from_json(sample_response()).expect("fixture is a JSON object")
}

/// Identifiers of records, for order-sensitive assertions
pub fn ids(records: &[&rmon::ResourceRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.id.clone().unwrap_or_default())
        .collect()
}
