// Shared test helpers

#![allow(dead_code)]

use statsmon::models::ContainerSnapshot;
use statsmon::table::Document;

pub const TABLE_ID: &str = "stats";

pub const MIB: f64 = 1024.0 * 1024.0;

pub fn empty_document() -> Document {
    Document::with_table_body(TABLE_ID)
}

/// Snapshot carrying only a wire name.
pub fn named(name: &str) -> ContainerSnapshot {
    ContainerSnapshot {
        name: Some(name.into()),
        ..Default::default()
    }
}

/// Snapshot with every field set.
pub fn full_snapshot(name: &str, cpu: f64) -> ContainerSnapshot {
    ContainerSnapshot {
        id: Some(format!("{}-id", name.trim_start_matches('/'))),
        name: Some(name.into()),
        cpu_percent: Some(cpu),
        memory_used_bytes: Some(MIB),
        memory_limit_bytes: Some(2.0 * MIB),
        memory_percent: Some(50.0),
        net_in_bytes: Some(0.0),
        net_out_bytes: Some(0.0),
        block_in_bytes: Some(0.0),
        block_out_bytes: Some(0.0),
    }
}

/// The batch the producer sends for a single container named `web`.
pub const WEB_BATCH: &str = r#"[{"name":"/web","cpu":5.5,"memory":1048576,"memoryLimit":2097152,"memoryPercent":50.0,"netIn":0,"netOut":0,"blockIn":0,"blockOut":0}]"#;

pub fn config_toml(origin: &str, reconnect: bool) -> String {
    format!(
        r#"
[monitor]
origin = "{origin}"
table_id = "{TABLE_ID}"
resolve_timeout_ms = 2000
stats_log_interval_secs = 60

[reconnect]
enabled = {reconnect}
initial_delay_ms = 20
max_delay_ms = 100
multiplier = 2.0

[display]
clear_screen = false
stale_after_secs = 0
"#
    )
}
