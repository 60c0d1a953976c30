//! Prometheus exposition of the cached snapshot.
//!
//! Scrapes never touch Jenkins. The metric families are a fixed table;
//! [`materialize`] maps a snapshot and the health flag to points, and
//! [`encode`] renders those points in the text exposition format through a
//! registry built for the scrape.

use crate::cache::{HealthStatus, Snapshot, SnapshotCache};

use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};

/// A metric family exported by the exporter.
#[derive(Debug, PartialEq, Eq)]
pub struct MetricDef {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

pub const UP: MetricDef = MetricDef {
    name: "jenkins_up",
    help: "Could the Jenkins server be reached.",
    labels: &[],
};

pub const JOBS: MetricDef = MetricDef {
    name: "jenkins_jobs_stats",
    help: "Jobs count.",
    labels: &[],
};

pub const QUEUE: MetricDef = MetricDef {
    name: "jenkins_queue",
    help: "Queue items count.",
    labels: &[],
};

pub const COMPUTERS: MetricDef = MetricDef {
    name: "jenkins_computers",
    help: "Build agents count.",
    labels: &[],
};

pub const VIEWS: MetricDef = MetricDef {
    name: "jenkins_views",
    help: "Jenkins views job count.",
    labels: &["view"],
};

pub const JOB_DURATION: MetricDef = MetricDef {
    name: "jenkins_job_duration",
    help: "Duration of the last successful build in milliseconds.",
    labels: &["job", "branch"],
};

pub const JNLP_AGENTS: MetricDef = MetricDef {
    name: "jenkins_jnlp_agents",
    help: "Jenkins JNLP agents by state.",
    labels: &["state"],
};

/// Every exported family, in exposition order.
pub const METRICS: [&MetricDef; 7] = [
    &UP,
    &JOBS,
    &QUEUE,
    &COMPUTERS,
    &VIEWS,
    &JOB_DURATION,
    &JNLP_AGENTS,
];

/// One sample of a metric family.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub def: &'static MetricDef,
    pub labels: Vec<String>,
    pub value: f64,
}

impl MetricPoint {
    fn new(def: &'static MetricDef, labels: &[&str], value: f64) -> Self {
        Self {
            def,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            value,
        }
    }
}

/// Map a snapshot and health flag to metric points. An absent snapshot
/// renders as zeros.
pub fn materialize(snapshot: Option<&Snapshot>, health: HealthStatus) -> Vec<MetricPoint> {
    let empty = Snapshot::default();
    let snapshot = snapshot.unwrap_or(&empty);
    let up = if health == HealthStatus::Ok { 1.0 } else { 0.0 };

    let mut points = vec![
        MetricPoint::new(&UP, &[], up),
        MetricPoint::new(&JOBS, &[], snapshot.job_count as f64),
        MetricPoint::new(&QUEUE, &[], snapshot.queue_depth as f64),
        MetricPoint::new(&COMPUTERS, &[], snapshot.agents.total),
    ];

    for view in &snapshot.views {
        points.push(MetricPoint::new(&VIEWS, &[view.name.as_str()], view.job_count as f64));
    }

    for d in &snapshot.job_durations {
        points.push(MetricPoint::new(
            &JOB_DURATION,
            &[d.job_name.as_str(), d.branch_name.as_str()],
            d.duration_millis as f64,
        ));
    }

    let agents = &snapshot.agents;
    for (state, value) in [
        ("idle", agents.idle),
        ("online", agents.online),
        ("offline", agents.offline),
        ("busy", agents.busy),
    ] {
        points.push(MetricPoint::new(&JNLP_AGENTS, &[state], value));
    }

    points
}

/// Render points in the Prometheus text format.
pub fn encode(points: &[MetricPoint]) -> Result<String, prometheus::Error> {
    let registry = Registry::new();

    for def in METRICS {
        let family: Vec<&MetricPoint> = points.iter().filter(|p| p.def == def).collect();
        if family.is_empty() {
            continue;
        }

        let opts = Opts::new(def.name, def.help);
        if def.labels.is_empty() {
            let gauge = Gauge::with_opts(opts)?;
            for point in family {
                gauge.set(point.value);
            }
            registry.register(Box::new(gauge))?;
        } else {
            let vec = GaugeVec::new(opts, def.labels)?;
            for point in family {
                let labels: Vec<&str> = point.labels.iter().map(String::as_str).collect();
                vec.get_metric_with_label_values(&labels)?.set(point.value);
            }
            registry.register(Box::new(vec))?;
        }
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Read the cache and render the current metrics.
pub fn render(cache: &SnapshotCache) -> Result<String, prometheus::Error> {
    let (snapshot, health) = cache.load();
    if health != HealthStatus::Ok {
        tracing::debug!("Serving metrics with health {:?}", health);
    }
    encode(&materialize(snapshot.as_deref(), health))
}

/// Content type of the text exposition format.
pub fn content_type() -> String {
    TextEncoder::new().format_type().to_string()
}
