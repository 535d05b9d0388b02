use std::collections::{BTreeMap, HashMap, HashSet};

use log::warn;
use serde::Deserialize;

use super::types::{Diagram, Edge, NodeCategory, Point, ServiceNode, TooltipDescriptor};
use crate::config::VisualizerConfig;
use crate::error::{Result, VisualizerError};

/// Catalog of diagrams keyed by project key.
#[derive(Clone, Debug, Default)]
pub struct DiagramRegistry {
	diagrams: BTreeMap<String, Diagram>,
}

impl DiagramRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// The diagrams shipped with the crate.
	pub fn builtin() -> Self {
		let mut registry = Self::new();
		for diagram in [lic(), ecommerce(), iot()] {
			registry.diagrams.insert(diagram.project_key.clone(), diagram);
		}
		registry
	}

	pub fn get(&self, project_key: &str) -> Option<&Diagram> {
		self.diagrams.get(project_key)
	}

	/// Adds or replaces a diagram. Node ids must be unique within it.
	pub fn insert(&mut self, diagram: Diagram) -> Result<()> {
		let mut seen = HashSet::new();
		if let Some(dup) = diagram.nodes.iter().find(|n| !seen.insert(n.id.as_str())) {
			return Err(VisualizerError::InvalidDiagram {
				key: diagram.project_key.clone(),
				reason: format!("duplicate node id '{}'", dup.id),
			});
		}
		self.diagrams.insert(diagram.project_key.clone(), diagram);
		Ok(())
	}

	/// `(key, title)` pairs sorted by key.
	pub fn projects(&self) -> impl Iterator<Item = (&str, &str)> {
		self.diagrams
			.values()
			.map(|d| (d.project_key.as_str(), d.title.as_str()))
	}

	pub fn len(&self) -> usize {
		self.diagrams.len()
	}
}

/// Read-only `node id -> descriptor` lookup used by tooltips.
#[derive(Clone, Debug, Default)]
pub struct TooltipCatalog {
	entries: HashMap<String, TooltipDescriptor>,
}

impl TooltipCatalog {
	pub fn builtin() -> Self {
		let entries = BUILTIN_TOOLTIPS
			.iter()
			.map(|(id, title, description, use_cases)| {
				(
					id.to_string(),
					TooltipDescriptor {
						title: title.to_string(),
						description: description.to_string(),
						use_cases: use_cases.iter().map(|s| s.to_string()).collect(),
					},
				)
			})
			.collect();
		Self { entries }
	}

	pub fn get(&self, node_id: &str) -> Option<&TooltipDescriptor> {
		self.entries.get(node_id)
	}

	pub fn extend(&mut self, entries: HashMap<String, TooltipDescriptor>) {
		self.entries.extend(entries);
	}
}

/// Host-supplied catalog, usually embedded in the page as JSON.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct HostCatalog {
	#[serde(default)]
	pub config: Option<VisualizerConfig>,
	#[serde(default)]
	pub diagrams: Vec<Diagram>,
	#[serde(default)]
	pub tooltips: HashMap<String, TooltipDescriptor>,
}

impl HostCatalog {
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	/// Merges this catalog over the built-in one. Invalid diagrams are
	/// logged and skipped.
	pub fn apply(
		self,
		registry: &mut DiagramRegistry,
		tooltips: &mut TooltipCatalog,
	) -> Option<VisualizerConfig> {
		for diagram in self.diagrams {
			if let Err(e) = registry.insert(diagram) {
				warn!("architecture: skipping host diagram: {}", e);
			}
		}
		tooltips.extend(self.tooltips);
		self.config
	}
}

fn node(id: &str, name: &str, x: f64, y: f64, category: NodeCategory) -> ServiceNode {
	ServiceNode {
		id: id.into(),
		display_name: name.into(),
		position: Point::new(x, y),
		icon_ref: format!("/icons/{id}.svg"),
		category,
	}
}

fn edge(from: &str, to: &str, label: &str) -> Edge {
	Edge {
		from_id: from.into(),
		to_id: to.into(),
		label: label.into(),
	}
}

fn lic() -> Diagram {
	use NodeCategory::*;
	Diagram {
		project_key: "lic".into(),
		title: "License Issuance Platform".into(),
		nodes: vec![
			node("apigw", "API Gateway", 100.0, 200.0, Gateway),
			node("cognito", "Cognito", 100.0, 70.0, Auth),
			node("lambda", "Lambda", 330.0, 200.0, Compute),
			node("dynamodb", "DynamoDB", 560.0, 90.0, Database),
			node("s3", "S3", 560.0, 310.0, Storage),
			node("sns", "SNS", 700.0, 200.0, Messaging),
			node("cloudwatch", "CloudWatch", 330.0, 340.0, Monitoring),
		],
		edges: vec![
			edge("apigw", "cognito", "authorize"),
			edge("apigw", "lambda", "invoke"),
			edge("lambda", "dynamodb", "read/write"),
			edge("lambda", "s3", "store docs"),
			edge("lambda", "sns", "notify"),
			edge("lambda", "cloudwatch", "logs"),
		],
		particles_per_edge: None,
	}
}

fn ecommerce() -> Diagram {
	use NodeCategory::*;
	Diagram {
		project_key: "ecommerce".into(),
		title: "E-commerce Storefront".into(),
		nodes: vec![
			node("cloudfront", "CloudFront", 80.0, 200.0, Cdn),
			node("alb", "Load Balancer", 240.0, 200.0, Gateway),
			node("ecs", "ECS Service", 420.0, 200.0, Compute),
			node("rds", "RDS", 620.0, 100.0, Database),
			node("sqs", "SQS", 620.0, 300.0, Messaging),
			node("assets", "Asset Bucket", 240.0, 340.0, Storage),
		],
		edges: vec![
			edge("cloudfront", "alb", "HTTPS"),
			edge("cloudfront", "assets", "static"),
			edge("alb", "ecs", "route"),
			edge("ecs", "rds", "orders"),
			edge("ecs", "sqs", "events"),
		],
		particles_per_edge: Some(4),
	}
}

fn iot() -> Diagram {
	use NodeCategory::*;
	Diagram {
		project_key: "iot".into(),
		title: "IoT Telemetry Pipeline".into(),
		nodes: vec![
			node("iotcore", "IoT Core", 90.0, 200.0, Gateway),
			node("kinesis", "Kinesis", 280.0, 200.0, Messaging),
			node("processor", "Processor", 470.0, 200.0, Compute),
			node("timestream", "Timestream", 680.0, 110.0, Database),
			node("grafana", "Grafana", 680.0, 300.0, Monitoring),
		],
		edges: vec![
			edge("iotcore", "kinesis", "telemetry"),
			edge("kinesis", "processor", "batches"),
			edge("processor", "timestream", "metrics"),
			edge("timestream", "grafana", "dashboards"),
		],
		particles_per_edge: Some(6),
	}
}

const BUILTIN_TOOLTIPS: &[(&str, &str, &str, &[&str])] = &[
	(
		"apigw",
		"API Gateway",
		"Single HTTPS entry point that validates and routes client requests.",
		&["Request throttling", "Route to Lambda"],
	),
	(
		"cognito",
		"Amazon Cognito",
		"User pools and token issuance for authenticated access.",
		&["Sign-in", "JWT validation"],
	),
	(
		"lambda",
		"AWS Lambda",
		"Stateless functions that run the license workflow.",
		&["Application intake", "Eligibility checks", "Document generation"],
	),
	(
		"dynamodb",
		"DynamoDB",
		"Key-value store for applications and license records.",
		&["License lookups", "Audit history"],
	),
	(
		"s3",
		"Amazon S3",
		"Object storage for uploaded and generated documents.",
		&["Supporting documents", "Issued certificates"],
	),
	(
		"sns",
		"Amazon SNS",
		"Fan-out notifications to applicants and reviewers.",
		&["Email alerts", "SMS reminders"],
	),
	(
		"cloudwatch",
		"CloudWatch",
		"Central logs, metrics and alarms.",
		&["Error alarms", "Latency dashboards"],
	),
	(
		"cloudfront",
		"CloudFront",
		"Edge cache in front of the storefront.",
		&["Static assets", "TLS termination"],
	),
	(
		"alb",
		"Application Load Balancer",
		"Spreads traffic over the storefront containers.",
		&["Health checks", "Path routing"],
	),
	(
		"ecs",
		"ECS Service",
		"Containerised storefront API.",
		&["Checkout", "Catalog"],
	),
	(
		"rds",
		"Amazon RDS",
		"Relational database for orders and inventory.",
		&["Orders", "Inventory"],
	),
	(
		"sqs",
		"Amazon SQS",
		"Queue decoupling order events from fulfilment.",
		&["Order events", "Retries"],
	),
	(
		"kinesis",
		"Kinesis Data Streams",
		"Ordered, replayable stream of device telemetry.",
		&["Buffering", "Replay"],
	),
	(
		"iotcore",
		"AWS IoT Core",
		"MQTT broker and device registry.",
		&["Device auth", "Message routing"],
	),
];
