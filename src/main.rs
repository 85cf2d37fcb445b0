// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{anyhow, bail, Context};
use seedgraph::backends::MemorySink;
use seedgraph::config::{load_and_validate_config, DependencyGraph, PlanConfig, RuntimeBuilder};
use seedgraph::errors::GraphError;
use std::env;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

const VALIDATE_ONLY_FLAG: &str = "--validate-only";

fn init_tracing() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <plan.yaml> [{}]", args[0], VALIDATE_ONLY_FLAG);
        eprintln!("Example: {} plans/food-delivery.yaml", args[0]);
        std::process::exit(1);
    }

    let plan_path = &args[1];
    let validate_only = args[2..].iter().any(|arg| arg == VALIDATE_ONLY_FLAG);

    if let Err(e) = run(plan_path, validate_only).await {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run(plan_path: &str, validate_only: bool) -> anyhow::Result<()> {
    let plan = load_and_validate_config(plan_path)
        .with_context(|| format!("Failed to load plan '{}'", plan_path))?;

    let order = DependencyGraph::from_nodes(&plan.nodes)
        .topological_order()
        .map_err(|remaining| anyhow!("plan has unordered nodes: {:?}", remaining))?;

    println!("🌱 Seed plan: {}", plan_path);
    println!("═══════════════════════════════════");
    print_plan(&plan, &order);

    if validate_only {
        println!("\n✅ Plan is valid");
        return Ok(());
    }

    let sink = Arc::new(MemorySink::new());
    let executor = RuntimeBuilder::from_config(&plan, sink.clone())?;

    let started = Instant::now();
    let result = executor.run().await;
    let elapsed = started.elapsed();

    println!("\n📊 Rows written:");
    for node_id in &order {
        if let Some(node) = plan.nodes.iter().find(|n| &n.id == node_id) {
            println!("  {:<24} {:>8}", node.kind(), sink.row_count(node.kind()).await);
        }
    }
    println!("⏱️  Finished in {:?}", elapsed);

    match result {
        Ok(outcome) => {
            println!("\n✅ Seeded {} nodes, {} published ids", plan.nodes.len(), outcome.len());
            Ok(())
        }
        Err(GraphError::Failed(aggregate)) => {
            println!("\n❌ Root causes:");
            for failure in aggregate.root_causes() {
                println!("  - {}", failure);
            }
            bail!("{} of {} nodes failed", aggregate.len(), plan.nodes.len())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_plan(plan: &PlanConfig, order: &[String]) {
    println!("Failure strategy: {:?}", plan.failure_strategy);
    println!(
        "Retry: {} attempts, {:?} backoff",
        plan.retry.get_attempts(),
        plan.retry.get_backoff()
    );
    println!("Nodes (dependency order):");
    for node_id in order {
        if let Some(node) = plan.nodes.iter().find(|n| &n.id == node_id) {
            if node.depends_on.is_empty() {
                println!("  • {}", node.id);
            } else {
                println!("  • {} ← {}", node.id, node.depends_on.join(", "));
            }
        }
    }
}
