use std::{thread, time::Duration};

use param_z::{Builder, Result, context::ZContextBuilder, parameter::yaml};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut builder = ZContextBuilder::default()
        .with_domain_id(args.domain)
        .with_mode(args.mode);
    if let Some(e) = args.endpoint {
        builder = builder.with_connect_endpoints([e]);
    }
    let ctx = builder.build()?;

    let client = ctx
        .create_param_client()
        .with_event_callback(|event| {
            println!("[PARAM_EVENT] From node: {}", event.node_id);
            for p in &event.new {
                println!("  NEW: {}", p.name);
            }
            for p in &event.changed {
                println!("  CHANGED: {}", p.name);
            }
            for p in &event.deleted {
                println!("  DELETED: {}", p.name);
            }
        })
        .build()?;

    let timeout = Duration::from_secs(5);
    println!("[CLIENT] Connecting to '{}'", args.target);

    // Give discovery a moment when running across processes.
    thread::sleep(Duration::from_secs(2));

    println!("\n=== LIST PARAMETERS ===");
    let names = client.list_parameters(&args.target, &[], 0, timeout)?;
    println!("[LIST] Found {} parameters on {}:", names.len(), args.target);
    for name in &names {
        println!("  - {}", name);
    }

    println!("\n=== GET PARAMETERS ===");
    if !names.is_empty() {
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let fetched = client.get_parameters(&args.target, &name_refs, timeout)?;
        println!("[GET] Retrieved {} parameters:", fetched.len());
        for p in &fetched {
            println!("  {} = {}", p.name, p.value.kind());
        }
    }

    if let Some(path) = args.params {
        println!("\n=== SET PARAMETERS ===");
        let params = yaml::load_from_yaml(&path)?;
        println!("[CLIENT] Loaded {} parameters to send", params.len());
        let results = client.set_parameters(&args.target, &params, timeout)?;
        for (i, result) in results.iter().enumerate() {
            let status = if result.successful { "SUCCESS" } else { "FAILED" };
            if result.reason.is_empty() {
                println!("  Result[{}]: {}", i, status);
            } else {
                println!("  Result[{}]: {} - {}", i, status, result.reason);
            }
        }
    }

    // Keep running to receive ParameterEvent broadcasts.
    println!("\n[CLIENT] Listening for parameter events. Press Ctrl+C to stop.");
    loop {
        thread::sleep(Duration::from_millis(500));
    }
}

use clap::Parser;
#[derive(Debug, Parser)]
struct Args {
    /// Node identity to address requests to
    #[arg(short, long, default_value = "robot1")]
    target: String,
    /// YAML parameter file to set on the target
    #[arg(short, long)]
    params: Option<std::path::PathBuf>,
    #[arg(short, long, default_value = "0")]
    domain: usize,
    #[arg(short, long, default_value = "peer")]
    mode: String,
    #[arg(short, long)]
    endpoint: Option<String>,
}
