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

    let server = ctx.create_param_server(&args.node).build()?;

    if let Some(path) = args.params {
        let params = yaml::load_from_yaml(&path)?;
        server.set_parameters(params)?;
        println!(
            "[SERVER] Loaded {} parameters from {:?}",
            server.parameter_count(),
            path
        );
    }

    println!(
        "[SERVER] Parameter server '{}' running. Press Ctrl+C to stop.",
        server.node_id()
    );
    loop {
        thread::sleep(Duration::from_millis(500));
    }
}

use clap::Parser;
#[derive(Debug, Parser)]
struct Args {
    /// Node identity this server answers for
    #[arg(short, long, default_value = "robot1")]
    node: String,
    /// YAML parameter file to seed the store with
    #[arg(short, long)]
    params: Option<std::path::PathBuf>,
    #[arg(short, long, default_value = "0")]
    domain: usize,
    #[arg(short, long, default_value = "peer")]
    mode: String,
    #[arg(short, long)]
    endpoint: Option<String>,
}
