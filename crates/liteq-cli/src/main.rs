use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use liteq::{Queue, RedisConnector, StoreConfig, Task};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "liteq")]
#[command(about = "Minimal Redis-list task queue", long_about = None)]
struct Args {
    /// Store host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Store port
    #[arg(long, default_value = "6379")]
    port: u16,

    /// Database index
    #[arg(long, default_value = "0")]
    db: i64,

    /// Password, if the store requires one
    #[arg(long, env = "LITEQ_PASSWORD")]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Enqueue a JSON payload, optionally waiting for the result
    Enqueue {
        /// Queue name
        queue: String,

        /// Payload as a JSON document
        payload: String,

        /// Seconds to wait for the worker's result (0 = forever)
        #[arg(short, long)]
        wait: Option<u64>,
    },

    /// Run a worker loop that echoes payloads back as results
    Work {
        /// Queue name
        queue: String,

        /// Blocking-pop timeout per iteration, in seconds
        #[arg(short, long, default_value = "5")]
        timeout: u64,
    },

    /// Show the pending-task count for a queue
    Len {
        /// Queue name
        queue: String,
    },

    /// List all queues known to the store
    Queues,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = StoreConfig {
        host: args.host,
        port: args.port,
        db: args.db,
        password: args.password,
        ..StoreConfig::default()
    };

    match args.command {
        Commands::Enqueue {
            queue,
            payload,
            wait,
        } => enqueue(&queue, &payload, wait, config).await,
        Commands::Work { queue, timeout } => work(&queue, timeout, config).await,
        Commands::Len { queue } => len(&queue, config).await,
        Commands::Queues => queues(config).await,
    }
}

async fn connect(name: &str, config: StoreConfig) -> anyhow::Result<Queue> {
    let mut queue = Queue::new(name, config);
    if !queue.connect(&RedisConnector).await? {
        bail!("store is unreachable");
    }
    Ok(queue)
}

async fn enqueue(
    name: &str,
    payload: &str,
    wait: Option<u64>,
    config: StoreConfig,
) -> anyhow::Result<()> {
    let queue = connect(name, config).await?;

    let value: serde_json::Value =
        serde_json::from_str(payload).context("payload is not valid JSON")?;
    let mut task = Task::new(&value)?;
    let mut job = queue.enqueue(&mut task).await?;
    info!(correlation_id = %job.correlation_id(), "task enqueued");

    if let Some(timeout) = wait {
        if job.wait(timeout).await? {
            let result = job.result().await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            warn!("no result within {timeout}s");
        }
    }
    Ok(())
}

async fn work(name: &str, timeout: u64, config: StoreConfig) -> anyhow::Result<()> {
    let queue = connect(name, config).await?;
    info!(queue = name, "worker started");

    loop {
        match queue.wait(timeout).await {
            Ok(Some(task)) => {
                info!(
                    correlation_id = ?task.correlation_id(),
                    payload = task.raw_payload(),
                    "task received"
                );
                // Demo handler: echo the payload back as the result.
                let echoed: serde_json::Value = task.decoded_payload()?;
                queue.send(&task, &echoed).await?;
            }
            // Idle iteration; keep looping.
            Ok(None) => {}
            Err(err) => return Err(err.into()),
        }
    }
}

async fn len(name: &str, config: StoreConfig) -> anyhow::Result<()> {
    let queue = connect(name, config).await?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["queue", "pending"]);
    table.add_row(vec![name.to_string(), queue.len().await?.to_string()]);
    println!("{table}");
    Ok(())
}

async fn queues(config: StoreConfig) -> anyhow::Result<()> {
    // names() is store-wide; the handle's own name is irrelevant here.
    let queue = connect("default", config).await?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["queue"]);
    for name in queue.names().await? {
        table.add_row(vec![name]);
    }
    println!("{table}");
    Ok(())
}
