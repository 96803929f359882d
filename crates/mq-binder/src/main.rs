//! CLI that provisions IBM MQ destinations for stream bindings.
//!
//! Every administrative command issued is printed to stdout as MQSC, so the
//! output can be reviewed or fed to `runmqsc`.
//!
//! # Examples
//!
//! ```bash
//! # Provision every binding in a configuration file
//! mq-provision --config binder.toml plan
//!
//! # Provision a producer with two required groups
//! mq-provision producer orders -g billing -g audit
//!
//! # Provision one instance of a partitioned consumer
//! mq-provision consumer orders -g billing --instance-index 0 --instance-count 2
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;
use tracing::{info, warn};

use mq_binder::{
    Base64UrlNamingStrategy, BinderConfig, ConsumerProperties, DefaultDestinationNameResolver,
    MqProvisioningProvider, ProducerProperties, ProvisioningProvider,
};
use mq_binder_admin::{QueueManager, QueueManagerAdmin};

type Provider = MqProvisioningProvider<QueueManagerAdmin, DefaultDestinationNameResolver>;

#[derive(Parser, Debug)]
#[command(name = "mq-provision")]
#[command(author, version, about = "Provision IBM MQ destinations for stream bindings", long_about = None)]
struct Cli {
    /// Binder configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Provision every binding in the configuration
    Plan,

    /// Provision a producer destination
    Producer {
        /// Destination name
        #[arg(value_name = "NAME")]
        name: String,

        /// Consumer groups whose queues must exist
        #[arg(short = 'g', long = "group", value_name = "GROUP")]
        groups: Vec<String>,

        /// Number of partitions
        #[arg(short, long, default_value = "1")]
        partitions: u32,
    },

    /// Provision a consumer destination
    Consumer {
        /// Destination name
        #[arg(value_name = "NAME")]
        name: String,

        /// Consumer group (anonymous when omitted)
        #[arg(short, long, default_value = "")]
        group: String,

        /// Index of this instance of a partitioned consumer
        #[arg(long, requires = "instance_count")]
        instance_index: Option<u32>,

        /// Number of instances of a partitioned consumer
        #[arg(long, requires = "instance_index")]
        instance_count: Option<u32>,

        /// Dead-letter queue for this consumer
        #[arg(long, value_name = "QUEUE")]
        dlq: Option<String>,
    },

    /// Provision the configured bindings, then clear and delete the dead-letter queue
    CleanDlq,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the MQSC script.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => BinderConfig::from_file(path)?,
        None => BinderConfig::default(),
    };
    let provider = build_provider(&config);

    let result = run(&provider, &config, cli.command);
    print!("{}", provider.admin().mqsc_script());
    result
}

fn build_provider(config: &BinderConfig) -> Provider {
    let conn = &config.connection;
    info!(
        qmgr = %conn.queue_manager,
        connection = %conn.connection_name(),
        channel = %conn.channel,
        transport = ?conn.transport,
        authenticated = conn.credentials().is_some(),
        "Administering queue manager"
    );

    let admin = QueueManagerAdmin::new(QueueManager::new(&conn.queue_manager));
    let resolver = DefaultDestinationNameResolver::with_strategy(Base64UrlNamingStrategy::new(
        config.anonymous_group_prefix.as_str(),
    ));
    MqProvisioningProvider::with_config(admin, resolver, config)
}

fn run(provider: &Provider, config: &BinderConfig, command: Commands) -> Result<()> {
    match command {
        Commands::Plan => provision_configured(provider, config),
        Commands::Producer {
            name,
            groups,
            partitions,
        } => {
            let properties = ProducerProperties {
                required_groups: groups,
                partition_count: partitions,
            };
            let dest = provider.provision_producer_destination(&name, &properties)?;
            for (partition, topic) in dest.partition_topics() {
                info!(partition, topic = %topic.name, "Producer topic ready");
            }
            Ok(())
        }
        Commands::Consumer {
            name,
            group,
            instance_index,
            instance_count,
            dlq,
        } => {
            let properties = ConsumerProperties {
                partitioned: instance_index.is_some(),
                instance_index: instance_index.unwrap_or(0),
                instance_count: instance_count.unwrap_or(1),
                dlq_name: dlq,
            };
            let dest = provider.provision_consumer_destination(&name, &group, &properties)?;
            info!(queue = %dest.name(), "Consumer queue ready");
            Ok(())
        }
        Commands::CleanDlq => {
            provision_configured(provider, config)?;
            provider.deprovision_dead_letter_queue()?;
            Ok(())
        }
    }
}

fn provision_configured(provider: &Provider, config: &BinderConfig) -> Result<()> {
    if config.producers.is_empty() && config.consumers.is_empty() {
        warn!("No bindings configured");
    }

    for producer in &config.producers {
        let dest = provider.provision_producer_destination(&producer.name, &producer.properties)?;
        info!(
            binding = %producer.name,
            topics = dest.partition_topics().len(),
            "Producer destination ready"
        );
    }
    for consumer in &config.consumers {
        let group = consumer.group.as_deref().unwrap_or_default();
        let dest =
            provider.provision_consumer_destination(&consumer.name, group, &consumer.properties)?;
        info!(binding = %consumer.name, queue = %dest.name(), "Consumer destination ready");
    }
    Ok(())
}
