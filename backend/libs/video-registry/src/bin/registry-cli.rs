use std::env;

use anyhow::{bail, Context};
use video_registry::logging::init_tracing;
use video_registry::{connect, DeepLinkBuilder, PayloadId, RegistryConfig, Resolution};

fn usage() {
    eprintln!("Usage:");
    eprintln!("  registry-cli migrate");
    eprintln!("  registry-cli register <resource_ref>");
    eprintln!("  registry-cli resolve <payload_id> <requester_id>");
    eprintln!("  registry-cli link <payload_id>");
    eprintln!();
    eprintln!("Reads DATABASE_URL (default sqlite://videos.db), REGISTRY_BACKEND, BOT_USERNAME.");
}

fn link_builder(config: &RegistryConfig) -> anyhow::Result<DeepLinkBuilder> {
    let username = config
        .bot_username
        .as_deref()
        .context("BOT_USERNAME must be set to render deep links")?;
    Ok(DeepLinkBuilder::for_bot(username))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
        std::process::exit(1);
    }

    let config = RegistryConfig::from_env().map_err(anyhow::Error::msg)?;

    match args[1].as_str() {
        "migrate" if args.len() == 2 => {
            connect(&config).await?;
            println!("Schema is up to date ({})", config.backend.as_str());
        }
        "register" if args.len() == 3 => {
            let registry = connect(&config).await?;
            let payload_id = registry.register(&args[2]).await?;
            match link_builder(&config) {
                Ok(builder) => println!("{}", builder.link(payload_id)),
                Err(_) => println!("{}", payload_id),
            }
        }
        "resolve" if args.len() == 4 => {
            let payload_id: PayloadId = args[2].parse()?;
            let requester_id: i64 = args[3]
                .parse()
                .with_context(|| format!("invalid requester id: {}", args[3]))?;
            let registry = connect(&config).await?;
            let resolution = registry.resolve(payload_id, requester_id).await?;
            println!("{}", serde_json::to_string(&resolution)?);
            if resolution == Resolution::NotFound {
                std::process::exit(2);
            }
        }
        "link" if args.len() == 3 => {
            let payload_id: PayloadId = args[2].parse()?;
            println!("{}", link_builder(&config)?.link(payload_id));
        }
        _ => {
            usage();
            bail!("Invalid arguments");
        }
    }

    Ok(())
}
