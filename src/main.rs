use clap::Parser;

use upnp_reqgen::{fetch::HttpFetcher, generator::RequestGenerator, sink::FsSink};

const LONG_ABOUT: &str = "\
UPnP request generator.

Generates a tree of directories and files corresponding to the devices,
services, and actions exposed by a UPnP daemon. This tool does not perform
discovery of UPnP daemons; the nmap NSE scripts 'broadcast-upnp-info' and
'upnp-info' are recommended for that.

Each variable in a generated request is pre-filled with the type of value
expected by the UPnP endpoint. Edit the files before use, or load them into
a tool such as Burp Repeater, to set variables to useful values before
exercising control over the daemon.";

#[derive(Parser, Debug)]
#[command(name = "upnp-reqgen", version, about = "UPnP request generator", long_about = LONG_ABOUT)]
enum Command {
    /// Generate one request file per action exposed by a UPnP daemon
    Generate {
        /// URL of the daemon's description XML file
        xml: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let Command::Generate { xml } = Command::parse();
    let Some(xml) = xml else {
        anyhow::bail!("no description URL given, see `upnp-reqgen generate --help`");
    };

    let fetcher = HttpFetcher::new()?;
    let sink = FsSink::default();
    let generator = RequestGenerator::new(&fetcher, &sink);
    let summary = generator.run(&xml).await?;
    tracing::info!(
        "Done: {} request file(s) written, {} service(s) skipped",
        summary.actions_written,
        summary.services_skipped
    );
    Ok(())
}
