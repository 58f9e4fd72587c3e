use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    device_description::{Device, DeviceDescription},
    envelope::ActionRequest,
    fetch::DocumentFetcher,
    scpd::{ArgumentDirection, Scpd},
    sink::RequestSink,
    url, FromXml,
};

/// Placeholder emitted when an argument's related state variable has no
/// declaration in the service description.
pub const UNKNOWN_TYPE: &str = "unknown";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub actions_written: usize,
    pub services_skipped: usize,
}

/// Walks root description, devices, services and actions, fully sequential,
/// and writes one request file per action at
/// `{host}/{deviceType}/{serviceType}/{actionName}`.
///
/// Failure policy per level: a root fetch or parse failure aborts the run;
/// a service whose SCPD cannot be fetched or parsed is skipped with a
/// warning; an unresolved state variable degrades that argument to the
/// [UNKNOWN_TYPE] placeholder; a filesystem failure aborts, naming the item.
pub struct RequestGenerator<'a> {
    fetcher: &'a dyn DocumentFetcher,
    sink: &'a dyn RequestSink,
}

impl<'a> RequestGenerator<'a> {
    pub fn new(fetcher: &'a dyn DocumentFetcher, sink: &'a dyn RequestSink) -> Self {
        Self { fetcher, sink }
    }

    pub async fn run(&self, descriptor_url: &str) -> anyhow::Result<RunSummary> {
        tracing::info!("Attempting to retrieve descriptor XML file");
        let raw = self
            .fetcher
            .fetch(descriptor_url)
            .await
            .with_context(|| format!("retrieve descriptor XML file: {descriptor_url}"))?;
        let description =
            DeviceDescription::read_xml(&mut quick_xml::Reader::from_reader(raw.as_slice()))
                .context("parse root description document")?;

        let hostname = url::hostname(descriptor_url)
            .with_context(|| format!("no hostname in descriptor URL: {descriptor_url}"))?;

        let host_dir = PathBuf::from(sanitize_segment(hostname));
        self.sink
            .ensure_dir(&host_dir)
            .with_context(|| format!("create output directory for {hostname}"))?;

        let mut summary = RunSummary::default();
        for device in description.device.all_devices() {
            self.walk_device(descriptor_url, hostname, &host_dir, device, &mut summary)
                .await?;
        }
        Ok(summary)
    }

    async fn walk_device(
        &self,
        descriptor_url: &str,
        hostname: &str,
        host_dir: &Path,
        device: &Device<'_>,
        summary: &mut RunSummary,
    ) -> anyhow::Result<()> {
        tracing::info!("Starting work on UPnP device {}", device.device_type);
        let device_dir = host_dir.join(sanitize_segment(&device.device_type));
        self.sink
            .ensure_dir(&device_dir)
            .with_context(|| format!("create directory for device {}", device.device_type))?;

        for service in &device.service_list {
            tracing::info!(
                "Attempting to retrieve service description for {}",
                service.service_type
            );
            let scpd_url = url::resolve(descriptor_url, &service.scpd_url);
            let raw = match self.fetcher.fetch(&scpd_url).await {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(
                        "Couldn't retrieve description XML for {}: {err}",
                        service.service_type
                    );
                    summary.services_skipped += 1;
                    continue;
                }
            };
            let scpd = match Scpd::read_xml(&mut quick_xml::Reader::from_reader(raw.as_slice())) {
                Ok(scpd) => scpd,
                Err(err) => {
                    tracing::warn!(
                        "Couldn't parse description XML for {}: {err:#}",
                        service.service_type
                    );
                    summary.services_skipped += 1;
                    continue;
                }
            };

            let service_dir = device_dir.join(sanitize_segment(&service.service_type));
            self.sink.ensure_dir(&service_dir).with_context(|| {
                format!("create directory for service {}", service.service_type)
            })?;

            tracing::info!("Generating actions for service {}", service.service_type);
            let variables = scpd.variable_table();
            for action in &scpd.actions {
                tracing::info!("{}", action.name);

                let mut arguments = Vec::new();
                for argument in &action.arguments {
                    if argument.direction != ArgumentDirection::In {
                        continue;
                    }
                    let resolved = argument
                        .related_state_variable
                        .as_deref()
                        .and_then(|name| variables.get(name).copied());
                    let placeholder = match resolved {
                        Some(data_type) => data_type,
                        None => {
                            tracing::warn!(
                                "No state variable declaration for argument {} of action {}",
                                argument.name,
                                action.name
                            );
                            UNKNOWN_TYPE
                        }
                    };
                    arguments.push((argument.name.as_ref(), placeholder));
                }

                let request = ActionRequest {
                    action_name: &action.name,
                    service_type: &service.service_type,
                    hostname,
                    control_path: &service.control_url,
                    arguments,
                };
                let rendered = request.render()?;
                let path = service_dir.join(sanitize_segment(&action.name));
                self.sink
                    .write_file(&path, rendered.as_bytes())
                    .with_context(|| format!("write request file for action {}", action.name))?;
                summary.actions_written += 1;
            }
        }
        Ok(())
    }
}

/// XML-derived names become path components. Descriptions are untrusted, so
/// separators and special segments must never escape the output root.
pub fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '_' | ':' | '-' => c,
            _ => '_',
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}
