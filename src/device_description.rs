use std::borrow::Cow;

use anyhow::Context;
use quick_xml::events::Event;

use crate::{FromXml, XmlReaderExt};

/// Root description document of a UPnP daemon.
///
/// Elements are matched by local name, so descriptions using the
/// `urn:schemas-upnp-org:device-1-0` default namespace (or any other) parse
/// without a namespace registration step.
#[derive(Debug)]
pub struct DeviceDescription<'a> {
    pub device: Device<'a>,
}

impl<'a> FromXml<'a> for DeviceDescription<'a> {
    fn read_xml(r: &mut quick_xml::Reader<&'a [u8]>) -> anyhow::Result<Self> {
        let root = r.read_to_start()?;
        anyhow::ensure!(
            root.local_name().as_ref() == b"root",
            "expected root element, got {:?}",
            root
        );

        let mut device = None;
        loop {
            match r.read_event_err_eof()? {
                Event::Start(start) => {
                    let start = start.to_owned();
                    match start.local_name().as_ref() {
                        b"device" => device = Some(Device::read_xml(r)?),
                        _ => {
                            r.read_to_end(start.name())?;
                        }
                    }
                }
                Event::End(end) => {
                    anyhow::ensure!(end.local_name().as_ref() == b"root");
                    break;
                }
                _ => {}
            }
        }

        let device = device.context("device")?;
        Ok(Self { device })
    }
}

/// A single device entry. Embedded devices nest under `<deviceList>` to
/// arbitrary depth and carry their own service lists.
#[derive(Debug)]
pub struct Device<'a> {
    pub device_type: Cow<'a, str>,
    pub friendly_name: Option<Cow<'a, str>>,
    pub service_list: Vec<Service<'a>>,
    pub device_list: Vec<Device<'a>>,
}

impl<'a> Device<'a> {
    /// This device and every embedded device, depth first.
    pub fn all_devices(&'a self) -> Box<dyn Iterator<Item = &'a Device<'a>> + 'a> {
        let nested = self.device_list.iter().flat_map(|d| d.all_devices());
        Box::new(std::iter::once(self).chain(nested))
    }
}

impl<'a> FromXml<'a> for Device<'a> {
    fn read_xml(r: &mut quick_xml::Reader<&'a [u8]>) -> anyhow::Result<Self> {
        let mut device_type = None;
        let mut friendly_name = None;
        let mut service_list = Vec::new();
        let mut device_list = Vec::new();

        loop {
            match r.read_event_err_eof()? {
                Event::Start(start) => {
                    let start = start.to_owned();
                    let end_name = start.name();
                    match start.local_name().as_ref() {
                        b"deviceType" => {
                            let text = r.read_text(end_name)?;
                            device_type = Some(text);
                        }
                        b"friendlyName" => {
                            let text = r.read_text(end_name)?;
                            friendly_name = Some(text);
                        }
                        b"serviceList" => {
                            loop {
                                match r.read_event()? {
                                    Event::Start(start) => {
                                        anyhow::ensure!(start.local_name().as_ref() == b"service");
                                        service_list.push(Service::read_xml(r)?);
                                    }
                                    Event::End(end) => {
                                        anyhow::ensure!(
                                            end.local_name().as_ref() == b"serviceList"
                                        );
                                        break;
                                    }
                                    Event::Text(_) => {}
                                    r => Err(anyhow::anyhow!(
                                        "Expected service start or service list end, got {:?}",
                                        r
                                    ))?,
                                }
                            }
                        }
                        b"deviceList" => {
                            loop {
                                match r.read_event()? {
                                    Event::Start(start) => {
                                        anyhow::ensure!(start.local_name().as_ref() == b"device");
                                        device_list.push(Device::read_xml(r)?);
                                    }
                                    Event::End(end) => {
                                        anyhow::ensure!(end.local_name().as_ref() == b"deviceList");
                                        break;
                                    }
                                    Event::Text(_) => {}
                                    r => Err(anyhow::anyhow!(
                                        "Expected device start or device list end, got {:?}",
                                        r
                                    ))?,
                                }
                            }
                        }
                        _ => {
                            r.read_to_end(end_name)?;
                        }
                    }
                }
                Event::End(end) => {
                    anyhow::ensure!(
                        end.local_name().as_ref() == b"device",
                        "expected device end, got {:?}",
                        end
                    );
                    break;
                }
                _ => {}
            }
        }

        let device_type = device_type.context("device type")?;

        Ok(Self {
            device_type,
            friendly_name,
            service_list,
            device_list,
        })
    }
}

/// One service entry of a device. `scpd_url` points at the service's own
/// description document and may be relative to the root description URL.
#[derive(Debug)]
pub struct Service<'a> {
    pub service_type: Cow<'a, str>,
    pub scpd_url: Cow<'a, str>,
    pub control_url: Cow<'a, str>,
}

impl<'a> FromXml<'a> for Service<'a> {
    fn read_xml(r: &mut quick_xml::Reader<&'a [u8]>) -> anyhow::Result<Self> {
        let mut service_type = None;
        let mut scpdurl = None;
        let mut control_url = None;

        loop {
            match r.read_event_err_eof()? {
                Event::Start(start) => {
                    let end = start.name();
                    match start.local_name().as_ref() {
                        b"serviceType" => {
                            let text = r.read_text(end)?;
                            service_type = Some(text);
                        }
                        b"SCPDURL" => {
                            let text = r.read_text(end)?;
                            scpdurl = Some(text);
                        }
                        b"controlURL" => {
                            let text = r.read_text(end)?;
                            control_url = Some(text);
                        }
                        _ => {
                            // skip unknown tags
                            r.read_to_end(end)?;
                        }
                    }
                }
                Event::End(end) => {
                    anyhow::ensure!(end.local_name().as_ref() == b"service");
                    break;
                }
                _ => {}
            }
        }

        let service_type = service_type.context("service type")?;
        let scpdurl = scpdurl.context("scpdurl")?;
        let control_url = control_url.context("control url")?;

        Ok(Self {
            service_type,
            scpd_url: scpdurl,
            control_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::DeviceDescription;
    use crate::FromXml;

    const IGD_DESCRIPTION: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <device>
    <deviceType>urn:schemas-upnp-org:device:InternetGatewayDevice:1</deviceType>
    <friendlyName>Router</friendlyName>
    <manufacturer>acme</manufacturer>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:Layer3Forwarding:1</serviceType>
        <serviceId>urn:upnp-org:serviceId:L3Forwarding1</serviceId>
        <SCPDURL>/l3frwd.xml</SCPDURL>
        <controlURL>/ctl/L3F</controlURL>
        <eventSubURL>/evt/L3F</eventSubURL>
      </service>
    </serviceList>
    <deviceList>
      <device>
        <deviceType>urn:schemas-upnp-org:device:WANDevice:1</deviceType>
        <friendlyName>WANDevice</friendlyName>
        <serviceList>
          <service>
            <serviceType>urn:schemas-upnp-org:service:WANCommonInterfaceConfig:1</serviceType>
            <SCPDURL>wancic.xml</SCPDURL>
            <controlURL>/ctl/CmnIfCfg</controlURL>
          </service>
        </serviceList>
      </device>
    </deviceList>
  </device>
</root>"#;

    #[test]
    fn parse_description_with_embedded_devices() {
        let description =
            DeviceDescription::read_xml(&mut quick_xml::Reader::from_str(IGD_DESCRIPTION)).unwrap();
        let devices: Vec<_> = description.device.all_devices().collect();
        assert_eq!(devices.len(), 2);
        assert_eq!(
            devices[0].device_type,
            "urn:schemas-upnp-org:device:InternetGatewayDevice:1"
        );
        assert_eq!(devices[1].device_type, "urn:schemas-upnp-org:device:WANDevice:1");

        let service = &devices[0].service_list[0];
        assert_eq!(
            service.service_type,
            "urn:schemas-upnp-org:service:Layer3Forwarding:1"
        );
        assert_eq!(service.scpd_url, "/l3frwd.xml");
        assert_eq!(service.control_url, "/ctl/L3F");

        // relative SCPDURL survives verbatim
        assert_eq!(devices[1].service_list[0].scpd_url, "wancic.xml");
    }

    #[test]
    fn missing_device_is_an_error() {
        let raw = r#"<root xmlns="urn:schemas-upnp-org:device-1-0"><specVersion/></root>"#;
        assert!(DeviceDescription::read_xml(&mut quick_xml::Reader::from_str(raw)).is_err());
    }

    #[test]
    fn mismatched_end_tag_is_an_error() {
        let raw = r#"<root>
  <device>
    <deviceType>urn:example:device:X:1</deviceType>
    <serviceList>
      </oops>
    </serviceList>
  </device>
</root>"#;
        assert!(DeviceDescription::read_xml(&mut quick_xml::Reader::from_str(raw)).is_err());
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let raw = "<root><device><deviceType>unterminated";
        assert!(DeviceDescription::read_xml(&mut quick_xml::Reader::from_str(raw)).is_err());
    }
}
