use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};

use crate::XmlWriter;

pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP_ENCODING_NS: &str = "http://schemas.xmlsoap.org/soap/encoding/";

/// One synthesized control request.
///
/// Argument values are the resolved dataType strings, used as literal
/// placeholders for a human (or another tool) to replace before sending.
#[derive(Debug)]
pub struct ActionRequest<'a> {
    pub action_name: &'a str,
    /// Service type urn, doubling as the action's xml namespace.
    pub service_type: &'a str,
    pub hostname: &'a str,
    pub control_path: &'a str,
    /// `(name, placeholder)` pairs in declaration order. Only `in` arguments
    /// belong here.
    pub arguments: Vec<(&'a str, &'a str)>,
}

impl ActionRequest<'_> {
    /// SOAP envelope body. Dynamic text goes through the xml writer so
    /// escaping is applied in one place.
    pub fn body(&self) -> anyhow::Result<String> {
        let mut w = XmlWriter::new(Vec::new());
        w.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;

        let envelope = BytesStart::new("s:Envelope").with_attributes([
            ("xmlns:s", SOAP_ENVELOPE_NS),
            ("s:encodingStyle", SOAP_ENCODING_NS),
        ]);
        let envelope_end = envelope.to_end().into_owned();
        w.write_event(Event::Start(envelope))?;

        let body = BytesStart::new("s:Body");
        let body_end = body.to_end().into_owned();
        w.write_event(Event::Start(body))?;

        let action_tag = format!("u:{}", self.action_name);
        let action = BytesStart::new(action_tag.as_str())
            .with_attributes([("xmlns:u", self.service_type)]);
        let action_end = action.to_end().into_owned();
        w.write_event(Event::Start(action))?;

        for (name, placeholder) in &self.arguments {
            w.create_element(*name)
                .write_text_content(BytesText::new(placeholder))?;
        }

        w.write_event(Event::End(action_end))?;
        w.write_event(Event::End(body_end))?;
        w.write_event(Event::End(envelope_end))?;
        Ok(String::from_utf8(w.into_inner())?)
    }

    /// Full artifact: HTTP header block, blank line, body. `Content-Length`
    /// is the exact byte length of the body.
    pub fn render(&self) -> anyhow::Result<String> {
        let body = self.body()?;
        let control_path = format!("/{}", self.control_path.trim_start_matches('/'));
        Ok(format!(
            "POST {control_path} HTTP/1.1\n\
             Host: {host}\n\
             SOAPAction: \"{service}#{action}\"\n\
             Content-Type: text/xml; charset=\"utf-8\"\n\
             Content-Length: {length}\n\
             \n\
             {body}",
            host = self.hostname,
            service = self.service_type,
            action = self.action_name,
            length = body.len(),
        ))
    }
}
