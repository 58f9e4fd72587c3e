use std::{borrow::Cow, collections::HashMap, str::FromStr};

use anyhow::Context;
use quick_xml::events::Event;

use crate::{FromXml, XmlReaderExt};

/// Service Control Protocol Description: the actions a service exposes and
/// the state variable table its arguments are typed against.
///
/// `actionList` and `serviceStateTable` may appear in either order and either
/// may be absent; real-world descriptions vary.
#[derive(Debug, Default)]
pub struct Scpd<'a> {
    pub actions: Vec<ScpdAction<'a>>,
    pub variables: Vec<ScpdVariable<'a>>,
}

impl<'a> Scpd<'a> {
    /// Name to dataType lookup, built once per descriptor. UPnP state
    /// variable names are unique by convention; on a duplicate the first
    /// declaration wins.
    pub fn variable_table(&self) -> HashMap<&str, &str> {
        let mut table = HashMap::with_capacity(self.variables.len());
        for variable in &self.variables {
            table
                .entry(variable.name.as_ref())
                .or_insert(variable.data_type.as_ref());
        }
        table
    }
}

impl<'a> FromXml<'a> for Scpd<'a> {
    fn read_xml(r: &mut quick_xml::Reader<&'a [u8]>) -> anyhow::Result<Self> {
        let root = r.read_to_start()?;
        anyhow::ensure!(
            root.local_name().as_ref() == b"scpd",
            "expected scpd element, got {:?}",
            root
        );

        let mut actions = Vec::new();
        let mut variables = Vec::new();

        loop {
            match r.read_event_err_eof()? {
                Event::Start(start) => {
                    let start = start.to_owned();
                    match start.local_name().as_ref() {
                        b"actionList" => {
                            loop {
                                match r.read_event()? {
                                    Event::Start(start) => {
                                        anyhow::ensure!(
                                            start.local_name().as_ref() == b"action",
                                            "scpd got {:?}",
                                            start
                                        );
                                        actions.push(ScpdAction::read_xml(r)?);
                                    }
                                    Event::End(end) => {
                                        anyhow::ensure!(end.local_name().as_ref() == b"actionList");
                                        break;
                                    }
                                    Event::Text(_) => {}
                                    r => Err(anyhow::anyhow!(
                                        "expected action or action list end, got {:?}",
                                        r
                                    ))?,
                                }
                            }
                        }
                        b"serviceStateTable" => {
                            loop {
                                match r.read_event()? {
                                    Event::Start(start) => {
                                        anyhow::ensure!(
                                            start.local_name().as_ref() == b"stateVariable"
                                        );
                                        variables.push(ScpdVariable::read_xml(r)?);
                                    }
                                    Event::End(end) => {
                                        anyhow::ensure!(
                                            end.local_name().as_ref() == b"serviceStateTable"
                                        );
                                        break;
                                    }
                                    Event::Text(_) => {}
                                    r => Err(anyhow::anyhow!(
                                        "expected state variable or state table end, got {:?}",
                                        r
                                    ))?,
                                }
                            }
                        }
                        _ => {
                            r.read_to_end(start.name())?;
                        }
                    }
                }
                Event::End(end) => {
                    anyhow::ensure!(end.local_name().as_ref() == b"scpd");
                    break;
                }
                _ => {}
            }
        }

        Ok(Self { actions, variables })
    }
}

#[derive(Debug)]
pub struct ScpdAction<'a> {
    pub name: Cow<'a, str>,
    /// Arguments in declaration order. Order is preserved through request
    /// synthesis.
    pub arguments: Vec<ScpdArgument<'a>>,
}

impl<'a> FromXml<'a> for ScpdAction<'a> {
    fn read_xml(r: &mut quick_xml::Reader<&'a [u8]>) -> anyhow::Result<Self> {
        let name = r.read_to_start()?;
        anyhow::ensure!(name.local_name().as_ref() == b"name");
        let name = r.read_text(name.name())?;

        let mut arguments = Vec::new();
        loop {
            match r.read_event_err_eof()? {
                Event::Start(start) => {
                    let start = start.into_owned();
                    match start.local_name().as_ref() {
                        b"argumentList" => {
                            loop {
                                match r.read_event()? {
                                    Event::Start(start) => {
                                        anyhow::ensure!(
                                            start.local_name().as_ref() == b"argument"
                                        );
                                        arguments.push(ScpdArgument::read_xml(r)?);
                                    }
                                    Event::End(end) => {
                                        anyhow::ensure!(
                                            end.local_name().as_ref() == b"argumentList"
                                        );
                                        break;
                                    }
                                    Event::Text(_) => {}
                                    r => Err(anyhow::anyhow!(
                                        "expected argument or argument list end, got {:?}",
                                        r
                                    ))?,
                                }
                            }
                        }
                        _ => {
                            r.read_to_end(start.name())?;
                        }
                    }
                }
                Event::End(end) => {
                    anyhow::ensure!(end.local_name().as_ref() == b"action");
                    break;
                }
                Event::Text(_) => {}
                r => Err(anyhow::anyhow!(
                    "expected argument list or action end, got {:?}",
                    r
                ))?,
            }
        }

        Ok(Self { name, arguments })
    }
}

#[derive(Debug)]
pub struct ScpdArgument<'a> {
    pub name: Cow<'a, str>,
    pub direction: ArgumentDirection,
    pub related_state_variable: Option<Cow<'a, str>>,
}

impl<'a> FromXml<'a> for ScpdArgument<'a> {
    fn read_xml(r: &mut quick_xml::Reader<&'a [u8]>) -> anyhow::Result<Self> {
        let mut name = None;
        let mut direction = None;
        let mut related_state_variable = None;

        loop {
            match r.read_event()? {
                Event::Start(start) => match start.local_name().as_ref() {
                    b"name" => {
                        let text = r.read_text(start.name())?;
                        name = Some(text);
                    }
                    b"direction" => {
                        let text = r.read_text(start.name())?;
                        direction = Some(ArgumentDirection::from_str(&text)?);
                    }
                    b"relatedStateVariable" => {
                        let text = r.read_text(start.name())?;
                        related_state_variable = Some(text);
                    }
                    _ => {
                        r.read_to_end(start.name())?;
                    }
                },
                Event::End(end) => {
                    anyhow::ensure!(end.local_name().as_ref() == b"argument");
                    break;
                }
                Event::Text(_) => {}
                r => Err(anyhow::anyhow!(
                    "expected argument property or argument end, got {:?}",
                    r
                ))?,
            }
        }

        let name = name.context("name")?;
        let direction = direction.context("direction")?;

        Ok(Self {
            name,
            direction,
            related_state_variable,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentDirection {
    In,
    Out,
}

impl FromStr for ArgumentDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            rest => Err(anyhow::anyhow!("unknown argument direction: {rest}")),
        }
    }
}

/// A declared state variable. `data_type` is kept as the verbatim document
/// string because it is emitted as a literal placeholder value; vendor
/// specific types must round-trip untouched.
#[derive(Debug)]
pub struct ScpdVariable<'a> {
    pub name: Cow<'a, str>,
    pub data_type: Cow<'a, str>,
}

impl<'a> FromXml<'a> for ScpdVariable<'a> {
    fn read_xml(r: &mut quick_xml::Reader<&'a [u8]>) -> anyhow::Result<Self> {
        let mut name = None;
        let mut data_type = None;

        loop {
            match r.read_event()? {
                Event::Start(start) => match start.local_name().as_ref() {
                    b"name" => {
                        let text = r.read_text(start.name())?;
                        name = Some(text);
                    }
                    b"dataType" => {
                        let text = r.read_text(start.name())?;
                        data_type = Some(text);
                    }
                    _ => {
                        r.read_to_end(start.name())?;
                    }
                },
                Event::End(end) => {
                    anyhow::ensure!(end.local_name().as_ref() == b"stateVariable");
                    break;
                }
                Event::Text(_) => {}
                r => Err(anyhow::anyhow!(
                    "expected end of stateVariable, got {:?}",
                    r
                ))?,
            }
        }

        let name = name.context("name")?;
        let data_type = data_type.context("data type")?;

        Ok(Self { name, data_type })
    }
}

#[cfg(test)]
mod tests {
    use super::{ArgumentDirection, Scpd};
    use crate::FromXml;

    pub const LAYER3_FORWARDING_SCPD: &str = r#"<?xml version="1.0"?>
<scpd xmlns="urn:schemas-upnp-org:service-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <actionList>
    <action>
      <name>SetDefaultConnectionService</name>
      <argumentList>
        <argument>
          <name>NewDefaultConnectionService</name>
          <direction>in</direction>
          <relatedStateVariable>DefaultConnectionService</relatedStateVariable>
        </argument>
      </argumentList>
    </action>
    <action>
      <name>GetDefaultConnectionService</name>
      <argumentList>
        <argument>
          <name>NewDefaultConnectionService</name>
          <direction>out</direction>
          <relatedStateVariable>DefaultConnectionService</relatedStateVariable>
        </argument>
      </argumentList>
    </action>
  </actionList>
  <serviceStateTable>
    <stateVariable sendEvents="yes">
      <name>DefaultConnectionService</name>
      <dataType>string</dataType>
      <allowedValueList>
        <allowedValue>whatever</allowedValue>
      </allowedValueList>
    </stateVariable>
  </serviceStateTable>
</scpd>"#;

    #[test]
    fn parse_scpd() {
        let scpd = Scpd::read_xml(&mut quick_xml::Reader::from_str(LAYER3_FORWARDING_SCPD)).unwrap();
        assert_eq!(scpd.actions.len(), 2);
        assert_eq!(scpd.actions[0].name, "SetDefaultConnectionService");
        let argument = &scpd.actions[0].arguments[0];
        assert_eq!(argument.name, "NewDefaultConnectionService");
        assert_eq!(argument.direction, ArgumentDirection::In);
        assert_eq!(
            argument.related_state_variable.as_deref(),
            Some("DefaultConnectionService")
        );
        assert_eq!(scpd.variables.len(), 1);
        assert_eq!(scpd.variables[0].data_type, "string");
    }

    #[test]
    fn variable_table_lookup() {
        let scpd = Scpd::read_xml(&mut quick_xml::Reader::from_str(LAYER3_FORWARDING_SCPD)).unwrap();
        let table = scpd.variable_table();
        assert_eq!(table.get("DefaultConnectionService"), Some(&"string"));
        assert_eq!(table.get("NoSuchVariable"), None);
    }

    #[test]
    fn duplicate_variable_keeps_first_declaration() {
        let raw = r#"<scpd>
  <serviceStateTable>
    <stateVariable><name>A_ARG_TYPE</name><dataType>string</dataType></stateVariable>
    <stateVariable><name>A_ARG_TYPE</name><dataType>ui4</dataType></stateVariable>
  </serviceStateTable>
</scpd>"#;
        let scpd = Scpd::read_xml(&mut quick_xml::Reader::from_str(raw)).unwrap();
        assert_eq!(scpd.variable_table().get("A_ARG_TYPE"), Some(&"string"));
    }

    #[test]
    fn action_without_arguments() {
        let raw = r#"<scpd>
  <actionList>
    <action><name>GetStatus</name></action>
  </actionList>
</scpd>"#;
        let scpd = Scpd::read_xml(&mut quick_xml::Reader::from_str(raw)).unwrap();
        assert_eq!(scpd.actions.len(), 1);
        assert!(scpd.actions[0].arguments.is_empty());
    }

    #[test]
    fn vendor_data_type_round_trips() {
        let raw = r#"<scpd>
  <serviceStateTable>
    <stateVariable><name>X</name><dataType>vendor:blob</dataType></stateVariable>
  </serviceStateTable>
</scpd>"#;
        let scpd = Scpd::read_xml(&mut quick_xml::Reader::from_str(raw)).unwrap();
        assert_eq!(scpd.variables[0].data_type, "vendor:blob");
    }

    #[test]
    fn mismatched_end_tag_is_an_error() {
        let raw = r#"<scpd>
  <actionList>
    <action><name>First</name></action>
    </oops>
    <action><name>Second</name></action>
  </actionList>
</scpd>"#;
        assert!(Scpd::read_xml(&mut quick_xml::Reader::from_str(raw)).is_err());
    }

    #[test]
    fn unknown_direction_is_an_error() {
        let raw = r#"<scpd>
  <actionList>
    <action>
      <name>Bad</name>
      <argumentList>
        <argument><name>X</name><direction>sideways</direction></argument>
      </argumentList>
    </action>
  </actionList>
</scpd>"#;
        assert!(Scpd::read_xml(&mut quick_xml::Reader::from_str(raw)).is_err());
    }
}
