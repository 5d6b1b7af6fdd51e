use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event as XmlEvent};

/// One node of a parsed netxml document. Kismet nests records several levels
/// deep (network -> SSID -> encryption, network -> wireless-client -> snr-info),
/// so the reader assembles a full tree rather than flat key/value pairs.
#[derive(Clone, Debug, Default)]
pub struct Element {
    name: String,
    attrs: HashMap<String, String>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// First direct child with the given tag name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given tag name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// All descendants with the given tag name, in document order.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut out = Vec::new();
        self.collect_named(name, &mut out);
        out
    }

    fn collect_named<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        for c in &self.children {
            if c.name == name {
                out.push(c);
            }
            c.collect_named(name, out);
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

pub fn parse_file(path: &Path) -> Result<Element> {
    let f = File::open(path)
        .with_context(|| format!("unable to open input file: {}", path.display()))?;
    let mut reader = Reader::from_reader(BufReader::new(f));
    reader.config_mut().trim_text(true);
    let root = parse_events(reader)
        .with_context(|| format!("unable to parse input file: {}", path.display()))?;
    log::debug!("{}: parsed root element <{}>", path.display(), root.name());
    Ok(root)
}

pub fn parse_str(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    parse_events(reader)
}

fn parse_events<R: BufRead>(mut reader: Reader<R>) -> Result<Element> {
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(e) => stack.push(element_from_start(&e)?),
            XmlEvent::Empty(e) => {
                let el = element_from_start(&e)?;
                attach(&mut stack, &mut root, el);
            }
            XmlEvent::End(_) => {
                let el = stack.pop().ok_or_else(|| anyhow!("unbalanced closing tag"))?;
                attach(&mut stack, &mut root, el);
            }
            XmlEvent::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&t.unescape()?);
                }
            }
            XmlEvent::CData(t) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(t.as_ref()));
                }
            }
            XmlEvent::Eof => break,
            // Declarations, DTDs, comments and processing instructions carry
            // no record data.
            _ => {}
        }
        buf.clear();
    }
    if !stack.is_empty() {
        return Err(anyhow!("document ended with unclosed elements"));
    }
    root.ok_or_else(|| anyhow!("document contains no root element"))
}

fn element_from_start(e: &BytesStart) -> Result<Element> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attrs = HashMap::new();
    for a in e.attributes() {
        let a = a?;
        let k = String::from_utf8_lossy(a.key.as_ref()).into_owned();
        let v = a.unescape_value()?.into_owned();
        attrs.insert(k, v);
    }
    Ok(Element { name, attrs, children: Vec::new(), text: String::new() })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, el: Element) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(el);
    } else if root.is_none() {
        *root = Some(el);
    }
}
