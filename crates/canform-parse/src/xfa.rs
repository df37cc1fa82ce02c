//! XFA datasets extraction and flattening.
//!
//! Both supported form families are XFA forms: the filled values live in the
//! `datasets` packet of the `/XFA` entry, an XML document. The packet is
//! located, parsed into an element tree, and flattened into dotted raw
//! paths; repeated same-named siblings (one element per family member and
//! the like) become repetition-index segments, matching the `[i]` path
//! convention the alias tables are written against.

use canform_core::{FieldPath, RawFieldSet, RawValue};
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::acroform::{acroform_dict, resolve};
use crate::error::ReaderError;

/// Locate and return the `datasets` XML, if this document is an XFA form.
///
/// The `/XFA` entry is either an array of (packet-name, stream) pairs or a
/// single stream holding the whole XDP; in the latter case the returned XML
/// is the full XDP and the flattener finds the datasets subtree itself.
pub fn extract_datasets_xml(doc: &lopdf::Document) -> Result<Option<String>, ReaderError> {
    let Some(acroform) = acroform_dict(doc) else {
        return Ok(None);
    };
    let Some(xfa_obj) = resolve(doc, acroform.get(b"XFA").ok()) else {
        return Ok(None);
    };

    match xfa_obj {
        lopdf::Object::Array(items) => {
            let mut next_is_datasets = false;
            for item in items {
                if let lopdf::Object::String(bytes, _) = item {
                    next_is_datasets = bytes.as_slice() == b"datasets";
                    continue;
                }
                if next_is_datasets {
                    return Ok(stream_text(doc, item));
                }
                next_is_datasets = false;
            }
            Ok(None)
        }
        stream @ (lopdf::Object::Stream(_) | lopdf::Object::Reference(_)) => {
            Ok(stream_text(doc, stream))
        }
        _ => Ok(None),
    }
}

/// Decode a stream object's content, decompressing when possible.
fn stream_text(doc: &lopdf::Document, obj: &lopdf::Object) -> Option<String> {
    let stream = match resolve(doc, Some(obj))? {
        lopdf::Object::Stream(s) => s,
        _ => return None,
    };
    let bytes = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// A parsed XML element: local name, accumulated text, children in document
/// order. Attributes carry no form values in XFA datasets and are dropped.
#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    pub name: String,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth-first search for the first descendant (or self) with `name`.
    fn find(&self, name: &str) -> Option<&XmlElement> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}

/// Parse an XML document into an element tree.
pub fn parse_tree(xml: &str) -> Result<XmlElement, ReaderError> {
    let mut reader = Reader::from_str(xml);

    // Synthetic root holds top-level siblings while parsing.
    let mut stack = vec![XmlElement::default()];
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                stack.push(XmlElement {
                    name: local_name(start.name().as_ref()),
                    ..XmlElement::default()
                });
            }
            Ok(Event::Empty(start)) => {
                let child = XmlElement {
                    name: local_name(start.name().as_ref()),
                    ..XmlElement::default()
                };
                // Parsing keeps the stack non-empty by construction.
                if let Some(top) = stack.last_mut() {
                    top.children.push(child);
                }
            }
            Ok(Event::End(_)) => {
                if stack.len() > 1 {
                    let done = stack.pop().unwrap_or_default();
                    if let Some(top) = stack.last_mut() {
                        top.children.push(done);
                    }
                }
            }
            Ok(Event::Text(text)) => {
                let value = text
                    .unescape()
                    .map_err(|e| ReaderError::Xml(e.to_string()))?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&value);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ReaderError::Xml(e.to_string())),
        }
    }

    let mut synthetic = match stack.pop() {
        Some(el) if stack.is_empty() => el,
        _ => return Err(ReaderError::Xml("unbalanced element tree".to_string())),
    };
    match synthetic.children.len() {
        1 => Ok(synthetic.children.remove(0)),
        0 => Err(ReaderError::Xml("document has no root element".to_string())),
        n => Err(ReaderError::Xml(format!("{n} root elements"))),
    }
}

fn local_name(qname: &[u8]) -> String {
    let local = qname
        .iter()
        .rposition(|&b| b == b':')
        .map_or(qname, |pos| &qname[pos + 1..]);
    String::from_utf8_lossy(local).into_owned()
}

/// Flatten a datasets tree (or a whole XDP containing one) into raw fields.
///
/// Flattening starts below `xfa:datasets`/`xfa:data` when present, so paths
/// begin at the form's own root element (e.g. `form1.Page1...`). Subtrees
/// named in `skip` are ignored wholesale; the 5257E embeds a multi-thousand
/// line list-of-values file that would otherwise drown the field set.
pub fn flatten_datasets(root: &XmlElement, skip: &[String]) -> RawFieldSet {
    let mut set = RawFieldSet::new();
    match root.find("datasets") {
        Some(datasets) => {
            let start = datasets.find("data").unwrap_or(datasets);
            for (child, index) in indexed_children(start) {
                walk(child, index, &FieldPath::default(), skip, &mut set);
            }
        }
        // Already inside the form's own tree: keep the root element's name.
        None => walk(root, None, &FieldPath::default(), skip, &mut set),
    }
    set
}

/// Pair each child with its repetition index: `Some(i)` when the name
/// occurs more than once among the siblings, `None` for unique names.
fn indexed_children(el: &XmlElement) -> Vec<(&XmlElement, Option<usize>)> {
    let mut totals: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
    for child in &el.children {
        *totals.entry(child.name.as_str()).or_default() += 1;
    }
    let mut seen: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
    el.children
        .iter()
        .map(|child| {
            let occurrence = seen.entry(child.name.as_str()).or_default();
            let index = (totals[child.name.as_str()] > 1).then_some(*occurrence);
            *occurrence += 1;
            (child, index)
        })
        .collect()
}

fn walk(
    el: &XmlElement,
    index: Option<usize>,
    parent: &FieldPath,
    skip: &[String],
    set: &mut RawFieldSet,
) {
    if skip.iter().any(|s| s == &el.name) {
        return;
    }
    let mut path = parent.clone();
    path.push_name(el.name.clone());
    if let Some(i) = index {
        path.push_index(i);
    }
    if el.is_leaf() {
        set.insert(path, RawValue::Text(el.text.trim().to_string()));
        return;
    }
    for (child, child_index) in indexed_children(el) {
        walk(child, child_index, &path, skip, set);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASETS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xfa:datasets xmlns:xfa="http://www.xfa.org/schema/xfa-data/1.0/">
  <xfa:data>
    <form1>
      <Page1>
        <PersonalDetails>
          <Name><FamilyName>DOOSTI</FamilyName><GivenName>NIKAN</GivenName></Name>
        </PersonalDetails>
      </Page1>
      <page1>
        <SecB>
          <Chd><ChdRel>Daughter</ChdRel><ChdDOB>2010-07-15</ChdDOB></Chd>
          <Chd><ChdRel>Son</ChdRel><ChdDOB/></Chd>
        </SecB>
      </page1>
      <LOVFile><Junk>enormous</Junk></LOVFile>
    </form1>
  </xfa:data>
</xfa:datasets>"#;

    fn path(s: &str) -> FieldPath {
        s.parse().unwrap()
    }

    #[test]
    fn flattens_nested_elements_to_dotted_paths() {
        let tree = parse_tree(DATASETS).unwrap();
        let set = flatten_datasets(&tree, &[]);
        assert_eq!(
            set.get(&path("form1.Page1.PersonalDetails.Name.FamilyName")),
            Some(&RawValue::Text("DOOSTI".to_string()))
        );
    }

    #[test]
    fn repeated_siblings_get_index_segments() {
        let tree = parse_tree(DATASETS).unwrap();
        let set = flatten_datasets(&tree, &[]);
        assert_eq!(
            set.get(&path("form1.page1.SecB.Chd.[0].ChdRel")),
            Some(&RawValue::Text("Daughter".to_string()))
        );
        assert_eq!(
            set.get(&path("form1.page1.SecB.Chd.[1].ChdRel")),
            Some(&RawValue::Text("Son".to_string()))
        );
        // Empty element flattens to an empty value, not a missing path.
        assert_eq!(
            set.get(&path("form1.page1.SecB.Chd.[1].ChdDOB")),
            Some(&RawValue::Text(String::new()))
        );
    }

    #[test]
    fn skip_list_drops_whole_subtrees() {
        let tree = parse_tree(DATASETS).unwrap();
        let set = flatten_datasets(&tree, &["LOVFile".to_string()]);
        assert!(set.get(&path("form1.LOVFile.Junk")).is_none());
        // Everything else survives.
        assert!(set.get(&path("form1.Page1.PersonalDetails.Name.GivenName")).is_some());
    }

    #[test]
    fn namespace_prefixes_are_stripped() {
        let tree = parse_tree(DATASETS).unwrap();
        assert_eq!(tree.name, "datasets");
        assert_eq!(tree.children[0].name, "data");
    }

    #[test]
    fn flatten_starts_below_datasets_data() {
        let tree = parse_tree(DATASETS).unwrap();
        let set = flatten_datasets(&tree, &[]);
        // No path is prefixed with the datasets/data wrappers.
        assert!(set.iter().all(|(p, _)| !p.to_string().starts_with("datasets")));
    }

    #[test]
    fn whole_xdp_document_still_finds_datasets() {
        let xdp = format!(
            r#"<xdp:xdp xmlns:xdp="http://ns.adobe.com/xdp/"><other>noise</other>{}</xdp:xdp>"#,
            DATASETS.trim_start_matches(r#"<?xml version="1.0" encoding="UTF-8"?>"#)
        );
        let tree = parse_tree(&xdp).unwrap();
        let set = flatten_datasets(&tree, &[]);
        assert!(set.get(&path("form1.Page1.PersonalDetails.Name.FamilyName")).is_some());
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse_tree("<a><b></a>").is_err());
        assert!(parse_tree("").is_err());
    }

    #[test]
    fn entity_text_is_unescaped() {
        let tree = parse_tree("<r><v>a &amp; b</v></r>").unwrap();
        let set = flatten_datasets(&tree, &[]);
        assert_eq!(
            set.get(&path("r.v")),
            Some(&RawValue::Text("a & b".to_string()))
        );
    }
}
