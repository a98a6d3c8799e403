//! Virtual document the renderer writes style nodes into.
//!
//! It models just the part of a browser document the sinks touch: the
//! `<style>` nodes in the head, their attributes, text content and parsed
//! stylesheet.

use crate::stylesheet::StyleSheet;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to a document; documents are compared by identity
pub type DocumentHandle = Rc<RefCell<VirtualDocument>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

/// A `<style>` element
#[derive(Debug, Clone, PartialEq)]
pub struct StyleNode {
    id: NodeId,
    attributes: Vec<(String, String)>,
    text_content: String,
    sheet: Option<StyleSheet>,
}

impl StyleNode {
    fn new(id: NodeId) -> Self {
        Self {
            id,
            attributes: Vec::new(),
            text_content: String::new(),
            sheet: Some(StyleSheet::new()),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn text_content(&self) -> &str {
        &self.text_content
    }

    /// Replace the text content; an attached sheet is re-parsed from it
    pub fn set_text_content(&mut self, text: impl Into<String>) {
        self.text_content = text.into();
        if self.sheet.is_some() {
            self.sheet = Some(StyleSheet::parse(&self.text_content));
        }
    }

    pub fn append_text(&mut self, text: &str) {
        let mut content = std::mem::take(&mut self.text_content);
        content.push_str(text);
        self.set_text_content(content);
    }

    /// Parsed rules; `None` when the browser did not expose a sheet
    pub fn sheet(&self) -> Option<&StyleSheet> {
        self.sheet.as_ref()
    }

    pub fn sheet_mut(&mut self) -> Option<&mut StyleSheet> {
        self.sheet.as_mut()
    }

    /// Drop the parsed sheet, as some browsers do for style nodes with
    /// unsupported media queries
    pub fn detach_sheet(&mut self) {
        self.sheet = None;
    }

    /// Effective CSS of the node: the live sheet if there is one, else the
    /// text content
    pub fn css_text(&self) -> String {
        match &self.sheet {
            Some(sheet) => sheet.css_text(),
            None => self.text_content.clone(),
        }
    }
}

/// The head of a document as an ordered list of style nodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VirtualDocument {
    head: Vec<StyleNode>,
    next_node_id: u32,
}

impl VirtualDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_handle(self) -> DocumentHandle {
        Rc::new(RefCell::new(self))
    }

    pub fn handle() -> DocumentHandle {
        Self::new().into_handle()
    }

    /// Create an empty style node and insert it before `before`, or at the
    /// end of the head
    pub fn insert_style_node(
        &mut self,
        attributes: &[(String, String)],
        before: Option<NodeId>,
    ) -> NodeId {
        self.next_node_id += 1;
        let mut node = StyleNode::new(NodeId(self.next_node_id));
        for (name, value) in attributes {
            node.set_attribute(name.clone(), value.clone());
        }
        let id = node.id;

        let position = before
            .and_then(|sibling| self.position(sibling))
            .unwrap_or(self.head.len());
        self.head.insert(position, node);
        id
    }

    /// Append a style node with the given CSS text, e.g. one delivered with
    /// server-rendered markup
    pub fn append_style_node(&mut self, attributes: &[(String, String)], css: &str) -> NodeId {
        let id = self.insert_style_node(attributes, None);
        if let Some(node) = self.node_mut(id) {
            node.set_text_content(css);
        }
        id
    }

    pub fn remove_node(&mut self, id: NodeId) -> Option<StyleNode> {
        let position = self.position(id)?;
        Some(self.head.remove(position))
    }

    pub fn node(&self, id: NodeId) -> Option<&StyleNode> {
        self.head.iter().find(|node| node.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut StyleNode> {
        self.head.iter_mut().find(|node| node.id == id)
    }

    pub fn style_nodes(&self) -> &[StyleNode] {
        &self.head
    }

    /// Ids of the nodes carrying an attribute, in document order
    pub fn nodes_with_attribute(&self, name: &str) -> Vec<NodeId> {
        self.head
            .iter()
            .filter(|node| node.has_attribute(name))
            .map(|node| node.id)
            .collect()
    }

    pub fn find_node<P>(&self, predicate: P) -> Option<NodeId>
    where
        P: Fn(&StyleNode) -> bool,
    {
        self.head.iter().find(|node| predicate(node)).map(|node| node.id)
    }

    fn position(&self, id: NodeId) -> Option<usize> {
        self.head.iter().position(|node| node.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_insert_before_sibling() {
        let mut doc = VirtualDocument::new();
        let first = doc.insert_style_node(&attrs(&[("data-fela-type", "RULE")]), None);
        let second = doc.insert_style_node(&attrs(&[("data-fela-type", "FONT")]), Some(first));

        let order: Vec<NodeId> = doc.style_nodes().iter().map(|n| n.id()).collect();
        assert_eq!(order, vec![second, first]);
    }

    #[test]
    fn test_text_content_reparses_sheet() {
        let mut doc = VirtualDocument::new();
        let id = doc.append_style_node(&[], ".a{color:red}");
        let node = doc.node_mut(id).unwrap();
        assert_eq!(node.sheet().unwrap().len(), 1);

        node.append_text(".b{color:blue}");
        assert_eq!(node.sheet().unwrap().len(), 2);
        assert_eq!(node.text_content(), ".a{color:red}.b{color:blue}");
    }

    #[test]
    fn test_detached_sheet_falls_back_to_text() {
        let mut doc = VirtualDocument::new();
        let id = doc.append_style_node(&[], ".a{color:red}");
        let node = doc.node_mut(id).unwrap();
        node.detach_sheet();
        node.append_text(".b{color:blue}");
        assert!(node.sheet().is_none());
        assert_eq!(node.css_text(), ".a{color:red}.b{color:blue}");
    }

    #[test]
    fn test_attributes() {
        let mut doc = VirtualDocument::new();
        let id = doc.insert_style_node(&attrs(&[("media", "screen")]), None);
        let node = doc.node_mut(id).unwrap();
        node.set_attribute("media", "print");
        assert_eq!(node.attribute("media"), Some("print"));
        assert_eq!(node.attributes().count(), 1);
        assert_eq!(doc.nodes_with_attribute("media"), vec![id]);
        assert!(doc.remove_node(id).is_some());
        assert!(doc.node(id).is_none());
    }
}
