//! One parameter container: its sections and the widgets inside them.

use crate::address::Address;
use crate::error::{SyncError, SyncResult};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Widget style reported by graph introspection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Style {
    Float,
    Header,
    StrMenu,
    Menu,
    Toggle,
    /// Width/height pairs. Recognized but not supported.
    WH,
    Other(String),
}

impl From<String> for Style {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Float" => Style::Float,
            "Header" => Style::Header,
            "StrMenu" => Style::StrMenu,
            "Menu" => Style::Menu,
            "Toggle" => Style::Toggle,
            "WH" => Style::WH,
            _ => Style::Other(value),
        }
    }
}

impl From<&str> for Style {
    fn from(value: &str) -> Self {
        Style::from(value.to_string())
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Style::Float => f.write_str("Float"),
            Style::Header => f.write_str("Header"),
            Style::StrMenu => f.write_str("StrMenu"),
            Style::Menu => f.write_str("Menu"),
            Style::Toggle => f.write_str("Toggle"),
            Style::WH => f.write_str("WH"),
            Style::Other(s) => f.write_str(s),
        }
    }
}

/// A grouping scope in the graph, as listed by the host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContainerDescriptor {
    pub address: Address,
    pub path: String,
}

/// One parameter as listed by the host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParameterDescriptor {
    pub address: Address,
    pub label: String,
    pub style: Style,
    #[serde(default, alias = "normmin")]
    pub min_value: Option<f64>,
    #[serde(default, alias = "normmax")]
    pub max_value: Option<f64>,
    #[serde(default, alias = "menulabels")]
    pub menu_labels: Vec<String>,
    #[serde(default)]
    pub order: f64,
}

impl ParameterDescriptor {
    pub fn new(address: &str, label: &str, style: impl Into<Style>) -> Self {
        Self {
            address: Address::from(address),
            label: label.to_string(),
            style: style.into(),
            min_value: None,
            max_value: None,
            menu_labels: Vec::new(),
            order: 0.0,
        }
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min_value = Some(min);
        self.max_value = Some(max);
        self
    }

    pub fn with_menu(mut self, labels: &[&str]) -> Self {
        self.menu_labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn with_order(mut self, order: f64) -> Self {
        self.order = order;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetKind {
    /// Label only; carries no value.
    Header,
    Slider { min: Option<f64>, max: Option<f64> },
    Menu { labels: Vec<String> },
    Toggle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub address: Address,
    pub label: String,
    pub style: Style,
    pub order: f64,
    pub section: Address,
    pub kind: WidgetKind,
}

impl Widget {
    /// Address the widget reads and writes, `None` for headers.
    pub fn value_address(&self) -> Option<&Address> {
        match self.kind {
            WidgetKind::Header => None,
            _ => Some(&self.address),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub address: Address,
    pub label: String,
    /// Widget addresses in creation order.
    pub widgets: Vec<Address>,
}

#[derive(Debug, Clone)]
pub struct ParameterContainer {
    address: Address,
    path: String,
    sections: BTreeMap<Address, Section>,
    widgets: BTreeMap<Address, Widget>,
}

impl ParameterContainer {
    pub fn new(address: Address, path: impl Into<String>) -> Self {
        Self {
            address,
            path: path.into(),
            sections: BTreeMap::new(),
            widgets: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    pub fn section(&self, address: &str) -> Option<&Section> {
        self.sections.get(&Address::from(address))
    }

    pub fn widget(&self, address: &str) -> Option<&Widget> {
        self.widgets.get(&Address::from(address))
    }

    pub fn widgets(&self) -> impl Iterator<Item = &Widget> {
        self.widgets.values()
    }

    /// Create the section for `address` unless it already exists.
    /// Returns whether a section was created.
    pub fn sync_section(&mut self, address: &Address, label: &str) -> bool {
        if self.sections.contains_key(address) {
            return false;
        }

        debug!(section = %address, label, "creating section");
        self.sections.insert(
            address.clone(),
            Section {
                address: address.clone(),
                label: label.to_string(),
                widgets: Vec::new(),
            },
        );
        true
    }

    /// Create the widget for a parameter unless it already exists.
    ///
    /// Returns `Ok(true)` when a widget was created, `Ok(false)` when one
    /// already existed, and `UnsupportedStyle` for styles with no widget.
    pub fn sync_parameter(&mut self, param: &ParameterDescriptor) -> SyncResult<bool> {
        if self.widgets.contains_key(&param.address) {
            return Ok(false);
        }

        let kind = match &param.style {
            Style::Header => WidgetKind::Header,
            Style::Float => WidgetKind::Slider {
                min: param.min_value,
                max: param.max_value,
            },
            Style::Menu | Style::StrMenu => WidgetKind::Menu {
                labels: param.menu_labels.clone(),
            },
            Style::Toggle => WidgetKind::Toggle,
            Style::WH | Style::Other(_) => {
                return Err(SyncError::UnsupportedStyle {
                    address: param.address.to_string(),
                    style: param.style.to_string(),
                });
            }
        };

        let section = self.parameter_section(&param.address)?;
        debug!(address = %param.address, %section, "creating widget");

        if let Some(s) = self.sections.get_mut(&section) {
            s.widgets.push(param.address.clone());
        }
        self.widgets.insert(
            param.address.clone(),
            Widget {
                address: param.address.clone(),
                label: param.label.clone(),
                style: param.style.clone(),
                order: param.order,
                section,
                kind,
            },
        );
        Ok(true)
    }

    /// Section owning `address`: its parent path, created on demand and
    /// labelled after the parent's last segment.
    fn parameter_section(&mut self, address: &Address) -> SyncResult<Address> {
        let parent = address
            .parent()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| SyncError::malformed("a parameter address with a parent path", address.as_str()))?;
        let section = Address::from(parent);

        if !self.sections.contains_key(&section) {
            debug!(%address, "section not found for parameter, initializing");
            let label = titleize(section.leaf());
            self.sync_section(&section, &label);
        }
        Ok(section)
    }
}

/// `blendMode` → `Blend Mode`, `video_fx` → `Video Fx`, `layer1` → `Layer1`.
pub fn titleize(name: &str) -> String {
    let mut spaced = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        let c = if c == '-' || c == '_' { ' ' } else { c };
        if c.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
            spaced.push(' ');
        }
        spaced.push(c);
        prev = Some(c);
    }

    let mut out = String::with_capacity(spaced.len());
    let mut prev_alpha = false;
    for c in spaced.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn container() -> ParameterContainer {
        ParameterContainer::new(
            Address::from("/composition/layers/1"),
            "/arena/composition/layers/layer1",
        )
    }

    #[test]
    fn titleizes_segments() {
        assert_eq!(titleize("video"), "Video");
        assert_eq!(titleize("blendMode"), "Blend Mode");
        assert_eq!(titleize("video_fx-chain"), "Video Fx Chain");
        assert_eq!(titleize("layer1"), "Layer1");
    }

    #[test]
    fn parameter_lands_in_lazily_created_parent_section() {
        let mut c = container();
        let param = ParameterDescriptor::new("/composition/layers/1/video/opacity", "Opacity", "Float")
            .with_bounds(0.0, 1.0)
            .with_order(3.0);

        assert!(c.sync_parameter(&param).unwrap());

        let section = c.section("/composition/layers/1/video").unwrap();
        assert_eq!(section.label, "Video");
        assert_eq!(section.widgets, vec![param.address.clone()]);

        let widget = c.widget("/composition/layers/1/video/opacity").unwrap();
        assert_eq!(widget.order, 3.0);
        assert_eq!(
            widget.kind,
            WidgetKind::Slider {
                min: Some(0.0),
                max: Some(1.0)
            }
        );
        assert_eq!(widget.value_address(), Some(&param.address));
    }

    #[test]
    fn existing_widget_is_left_alone() {
        let mut c = container();
        let param = ParameterDescriptor::new("/composition/layers/1/video/opacity", "Opacity", "Float");
        assert!(c.sync_parameter(&param).unwrap());

        let relabeled = ParameterDescriptor::new("/composition/layers/1/video/opacity", "Changed", "Toggle");
        assert!(!c.sync_parameter(&relabeled).unwrap());
        assert_eq!(c.widget("/composition/layers/1/video/opacity").unwrap().label, "Opacity");
    }

    #[test]
    fn sync_section_never_recreates() {
        let mut c = container();
        let addr = Address::from("/composition/layers/1/video");
        assert!(c.sync_section(&addr, "Video"));
        assert!(!c.sync_section(&addr, "Other"));
        assert_eq!(c.section("/composition/layers/1/video").unwrap().label, "Video");
    }

    #[test]
    fn header_menu_and_toggle_widgets() {
        let mut c = container();
        c.sync_parameter(&ParameterDescriptor::new("/composition/layers/1/video/fx", "Effects", "Header"))
            .unwrap();
        c.sync_parameter(
            &ParameterDescriptor::new("/composition/layers/1/video/blend", "Blend", "StrMenu")
                .with_menu(&["Add", "Alpha"]),
        )
        .unwrap();
        c.sync_parameter(&ParameterDescriptor::new("/composition/layers/1/bypassed", "Bypass", "Toggle"))
            .unwrap();

        let header = c.widget("/composition/layers/1/video/fx").unwrap();
        assert_eq!(header.kind, WidgetKind::Header);
        assert_eq!(header.value_address(), None);

        assert_eq!(
            c.widget("/composition/layers/1/video/blend").unwrap().kind,
            WidgetKind::Menu {
                labels: vec!["Add".to_string(), "Alpha".to_string()]
            }
        );
        assert_eq!(
            c.widget("/composition/layers/1/bypassed").unwrap().section.as_str(),
            "/composition/layers/1"
        );
        assert_eq!(c.section("/composition/layers/1").unwrap().label, "1");
    }

    #[test]
    fn wh_and_unknown_styles_make_no_widget() {
        let mut c = container();
        for style in ["WH", "RGBA"] {
            let err = c
                .sync_parameter(&ParameterDescriptor::new("/composition/layers/1/video/size", "Size", style))
                .unwrap_err();
            assert!(matches!(err, SyncError::UnsupportedStyle { .. }));
        }
        assert_eq!(c.widgets().count(), 0);
        assert_eq!(c.sections().count(), 0);
    }

    #[test]
    fn descriptor_reads_host_column_names() {
        let param: ParameterDescriptor = serde_json::from_str(
            r#"{"address": "/composition/layers/1/video/opacity", "label": "Opacity",
                "style": "Float", "normmin": 0.0, "normmax": 1.0, "order": 2}"#,
        )
        .unwrap();
        assert_eq!(param.style, Style::Float);
        assert_eq!(param.max_value, Some(1.0));
        assert_eq!(param.order, 2.0);
    }
}
