//! Address transcoding between the numeric wire form and the expanded graph form.
//!
//! Numeric:  /composition/layers/1/clips/2/video/opacity
//! Expanded: <root>/layers/layer1/clips/clip2/video + leaf `opacity`
//! Export:   layers/layer1/clips/clip2/video:opacity
//!
//! The grammars below are a compatibility contract with the host's numbering
//! scheme and are covered by round-trip tests; change them together.

use crate::address::Address;
use crate::error::{SyncError, SyncResult};

use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::LazyLock;

/// Numeric address: `/composition` followed by one or more non-empty segments.
/// Expanded id pairs (`/layers/layer1`) are rejected separately.
pub const NUMERIC_ADDRESS_RE: &str = r"^/composition(?:/[^/:\s]+)+$";

/// Numeric id segment pair inside an address: `/layers/1`.
pub const NUMERIC_ID_SEGMENT_RE: &str = r"/(layer|clip|deck|effect)s/(\d+)";

/// Expanded id segment pair inside a graph path: `/layers/layer1`.
pub const EXPANDED_ID_SEGMENT_RE: &str = r"/(layer|clip|deck|effect)s/(layer|clip|deck|effect)(\d+)";

/// Export name: optional composition-relative path, `:`, leaf.
pub const EXPORT_NAME_RE: &str = r"^((?:[^/:\s]+/)*[^/:\s]+)?:([^/:\s]+)$";

/// Marks where the composition-relative part of a graph path begins.
pub const COMPOSITION_MARKER_RE: &str = r"/composition(?:/|$)";

pub const DECK_ID_RE: &str = r"^/composition/decks/(\d+)(?:/|$)";
pub const LAYER_ID_RE: &str = r"^/composition/layers/(\d+)(?:/|$)";
pub const CLIP_ID_RE: &str = r"^/composition/clips/(\d+)(?:/|$)";
pub const EFFECT_LOCATION_RE: &str = r"^(/composition/.*/effects)/(\d+)(?:/.*)?$";
pub const EFFECT_CONTAINER_RE: &str = r"^(/composition/.*/effects)(?:/.*)?$";
pub const DECK_LOCATION_RE: &str = r"^/selecteddeck/layers/(\d+)/clips/(\d+)(?:/.*)?$";

const COMPOSITION_PREFIX: &str = "/composition";

macro_rules! grammar {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect("address grammar must compile"));
    };
}

grammar!(NUMERIC_ADDRESS, NUMERIC_ADDRESS_RE);
grammar!(NUMERIC_ID_SEGMENT, NUMERIC_ID_SEGMENT_RE);
grammar!(EXPANDED_ID_SEGMENT, EXPANDED_ID_SEGMENT_RE);
grammar!(EXPORT_NAME, EXPORT_NAME_RE);
grammar!(COMPOSITION_MARKER, COMPOSITION_MARKER_RE);
grammar!(DECK_ID, DECK_ID_RE);
grammar!(LAYER_ID, LAYER_ID_RE);
grammar!(CLIP_ID, CLIP_ID_RE);
grammar!(EFFECT_LOCATION, EFFECT_LOCATION_RE);
grammar!(EFFECT_CONTAINER, EFFECT_CONTAINER_RE);
grammar!(DECK_LOCATION, DECK_LOCATION_RE);

/// Graph location of a value: the owning container path plus the leaf name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueLocation {
    pub container: String,
    pub leaf: String,
}

impl ValueLocation {
    /// Full graph path of the value (`container/leaf`).
    pub fn path(&self) -> String {
        format!("{}/{}", self.container, self.leaf)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectLocation {
    pub container_address: String,
    pub effect_id: u32,
}

/// Layer and clip selected on the active deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeckLocation {
    pub layer: u32,
    pub clip: u32,
}

/// Every structural id that can be read out of one address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    pub deck: Option<u32>,
    pub layer: Option<u32>,
    pub clip: Option<u32>,
    pub effect: Option<EffectLocation>,
    pub effect_container: Option<String>,
    pub selected_deck: Option<DeckLocation>,
}

impl Location {
    pub fn of(address: &str) -> Self {
        Self {
            deck: parse_deck_id(address).ok(),
            layer: parse_layer_id(address).ok(),
            clip: parse_clip_id(address).ok(),
            effect: parse_effect_location(address).ok(),
            effect_container: parse_effect_container(address).ok(),
            selected_deck: parse_deck_location(address).ok(),
        }
    }
}

/// `/composition/layers/1/video/opacity` → (`<root>/layers/layer1/video`, `opacity`).
pub fn expand_address(address: &str, graph_root: &str) -> SyncResult<ValueLocation> {
    if !NUMERIC_ADDRESS.is_match(address) {
        return Err(SyncError::malformed("a numeric /composition/... address", address));
    }
    // `/effects/effect2` would collapse to `/effects/2`, so it is not numeric.
    let has_expanded_id = EXPANDED_ID_SEGMENT
        .captures_iter(address)
        .any(|caps| caps[1] == caps[2] && ends_segment(address, &caps));
    if has_expanded_id {
        return Err(SyncError::malformed(
            "a numeric address without expanded <kind>s/<kind><N> segments",
            address,
        ));
    }

    let expanded = NUMERIC_ID_SEGMENT.replace_all(address, |caps: &Captures| {
        if !ends_segment(address, caps) {
            return caps[0].to_string();
        }
        format!("/{kind}s/{kind}{id}", kind = &caps[1], id = &caps[2])
    });

    let relative = expanded
        .strip_prefix(COMPOSITION_PREFIX)
        .unwrap_or(expanded.as_ref());
    let rooted = format!("{}{}", graph_root, relative);
    match rooted.rsplit_once('/') {
        Some((container, leaf)) => Ok(ValueLocation {
            container: container.to_string(),
            leaf: leaf.to_string(),
        }),
        None => Err(SyncError::malformed("a numeric /composition/... address", address)),
    }
}

/// `/root/render/composition/layers/layer1/video/opacity` → `/composition/layers/1/video/opacity`.
///
/// Anything before the first `/composition` segment is dropped.
pub fn collapse_address(path: &str) -> SyncResult<Address> {
    let start = COMPOSITION_MARKER
        .find(path)
        .map(|m| m.start())
        .ok_or_else(|| SyncError::malformed("a graph path containing /composition", path))?;
    let relative = &path[start..];

    let collapsed = EXPANDED_ID_SEGMENT.replace_all(relative, |caps: &Captures| {
        if caps[1] != caps[2] || !ends_segment(relative, caps) {
            return caps[0].to_string();
        }
        format!("/{}s/{}", &caps[1], &caps[3])
    });

    Ok(Address::new(collapsed.into_owned()))
}

/// `/composition/layers/1/video/opacity` → `layers/layer1/video:opacity`.
pub fn address_to_export_name(address: &str) -> SyncResult<String> {
    let location = expand_address(address, "")?;
    Ok(format!(
        "{}:{}",
        location.container.trim_start_matches('/'),
        location.leaf
    ))
}

/// `layers/layer1/video:opacity` → `/composition/layers/1/video/opacity`.
pub fn export_name_to_address(export_name: &str) -> SyncResult<Address> {
    let caps = EXPORT_NAME
        .captures(export_name)
        .ok_or_else(|| SyncError::malformed("an export name <path>:<leaf>", export_name))?;
    let leaf = &caps[2];

    // The leaf may itself be an id (`layers:layer1`), so collapse the whole path.
    let expanded = match caps.get(1) {
        Some(path) => format!("{}/{}/{}", COMPOSITION_PREFIX, path.as_str(), leaf),
        None => format!("{}/{}", COMPOSITION_PREFIX, leaf),
    };
    collapse_address(&expanded)
}

pub fn parse_deck_id(address: &str) -> SyncResult<u32> {
    let caps = captures(&DECK_ID, address, "a deck address /composition/decks/<N>")?;
    parse_id(&caps[1], address)
}

pub fn parse_layer_id(address: &str) -> SyncResult<u32> {
    let caps = captures(&LAYER_ID, address, "a layer address /composition/layers/<N>")?;
    parse_id(&caps[1], address)
}

pub fn parse_clip_id(address: &str) -> SyncResult<u32> {
    let caps = captures(&CLIP_ID, address, "a clip address /composition/clips/<N>")?;
    parse_id(&caps[1], address)
}

pub fn parse_effect_location(address: &str) -> SyncResult<EffectLocation> {
    let caps = captures(
        &EFFECT_LOCATION,
        address,
        "an effect address /composition/.../effects/<N>",
    )?;
    Ok(EffectLocation {
        container_address: caps[1].to_string(),
        effect_id: parse_id(&caps[2], address)?,
    })
}

pub fn parse_effect_container(address: &str) -> SyncResult<String> {
    let caps = captures(
        &EFFECT_CONTAINER,
        address,
        "an effect container address /composition/.../effects",
    )?;
    Ok(caps[1].to_string())
}

pub fn parse_deck_location(address: &str) -> SyncResult<DeckLocation> {
    let caps = captures(
        &DECK_LOCATION,
        address,
        "a selected deck address /selecteddeck/layers/<N>/clips/<M>",
    )?;
    Ok(DeckLocation {
        layer: parse_id(&caps[1], address)?,
        clip: parse_id(&caps[2], address)?,
    })
}

fn captures<'a>(
    re: &Regex,
    address: &'a str,
    grammar: &'static str,
) -> SyncResult<Captures<'a>> {
    re.captures(address)
        .ok_or_else(|| SyncError::malformed(grammar, address))
}

fn parse_id(digits: &str, address: &str) -> SyncResult<u32> {
    digits
        .parse::<u32>()
        .map_err(|_| SyncError::malformed("an id that fits in 32 bits", address))
}

// A rewrite only applies when the digits run to the end of their segment:
// `/layers/12abc` is a name, not layer 12.
fn ends_segment(haystack: &str, caps: &Captures) -> bool {
    caps.get(0)
        .map(|m| haystack[m.end()..].is_empty() || haystack[m.end()..].starts_with('/'))
        .unwrap_or(false)
}
