use std::fmt;

use log::debug;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::FORMAT_QUERY_KEY;

/// Canonical stereoscopic format codes understood by the VR player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VrFormat {
    Stereo360Lr,
    Stereo360Tb,
    Stereo180Lr,
    Stereo180Tb,
    StereoFlatLr,
    StereoFlatTb,
    Mono360,
    MonoFlat,
}

impl VrFormat {
    /// The wire string written onto the player element
    pub fn as_str(&self) -> &'static str {
        match self {
            VrFormat::Stereo360Lr => "STEREO_360_LR",
            VrFormat::Stereo360Tb => "STEREO_360_TB",
            VrFormat::Stereo180Lr => "STEREO_180_LR",
            VrFormat::Stereo180Tb => "STEREO_180_TB",
            VrFormat::StereoFlatLr => "STEREO_FLAT_LR",
            VrFormat::StereoFlatTb => "STEREO_FLAT_TB",
            VrFormat::Mono360 => "MONO_360",
            VrFormat::MonoFlat => "MONO_FLAT",
        }
    }
}

impl fmt::Display for VrFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Eye-layout value as delivered by the backend: a numeric code (1-4) or a
/// string label such as `"MONO"`. Anything unrecognized resolves to
/// [`VrFormat::Mono360`], so malformed configuration still renders.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum StereoType {
    Code(i64),
    Label(String),
}

/// Projection code for a full 360 degree sphere
pub const PROJECTION_360: i64 = 2;

/// Projection code for a flat field of view
pub const PROJECTION_FLAT: i64 = 1;

/// Map (projection, stereo type) to the player's format code.
///
/// Total function: unknown stereo types fall back to `MONO_360` rather than
/// failing, since the player must always render something reasonable.
pub fn resolve_format(projection: i64, stereo_type: &StereoType) -> VrFormat {
    match stereo_type {
        StereoType::Code(1) => {
            if projection == PROJECTION_360 {
                VrFormat::Stereo360Lr
            } else {
                VrFormat::Stereo180Lr
            }
        }
        StereoType::Code(2) => {
            if projection == PROJECTION_360 {
                VrFormat::Stereo360Tb
            } else {
                VrFormat::Stereo180Tb
            }
        }
        StereoType::Code(3) => {
            if projection == PROJECTION_360 {
                VrFormat::Stereo360Lr
            } else {
                VrFormat::StereoFlatLr
            }
        }
        StereoType::Code(4) => {
            if projection == PROJECTION_360 {
                VrFormat::Stereo360Tb
            } else {
                VrFormat::StereoFlatTb
            }
        }
        StereoType::Label(label) if label == "MONO" => {
            if projection == PROJECTION_FLAT {
                VrFormat::MonoFlat
            } else {
                VrFormat::Mono360
            }
        }
        _ => VrFormat::Mono360,
    }
}

/// Set, replace, or remove a query parameter in a URL string.
///
/// The key is matched case-insensitively. `Some(value)` replaces an existing
/// `key=...` pair in place or appends one (before any `#fragment`, with `?`
/// or `&` as appropriate); `None` removes the pair along with its separator.
/// The rest of the string is preserved verbatim, and applying the same call
/// twice yields the same result as applying it once.
pub fn upsert_query_param(key: &str, value: Option<&str>, uri: &str) -> String {
    let re = match Regex::new(&format!(r"(?i)([?&]){}=.*?(&|#|$)", regex::escape(key))) {
        Ok(re) => re,
        // Escaped keys always compile; keep the URL untouched if not
        Err(_) => return uri.to_string(),
    };

    match value {
        None => re
            .replace(uri, |caps: &Captures| {
                // Keep the leading separator only when another pair follows
                if &caps[2] == "&" {
                    caps[1].to_string()
                } else {
                    caps[2].to_string()
                }
            })
            .into_owned(),
        Some(value) => {
            if re.is_match(uri) {
                re.replace(uri, |caps: &Captures| {
                    format!("{}{}={}{}", &caps[1], key, value, &caps[2])
                })
                .into_owned()
            } else {
                // Append before the fragment so the parameter stays in the query
                let (base, hash) = match uri.find('#') {
                    Some(pos) => uri.split_at(pos),
                    None => (uri, ""),
                };
                let separator = if base.contains('?') { '&' } else { '?' };
                format!("{}{}{}={}{}", base, separator, key, value, hash)
            }
        }
    }
}

/// Synthetic base for inspecting the query of relative URLs
const QUERY_BASE: &str = "http://viewtrack.invalid/";

/// Read a decoded query parameter from a URL string.
///
/// Relative fallback URLs are resolved against a synthetic base so they
/// decode exactly like absolute ones.
pub fn query_param(name: &str, url: &str) -> Option<String> {
    let parsed = Url::parse(url)
        .or_else(|_| Url::parse(QUERY_BASE).and_then(|base| base.join(url)))
        .ok()?;

    parsed
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Attribute values the page glue writes onto the VR player element
#[derive(Debug, Clone, PartialEq)]
pub struct VrAttributes {
    /// Value for the element's `format` attribute
    pub format: String,
    /// Value for the element's `cors-fallback-url` attribute
    pub cors_fallback_url: String,
}

/// Stereo layout properties attached to a VR-tagged video
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VrProps {
    pub projection: i64,
    pub stereo_type: StereoType,
}

/// Resolve the format for a VR video and propagate it into the fallback URL.
pub fn vr_attributes(props: &VrProps, fallback_url: &str) -> VrAttributes {
    let format = resolve_format(props.projection, &props.stereo_type);
    let cors_fallback_url = upsert_query_param(FORMAT_QUERY_KEY, Some(format.as_str()), fallback_url);

    debug!(
        "resolved VR format {} (projection {}, stereo {:?})",
        format, props.projection, props.stereo_type
    );

    VrAttributes {
        format: format.to_string(),
        cors_fallback_url,
    }
}
