// Device API response types and the fixed module set
//
// Every status endpoint wraps its payload in the same envelope:
// `{ "data": { "attributes": { ... } } }`. Attribute values are kept as
// loose JSON because the field set differs per firmware and per module.

use std::collections::HashMap;

use serde::Deserialize;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Attribute name → value for one module.
pub type Attributes = HashMap<String, serde_json::Value>;

// ── Response Envelope ────────────────────────────────────────────────

/// Standard device response envelope.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope {
    pub data: ResourceData,
}

#[derive(Debug, Deserialize)]
pub struct ResourceData {
    pub attributes: Attributes,
}

// ── Modules ──────────────────────────────────────────────────────────

/// Endpoint root shared by a status module and its IO module.
///
/// Actions are dispatched per family, not per module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum Family {
    #[strum(to_string = "dfps", serialize = "dfp", serialize = "primary")]
    Dfp,
    #[strum(to_string = "tfps", serialize = "tfp", serialize = "secondary")]
    Tfp,
}

impl Family {
    /// Path segment under `/api/`.
    pub fn segment(self) -> &'static str {
        match self {
            Self::Dfp => "dfps",
            Self::Tfp => "tfps",
        }
    }
}

/// A logical device subsystem with its own attribute set and endpoint.
///
/// Parses from the short config names (`dfp`, `dfpIO`, `tfp`, `tfpIO`)
/// and from the role names (`primary-status`, `primary-io`, ...).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum Module {
    #[strum(to_string = "dfp", serialize = "primary-status")]
    Dfp,
    #[strum(to_string = "dfpIO", serialize = "primary-io")]
    DfpIo,
    #[strum(to_string = "tfp", serialize = "secondary-status")]
    Tfp,
    #[strum(to_string = "tfpIO", serialize = "secondary-io")]
    TfpIo,
}

impl Module {
    pub fn family(self) -> Family {
        match self {
            Self::Dfp | Self::DfpIo => Family::Dfp,
            Self::Tfp | Self::TfpIo => Family::Tfp,
        }
    }

    pub fn is_io(self) -> bool {
        matches!(self, Self::DfpIo | Self::TfpIo)
    }

    /// Endpoint path relative to the device base URL.
    pub fn path(self) -> String {
        let family = self.family().segment();
        if self.is_io() {
            format!("api/{family}/io")
        } else {
            format!("api/{family}")
        }
    }

    /// Role name used in logs and diagnostics.
    pub fn role(self) -> &'static str {
        match self {
            Self::Dfp => "primary-status",
            Self::DfpIo => "primary-io",
            Self::Tfp => "secondary-status",
            Self::TfpIo => "secondary-io",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn module_parses_short_and_role_names() {
        assert_eq!(Module::from_str("dfp").unwrap(), Module::Dfp);
        assert_eq!(Module::from_str("dfpIO").unwrap(), Module::DfpIo);
        assert_eq!(Module::from_str("tfp").unwrap(), Module::Tfp);
        assert_eq!(Module::from_str("secondary-io").unwrap(), Module::TfpIo);
        assert!(Module::from_str("tank").is_err());
        assert!(Module::from_str("").is_err());
    }

    #[test]
    fn module_display_round_trips_to_config_name() {
        for module in Module::iter() {
            assert_eq!(Module::from_str(&module.to_string()).unwrap(), module);
        }
    }

    #[test]
    fn module_paths() {
        assert_eq!(Module::Dfp.path(), "api/dfps");
        assert_eq!(Module::DfpIo.path(), "api/dfps/io");
        assert_eq!(Module::Tfp.path(), "api/tfps");
        assert_eq!(Module::TfpIo.path(), "api/tfps/io");
    }

    #[test]
    fn io_modules_share_family_actions() {
        assert_eq!(Module::DfpIo.family(), Family::Dfp);
        assert_eq!(Module::TfpIo.family(), Family::Tfp);
        assert_eq!(Family::from_str("tfp").unwrap(), Family::Tfp);
    }

    #[test]
    fn envelope_requires_attributes() {
        let ok: DataEnvelope =
            serde_json::from_str(r#"{"data":{"attributes":{"temp":42}}}"#).unwrap();
        assert_eq!(ok.data.attributes["temp"], 42);

        let missing = serde_json::from_str::<DataEnvelope>(r#"{"data":{}}"#);
        assert!(missing.is_err());
    }
}
