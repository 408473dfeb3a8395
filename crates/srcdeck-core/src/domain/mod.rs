pub mod errors;

pub use errors::{SourceError, SourceErrorCategory, SourceResult};

use std::fmt::{Display, Formatter};

/// Monte-Carlo transport code a deck is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetCode {
    Mcnp,
    Phits,
    Fluka,
}

impl TargetCode {
    pub const ALL: [TargetCode; 3] = [Self::Mcnp, Self::Phits, Self::Fluka];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mcnp => "MCNP",
            Self::Phits => "PHITS",
            Self::Fluka => "FLUKA",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "mcnp" | "mcnpx" | "mcnp6" => Some(Self::Mcnp),
            "phits" => Some(Self::Phits),
            "fluka" => Some(Self::Fluka),
            _ => None,
        }
    }
}

impl Display for TargetCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Point,
    Beam,
    GaussBeam,
    Rectangle,
    Parabolic,
    Gamma,
    SurfNorm,
    FlukaSource,
    FlukaExternal,
    Tdc,
    Synchrotron,
    Lens,
    Activation,
    KCode,
}

impl SourceKind {
    pub const ALL: [SourceKind; 14] = [
        Self::Point,
        Self::Beam,
        Self::GaussBeam,
        Self::Rectangle,
        Self::Parabolic,
        Self::Gamma,
        Self::SurfNorm,
        Self::FlukaSource,
        Self::FlukaExternal,
        Self::Tdc,
        Self::Synchrotron,
        Self::Lens,
        Self::Activation,
        Self::KCode,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Beam => "beam",
            Self::GaussBeam => "gauss-beam",
            Self::Rectangle => "rectangle",
            Self::Parabolic => "parabolic",
            Self::Gamma => "gamma",
            Self::SurfNorm => "surf-norm",
            Self::FlukaSource => "fluka-source",
            Self::FlukaExternal => "fluka-external",
            Self::Tdc => "tdc",
            Self::Synchrotron => "synchrotron",
            Self::Lens => "lens",
            Self::Activation => "activation",
            Self::KCode => "kcode",
        }
    }

    /// Accepts the CLI spelling as well as the variable-table class names
    /// (`GaussBeamSource`, `kcodeSource`, ...).
    pub fn parse(token: &str) -> Option<Self> {
        let normalized = token
            .trim()
            .to_ascii_lowercase()
            .replace(['-', '_'], "");
        let normalized = normalized
            .strip_suffix("source")
            .filter(|stem| !stem.is_empty() && *stem != "fluka")
            .unwrap_or(&normalized);

        match normalized {
            "point" => Some(Self::Point),
            "beam" => Some(Self::Beam),
            "gaussbeam" | "gauss" => Some(Self::GaussBeam),
            "rectangle" => Some(Self::Rectangle),
            "parabolic" => Some(Self::Parabolic),
            "gamma" => Some(Self::Gamma),
            "surfnorm" => Some(Self::SurfNorm),
            "flukasource" | "fluka" => Some(Self::FlukaSource),
            "flukaexternal" => Some(Self::FlukaExternal),
            "tdc" => Some(Self::Tdc),
            "synchrotron" | "synchrotonbeam" | "synchrotronbeam" => Some(Self::Synchrotron),
            "lens" => Some(Self::Lens),
            "activation" => Some(Self::Activation),
            "kcode" => Some(Self::KCode),
            _ => None,
        }
    }

    /// Which transport codes have a writer for this kind.
    pub const fn supports(self, code: TargetCode) -> bool {
        match code {
            TargetCode::Mcnp => !matches!(self, Self::FlukaSource | Self::FlukaExternal),
            TargetCode::Phits => matches!(
                self,
                Self::Point | Self::Beam | Self::GaussBeam | Self::Rectangle | Self::Gamma
            ),
            TargetCode::Fluka => matches!(
                self,
                Self::Point
                    | Self::Beam
                    | Self::GaussBeam
                    | Self::Rectangle
                    | Self::FlukaSource
                    | Self::FlukaExternal
            ),
        }
    }

    pub const fn requires_placement(self) -> bool {
        !matches!(self, Self::KCode)
    }
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Build state of a source model. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Lifecycle {
    #[default]
    Unpopulated,
    Populated,
    Placed,
}

impl Lifecycle {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpopulated => "unpopulated",
            Self::Populated => "populated",
            Self::Placed => "placed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Lifecycle, SourceKind, TargetCode};

    #[test]
    fn kind_names_round_trip_through_parser() {
        for kind in SourceKind::ALL {
            assert_eq!(SourceKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(SourceKind::parse("GaussBeamSource"), Some(SourceKind::GaussBeam));
        assert_eq!(SourceKind::parse("kcodeSource"), Some(SourceKind::KCode));
        assert_eq!(SourceKind::parse("FlukaSource"), Some(SourceKind::FlukaSource));
        assert_eq!(SourceKind::parse("SynchrotonBeam"), Some(SourceKind::Synchrotron));
        assert_eq!(SourceKind::parse("cube"), None);
    }

    #[test]
    fn fluka_only_kinds_have_no_mcnp_writer() {
        assert!(!SourceKind::FlukaSource.supports(TargetCode::Mcnp));
        assert!(!SourceKind::FlukaExternal.supports(TargetCode::Phits));
        assert!(SourceKind::FlukaExternal.supports(TargetCode::Fluka));
        assert!(SourceKind::KCode.supports(TargetCode::Mcnp));
        assert!(!SourceKind::KCode.supports(TargetCode::Fluka));
    }

    #[test]
    fn target_code_parser_accepts_common_spellings() {
        assert_eq!(TargetCode::parse("MCNP6"), Some(TargetCode::Mcnp));
        assert_eq!(TargetCode::parse(" phits "), Some(TargetCode::Phits));
        assert_eq!(TargetCode::parse("geant"), None);
    }

    #[test]
    fn lifecycle_is_ordered() {
        assert!(Lifecycle::Unpopulated < Lifecycle::Populated);
        assert!(Lifecycle::Populated < Lifecycle::Placed);
        assert_eq!(Lifecycle::default(), Lifecycle::Unpopulated);
    }
}
