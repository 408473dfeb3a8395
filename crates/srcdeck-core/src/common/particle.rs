//! Symbolic particle tags and their per-code spellings.

use crate::domain::{SourceError, SourceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Particle {
    Neutron,
    Photon,
    Electron,
    Positron,
    Proton,
    Deuteron,
    Triton,
    Helium3,
    Alpha,
    MuonMinus,
    MuonPlus,
    PionPlus,
    PionMinus,
}

impl Particle {
    pub fn parse(token: &str) -> SourceResult<Self> {
        let particle = match token.trim().to_ascii_lowercase().as_str() {
            "n" | "neutron" => Self::Neutron,
            "p" | "photon" | "gamma" => Self::Photon,
            "e" | "e-" | "electron" => Self::Electron,
            "f" | "e+" | "positron" => Self::Positron,
            "h" | "proton" => Self::Proton,
            "d" | "deuteron" => Self::Deuteron,
            "t" | "triton" => Self::Triton,
            "s" | "he3" | "3he" | "helion" => Self::Helium3,
            "a" | "alpha" | "he4" => Self::Alpha,
            "|" | "mu-" | "muon-" => Self::MuonMinus,
            "!" | "mu+" | "muon+" => Self::MuonPlus,
            "/" | "pi+" | "pion+" => Self::PionPlus,
            "*" | "pi-" | "pion-" => Self::PionMinus,
            other => {
                return Err(SourceError::configuration(
                    "CONFIG.PARTICLE_TYPE",
                    format!("unknown particle type '{}'", other),
                ));
            }
        };
        Ok(particle)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Neutron => "neutron",
            Self::Photon => "photon",
            Self::Electron => "electron",
            Self::Positron => "positron",
            Self::Proton => "proton",
            Self::Deuteron => "deuteron",
            Self::Triton => "triton",
            Self::Helium3 => "he3",
            Self::Alpha => "alpha",
            Self::MuonMinus => "muon-",
            Self::MuonPlus => "muon+",
            Self::PionPlus => "pion+",
            Self::PionMinus => "pion-",
        }
    }

    /// `par=` designator on the sdef card.
    pub const fn mcnp_symbol(self) -> &'static str {
        match self {
            Self::Neutron => "n",
            Self::Photon => "p",
            Self::Electron => "e",
            Self::Positron => "f",
            Self::Proton => "h",
            Self::Deuteron => "d",
            Self::Triton => "t",
            Self::Helium3 => "s",
            Self::Alpha => "a",
            Self::MuonMinus => "|",
            Self::MuonPlus => "!",
            Self::PionPlus => "/",
            Self::PionMinus => "*",
        }
    }

    /// `proj =` value in the PHITS [source] section.
    pub const fn phits_name(self) -> &'static str {
        match self {
            Self::Neutron => "neutron",
            Self::Photon => "photon",
            Self::Electron => "electron",
            Self::Positron => "positron",
            Self::Proton => "proton",
            Self::Deuteron => "deuteron",
            Self::Triton => "triton",
            Self::Helium3 => "3he",
            Self::Alpha => "alpha",
            Self::MuonMinus => "muon-",
            Self::MuonPlus => "muon+",
            Self::PionPlus => "pion+",
            Self::PionMinus => "pion-",
        }
    }

    /// SDUM of the FLUKA BEAM card.
    pub const fn fluka_name(self) -> &'static str {
        match self {
            Self::Neutron => "NEUTRON",
            Self::Photon => "PHOTON",
            Self::Electron => "ELECTRON",
            Self::Positron => "POSITRON",
            Self::Proton => "PROTON",
            Self::Deuteron => "DEUTERON",
            Self::Triton => "TRITON",
            Self::Helium3 => "3-HELIUM",
            Self::Alpha => "4-HELIUM",
            Self::MuonMinus => "MUON-",
            Self::MuonPlus => "MUON+",
            Self::PionPlus => "PION+",
            Self::PionMinus => "PION-",
        }
    }
}
