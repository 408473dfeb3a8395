use crate::domain::{SourceError, SourceResult};

/// Built-in MCNP sampling functions selected by a negative code on an
/// `sp`/`sb` card instead of an explicit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParametricLaw {
    /// -2: Maxwell fission spectrum, temperature a.
    Maxwell,
    /// -3: Watt fission spectrum, a and b.
    Watt,
    /// -4: Gaussian fusion spectrum, width a and energy b.
    GaussianFusion,
    /// -5: evaporation spectrum, temperature a.
    Evaporation,
    /// -6: Muir velocity Gaussian, a and b.
    Muir,
    /// -21: power law |x|^a.
    PowerLaw,
    /// -31: exponential exp(a x).
    Exponential,
    /// -41: Gaussian, FWHM a and centroid b.
    Gaussian,
}

impl ParametricLaw {
    pub const ALL: [ParametricLaw; 8] = [
        Self::Maxwell,
        Self::Watt,
        Self::GaussianFusion,
        Self::Evaporation,
        Self::Muir,
        Self::PowerLaw,
        Self::Exponential,
        Self::Gaussian,
    ];

    pub const fn code(self) -> i32 {
        match self {
            Self::Maxwell => -2,
            Self::Watt => -3,
            Self::GaussianFusion => -4,
            Self::Evaporation => -5,
            Self::Muir => -6,
            Self::PowerLaw => -21,
            Self::Exponential => -31,
            Self::Gaussian => -41,
        }
    }

    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            -2 => Some(Self::Maxwell),
            -3 => Some(Self::Watt),
            -4 => Some(Self::GaussianFusion),
            -5 => Some(Self::Evaporation),
            -6 => Some(Self::Muir),
            -21 => Some(Self::PowerLaw),
            -31 => Some(Self::Exponential),
            -41 => Some(Self::Gaussian),
            _ => None,
        }
    }

    pub const fn parameter_count(self) -> usize {
        match self {
            Self::Maxwell | Self::Evaporation | Self::PowerLaw | Self::Exponential => 1,
            Self::Watt | Self::GaussianFusion | Self::Muir | Self::Gaussian => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Maxwell => "maxwell",
            Self::Watt => "watt",
            Self::GaussianFusion => "gaussian-fusion",
            Self::Evaporation => "evaporation",
            Self::Muir => "muir",
            Self::PowerLaw => "power-law",
            Self::Exponential => "exponential",
            Self::Gaussian => "gaussian",
        }
    }

    pub fn check_parameters(self, params: &[f64]) -> SourceResult<()> {
        if params.len() != self.parameter_count() {
            return Err(SourceError::validation(
                "INPUT.PARAMETRIC_LAW_ARITY",
                format!(
                    "{} law ({}) takes {} parameter(s), got {}",
                    self.name(),
                    self.code(),
                    self.parameter_count(),
                    params.len()
                ),
            ));
        }
        Ok(())
    }

    pub fn parse_code(code: i32) -> SourceResult<Self> {
        Self::from_code(code).ok_or_else(|| {
            SourceError::validation(
                "INPUT.PARAMETRIC_LAW",
                format!("invalid parametric law code {}", code),
            )
        })
    }
}
