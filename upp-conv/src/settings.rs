use std::fmt;

/// The two convolution operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ConvolutionKind {
    /// `inf_{0 <= s <= t} f(s) + g(t - s)`
    MinPlus,
    /// `sup_{0 <= s <= t} f(s) + g(t - s)`
    MaxPlus,
}

/// The ways a convolution can be computed. All of them give the same values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Strategy {
    /// Every element pair over the horizon given by the period theorems
    Direct,
    /// Transient and periodic parts handled separately, the periodic part
    /// computed once over a single period of one operand
    Isospeed,
    /// Isospeed on minimised operands, with the cheaper role assignment
    SuperIsospeed,
    /// Through pseudo-inverses and the dual operator
    Inversion,
}

impl Strategy {
    /// Every strategy, in increasing order of sophistication
    pub const ALL: [Strategy; 4] = [
        Strategy::Direct,
        Strategy::Isospeed,
        Strategy::SuperIsospeed,
        Strategy::Inversion,
    ];
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Direct => "direct",
            Strategy::Isospeed => "isospeed",
            Strategy::SuperIsospeed => "super-isospeed",
            Strategy::Inversion => "inversion",
        })
    }
}

/// Knobs for the convolution engine.
///
/// The flags select a [`Strategy`] (see [`ConvolutionSettings::strategy`])
/// and two orthogonal speed-ups that never change the result.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct ConvolutionSettings {
    /// Split the operands into transient and periodic parts
    pub use_isomorphism_optimization: bool,
    /// Minimise the operands first and pick the cheaper role assignment;
    /// only meaningful together with `use_isomorphism_optimization`
    pub use_super_isomorphism_optimization: bool,
    /// Convolve a point with a whole sequence by translating it
    pub use_by_sequence_optimization: bool,
    /// Fan out independent work on the rayon pool
    pub use_parallelism: bool,
    /// Go through pseudo-inverses and the dual operator; the remaining flags
    /// then configure the inner convolution
    pub use_inversion: bool,
}

impl Default for ConvolutionSettings {
    fn default() -> Self {
        Self {
            use_isomorphism_optimization: true,
            use_super_isomorphism_optimization: false,
            use_by_sequence_optimization: true,
            use_parallelism: false,
            use_inversion: false,
        }
    }
}

impl ConvolutionSettings {
    /// The default speed-ups with the flags of `strategy`
    pub fn for_strategy(strategy: Strategy) -> Self {
        Self::default().with_strategy(strategy)
    }

    /// These settings with the strategy flags replaced
    pub fn with_strategy(self, strategy: Strategy) -> Self {
        let (isomorphism, super_isomorphism, inversion) = match strategy {
            Strategy::Direct => (false, false, false),
            Strategy::Isospeed => (true, false, false),
            Strategy::SuperIsospeed => (true, true, false),
            // The inner convolution keeps the default strategy
            Strategy::Inversion => (true, false, true),
        };
        Self {
            use_isomorphism_optimization: isomorphism,
            use_super_isomorphism_optimization: super_isomorphism,
            use_inversion: inversion,
            ..self
        }
    }

    /// The strategy the flags select
    pub fn strategy(&self) -> Strategy {
        if self.use_inversion {
            Strategy::Inversion
        } else if !self.use_isomorphism_optimization {
            Strategy::Direct
        } else if self.use_super_isomorphism_optimization {
            Strategy::SuperIsospeed
        } else {
            Strategy::Isospeed
        }
    }

    // What the inversion strategy runs underneath
    pub(crate) fn without_inversion(&self) -> Self {
        Self {
            use_inversion: false,
            ..self.clone()
        }
    }
}
