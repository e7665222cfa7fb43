//! Linkage-variant dispatch onto the external clustering collaborator.
//!
//! Maps a requested algorithm variant and linkage rule onto exactly one of
//! the collaborator's entry points, resolving every argument up front so the
//! timed loop drives a pre-bound routine. The harness never inspects the
//! dendrogram the collaborator returns.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;

use kodama::{Method, MethodChain};

/// Errors raised while resolving a variant and rule to an entry point.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The rule identifier is not in the recognised set.
    #[error("unknown linkage rule `{rule}`")]
    UnknownRule {
        /// Raw rule identifier supplied by the caller.
        rule: String,
    },
    /// The rule is recognised but has no nearest-neighbour-chain form.
    #[error("linkage rule `{rule}` has no nearest-neighbour-chain form")]
    ChainUnsupported {
        /// Rule that cannot drive the chain variant.
        rule: LinkageRule,
    },
}

/// Errors raised by the collaborator during an invocation.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    /// The linkage routine panicked instead of returning.
    #[error("linkage routine `{variant}` panicked: {message}")]
    Panicked {
        /// Label of the invoked variant.
        variant: &'static str,
        /// Payload recovered from the panic, when printable.
        message: String,
    },
}

/// Inter-cluster distance-update formulae recognised by the collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkageRule {
    /// Minimum pairwise distance between members.
    Single,
    /// Maximum pairwise distance between members.
    Complete,
    /// Unweighted average of pairwise distances.
    Average,
    /// Weighted average of pairwise distances.
    Weighted,
    /// Ward's minimum-variance criterion.
    Ward,
    /// Distance between cluster centroids.
    Centroid,
    /// Distance between cluster medians.
    Median,
}

impl LinkageRule {
    /// Returns the collaborator's generic-path method for this rule.
    #[must_use]
    pub const fn method(self) -> Method {
        match self {
            Self::Single => Method::Single,
            Self::Complete => Method::Complete,
            Self::Average => Method::Average,
            Self::Weighted => Method::Weighted,
            Self::Ward => Method::Ward,
            Self::Centroid => Method::Centroid,
            Self::Median => Method::Median,
        }
    }

    /// Returns the chain-path method, or `None` for the rules the
    /// nearest-neighbour-chain algorithm cannot compute.
    #[must_use]
    pub const fn chain_method(self) -> Option<MethodChain> {
        match self {
            Self::Single => Some(MethodChain::Single),
            Self::Complete => Some(MethodChain::Complete),
            Self::Average => Some(MethodChain::Average),
            Self::Weighted => Some(MethodChain::Weighted),
            Self::Ward => Some(MethodChain::Ward),
            Self::Centroid | Self::Median => None,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Complete => "complete",
            Self::Average => "average",
            Self::Weighted => "weighted",
            Self::Ward => "ward",
            Self::Centroid => "centroid",
            Self::Median => "median",
        }
    }
}

impl fmt::Display for LinkageRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LinkageRule {
    type Err = DispatchError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "single" => Ok(Self::Single),
            "complete" => Ok(Self::Complete),
            "average" => Ok(Self::Average),
            "weighted" => Ok(Self::Weighted),
            "ward" => Ok(Self::Ward),
            "centroid" => Ok(Self::Centroid),
            "median" => Ok(Self::Median),
            other => Err(DispatchError::UnknownRule {
                rule: other.to_owned(),
            }),
        }
    }
}

/// Interchangeable strategies for computing the same linkage result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Variant {
    /// Minimum-spanning-tree single linkage.
    Mst,
    /// Nearest-neighbour-chain linkage.
    Chain,
    /// Generic priority-queue linkage; the fallback when no specialised
    /// fast path exists for the requested rule.
    #[default]
    Generic,
}

impl Variant {
    /// Resolves this variant and `raw_rule` to a bound entry point.
    ///
    /// The `mst` variant computes single linkage unconditionally and never
    /// inspects `raw_rule`; the other variants parse it first.
    ///
    /// # Errors
    /// Returns [`DispatchError`] when a variant that requires a rule
    /// receives an unknown identifier, or the chain variant receives a rule
    /// with no chain form.
    pub fn bind(self, raw_rule: &str) -> Result<BoundLinkage, DispatchError> {
        match self {
            Self::Mst => Ok(BoundLinkage::Mst),
            Self::Chain => {
                let rule = LinkageRule::from_str(raw_rule)?;
                rule.chain_method()
                    .map(BoundLinkage::Chain)
                    .ok_or(DispatchError::ChainUnsupported { rule })
            }
            Self::Generic => Ok(BoundLinkage::Generic(
                LinkageRule::from_str(raw_rule)?.method(),
            )),
        }
    }

    /// Returns the variant's identifier.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mst => "mst",
            Self::Chain => "chain",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A variant with its collaborator arguments fully resolved.
#[derive(Clone, Copy, Debug)]
pub enum BoundLinkage {
    /// `kodama::mst`; single linkage, no rule parameter.
    Mst,
    /// `kodama::nnchain` with the resolved chain method.
    Chain(MethodChain),
    /// `kodama::generic` with the resolved method.
    Generic(Method),
}

impl BoundLinkage {
    /// Runs the bound linkage routine over `condensed`, discarding the
    /// dendrogram. The routine reorders `condensed` in place, so callers
    /// must hand over a copy they no longer need.
    ///
    /// # Errors
    /// Returns [`InvocationError`] when the collaborator panics; the panic
    /// is captured so the run can abort with a typed, stage-named error.
    pub fn invoke(
        &self,
        condensed: &mut [f64],
        observations: usize,
    ) -> Result<(), InvocationError> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match self {
            Self::Mst => {
                let _dendrogram = kodama::mst(condensed, observations);
            }
            Self::Chain(method) => {
                let _dendrogram = kodama::nnchain(condensed, observations, *method);
            }
            Self::Generic(method) => {
                let _dendrogram = kodama::generic(condensed, observations, *method);
            }
        }));
        outcome.map_err(|payload| InvocationError::Panicked {
            variant: self.label(),
            message: panic_message(payload.as_ref()),
        })
    }

    /// Returns the identifier of the underlying variant.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Mst => "mst",
            Self::Chain(_) => "chain",
            Self::Generic(_) => "generic",
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| {
            payload
                .downcast_ref::<&str>()
                .map(|message| (*message).to_owned())
        })
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}
