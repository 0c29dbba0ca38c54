//! Mutual information estimation for aligned numeric sequences.
//!
//! The estimator is a 2-D equal-width histogram using the entropy-summation
//! form `I(X;Y) = H(X) + H(Y) - H(X,Y)`, reported in bits. Per-axis bin
//! counts come from the Freedman–Diaconis rule by default, with a fixed
//! count available for callers that know their data.

pub mod histogram;

pub use histogram::*;
