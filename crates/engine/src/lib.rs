//! The constant-expression evaluator (E) and the type-directed matcher (M)
//! over `semcore`'s value and type model.
//!
//! `eval` folds expressions to constants at one of three intensities;
//! `matcher` answers the four overload-resolution/conversion questions —
//! can this expression match this destination type, how well, what type
//! would result, and rewrite it so that it does — with a single decision
//! tree shared across all four modes (§4.3.1).

pub mod eval;
pub mod matcher;

pub use eval::{fold_expr, Intensity};
pub use matcher::{can_match, match_expression, matched_type, match_level, Mode};
