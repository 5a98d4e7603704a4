//! High-level convenience API.
//!
//! This layer provides [`Learner`], a stateful wrapper that keeps fitted
//! [`Axes`](crate::learn::Axes), cluster centers, regression models and a
//! [`DecisionTree`](crate::learn::DecisionTree) together and delegates to the
//! [`kernel`](crate::kernel) and [`learn`](crate::learn) layers.
//!
//! For library code, prefer importing from [`kernel`](crate::kernel) and
//! [`learn`](crate::learn) directly.

pub mod learner;

pub use learner::{Learner, LearnerConfig, LearnerSnapshot};
