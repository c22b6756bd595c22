//! Rotation core
//!
//! The decision procedure for one server's backup rotation, kept free of any
//! HTTP or presentation concern. The panel and the operator prompt plug in
//! through the `BackupRegistry` and `DecisionSource` traits.

mod controller;

pub use controller::{
    backup_name, rotate, BackupRegistry, Decision, DecisionAction, DecisionSource,
    RotationOutcome,
};
