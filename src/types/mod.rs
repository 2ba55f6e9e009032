// src/types/mod.rs
pub mod question;
pub mod report;

pub use question::{
    FieldLocator, FieldSignals, FormQuestion, InputKind, PageButton, PageField, PageSnapshot,
};
pub use report::{
    ApplicationOutcome, FailedField, FillAction, FillReport, FilledField, SessionStats,
};
