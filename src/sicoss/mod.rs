//! SICOSS computation core.
//!
//! Stage modules compose leaves-first: `extractor` produces the raw tables,
//! `consolidator` folds concepts into per-employee aggregates, `calculator`
//! derives the secondary bases, `cap_engine` applies statutory caps and the
//! differential-category rule, `validator` filters the surviving set,
//! `aggregator` totals it, and `persister` writes it. `pipeline` wires all
//! of the above into one run; `service` adds run-level locking and
//! cancellation; `handlers` exposes it over HTTP (the ApiFacade).

pub mod aggregator;
pub mod calculator;
pub mod cap_engine;
pub mod consolidator;
pub mod extractor;
pub mod handlers;
pub mod persister;
pub mod pipeline;
pub mod service;
pub mod validator;

pub use pipeline::{run_pipeline, PipelineOutcome};
pub use service::SicossService;
