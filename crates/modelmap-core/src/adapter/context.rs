//! Per-call conversion state
//!
//! Copyright (c) 2025 Modelmap Team
//! Licensed under the Apache-2.0 license

use super::cache::CompiledModel;
use crate::error::{ConversionError, Result};
use std::fmt;
use std::sync::Arc;

/// Direction of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// JSON → model
    Decode,
    /// Model → JSON
    Encode,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Decode => f.write_str("decode"),
            Direction::Encode => f.write_str("encode"),
        }
    }
}

/// Progress of a single-object conversion.
///
/// Stages only move forward. Any non-terminal stage may jump to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConversionStage {
    Start,
    SourceValidated,
    ClassResolved,
    SchemaReady,
    PropertiesConverted,
    Validated,
    Done,
    Failed,
}

impl ConversionStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, ConversionStage::Done | ConversionStage::Failed)
    }
}

/// State of one `decode`/`encode` call. Never shared across calls.
///
/// Conversions are all-or-nothing, so the only error a context records is the
/// first one, returned by [`ConversionContext::fail`].
#[derive(Debug)]
pub struct ConversionContext {
    model: &'static str,
    direction: Direction,
    stage: ConversionStage,
    compiled: Option<Arc<CompiledModel>>,
}

impl ConversionContext {
    pub(crate) fn new(model: &'static str, direction: Direction) -> Self {
        Self {
            model,
            direction,
            stage: ConversionStage::Start,
            compiled: None,
        }
    }

    pub fn model(&self) -> &'static str {
        self.model
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn stage(&self) -> ConversionStage {
        self.stage
    }

    /// Schema the conversion runs against, set once `SchemaReady` is reached.
    /// Class-cluster dispatch hands off before that, so it stays `None` there.
    pub fn compiled(&self) -> Option<&CompiledModel> {
        self.compiled.as_deref()
    }

    pub(crate) fn attach_schema(&mut self, compiled: Arc<CompiledModel>) {
        self.compiled = Some(compiled);
        self.advance(ConversionStage::SchemaReady);
    }

    pub(crate) fn advance(&mut self, next: ConversionStage) {
        debug_assert!(
            !self.stage.is_terminal() && next > self.stage,
            "invalid conversion transition {:?} -> {:?}",
            self.stage,
            next
        );
        log::trace!("{} {}: {:?} -> {:?}", self.direction, self.model, self.stage, next);
        self.stage = next;
    }

    /// Record `error` as the outcome of this conversion and hand it back
    pub(crate) fn fail(&mut self, error: ConversionError) -> ConversionError {
        log::debug!(
            "{} of {} failed after {:?}: {}",
            self.direction,
            self.model,
            self.stage,
            error
        );
        self.stage = ConversionStage::Failed;
        error
    }

    /// Close the conversion with `result`
    pub(crate) fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.advance(ConversionStage::Done);
                Ok(value)
            }
            Err(error) => Err(self.fail(error)),
        }
    }
}
