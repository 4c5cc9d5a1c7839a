use tracing::debug;

use radix_core::radix::{self, Conversion, Numeral};

use crate::error::PracticeError;

/// A successful free-form conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeAnswer {
    pub conversion: Conversion,
    /// The input as it was converted, without surrounding whitespace.
    pub input: String,
    /// Canonical rendering in the target base.
    pub output: Numeral,
}

/// Free-form conversion practice.
#[derive(Debug, Clone, Copy, Default)]
pub struct PracticeService;

impl PracticeService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Conversion directions offered for practice.
    #[must_use]
    pub fn conversions(&self) -> &'static [Conversion] {
        &Conversion::PRACTICE
    }

    /// Example input to show for `conversion`.
    #[must_use]
    pub fn placeholder(&self, conversion: Conversion) -> &'static str {
        conversion.from.example()
    }

    /// Convert user input for the chosen direction.
    ///
    /// # Errors
    ///
    /// - `PracticeError::EmptyInput` if nothing was entered.
    /// - `PracticeError::InvalidInput` if the input has digits outside the source base.
    /// - `PracticeError::Conversion` if the value is out of range.
    pub fn convert(
        &self,
        input: &str,
        conversion: Conversion,
    ) -> Result<PracticeAnswer, PracticeError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(PracticeError::EmptyInput);
        }
        if !radix::validate(input, conversion.from) {
            return Err(PracticeError::InvalidInput {
                input: input.to_owned(),
                base: conversion.from,
            });
        }

        let output = conversion.apply(input)?;
        debug!(
            %conversion,
            input,
            output = %output,
            value = output.value(),
            "converted practice input"
        );
        Ok(PracticeAnswer {
            conversion,
            input: input.to_owned(),
            output,
        })
    }
}
