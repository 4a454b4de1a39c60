//! Instruction text sent alongside each page image.
//!
//! Callers can override it through [`crate::config::OcrConfig::instruction`];
//! the constant here is used when no override is provided.

/// Default OCR instruction placed in the text part of the user message.
pub const DEFAULT_OCR_INSTRUCTION: &str =
    "Please perform OCR on this image and return only the extracted text.";
