//! Instruction-driven image editing against the Gemini image model.
//!
//! An [`EditController`] holds the uploaded image and the instruction,
//! gates generation on both, sends one edit per request through an
//! [`ImageEditService`] and saves the returned image. [`EditSession`] runs
//! a controller as a single-task event dispatcher.

pub mod config;
pub mod controller;
pub mod download;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod upload;

pub use config::{ApiKeySource, EditorConfig, GeminiConfig};
pub use controller::{
    ConsoleSurface, CycleOutcome, EditController, EditSession, EditorState, Notice, Phase,
    SessionHandle, SlotView, Surface, ViewState,
};
pub use error::{EditError, Result};
pub use gemini::{ImageClient, ImageEditService, GEMINI_IMAGE_MODEL};
pub use models::{GenerationRequest, GenerationResult, UploadedImage};
