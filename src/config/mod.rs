//! Configuration module for Pantry.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    DatasetSettings, GeneralSettings, GeneratorProvider, GeneratorSettings, PromptSettings,
    RagSettings, RetrySettings, Settings, StoreProvider, StoreSettings,
};
