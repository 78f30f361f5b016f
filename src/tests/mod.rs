//! Cross-component tests for the render/controller core.
