//! Component lifecycle events

pub mod component_events;

pub use component_events::ComponentEvent;
