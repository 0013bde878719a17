pub mod builtin;
pub mod config;
pub mod definitions;

pub use config::{AgentConfig, AggregationConfig, Config, ConfigOverrides, OutputFormat, SelectorConfig, DEFAULT_MAX_TURNS};
pub use definitions::{filter_disabled_agents, load_agents, load_aggregator, load_selector, AGGREGATOR_FILENAME, SELECTOR_FILENAME};
