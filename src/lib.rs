pub mod analyzers;
pub mod charts;
pub mod cleaner;
pub mod config;
pub mod fetch;
pub mod output;
pub mod publish;
pub mod record;
pub mod stats;
pub mod summary;
