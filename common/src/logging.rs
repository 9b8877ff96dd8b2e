//! Common logging initializer
//!

use eyre::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use tracing_tree::HierarchicalLayer;

#[tracing::instrument]
pub fn init_logging(name: &'static str, use_tree: bool, use_file: Option<String>) -> Result<()> {
    // Initialise logging early
    //
    // Load filters from environment
    //
    let filter = EnvFilter::from_default_env();

    // Do we want hierarchical output?
    //
    let tree = if use_tree {
        Some(
            HierarchicalLayer::new(2)
                .with_ansi(true)
                .with_span_retrace(true)
                .with_span_modes(true)
                .with_targets(true)
                .with_bracketed_fields(true),
        )
    } else {
        None
    };

    // Regular compact output unless the tree took over.
    //
    let out = if use_tree {
        None
    } else {
        Some(fmt::layer().with_target(false).compact())
    };

    // Log to file?
    //
    let file = use_file.map(|dir| {
        // Basic append-only rolling file for all traces.
        //
        let file_appender = tracing_appender::rolling::hourly(dir, name);
        fmt::layer().with_writer(file_appender).with_ansi(false)
    });

    // Combine filters & outputs
    //
    tracing_subscriber::registry()
        .with(filter)
        .with(tree)
        .with(out)
        .with(file)
        .init();

    Ok(())
}
