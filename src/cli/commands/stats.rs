//! Index statistics command.

use super::preflight_or_hint;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::create_vector_store;
use anyhow::Result;

pub async fn run_stats(settings: Settings) -> Result<()> {
    preflight_or_hint(Operation::Search, &settings)?;

    let store = create_vector_store(&settings).await?;
    let stats = store.stats().await?;

    Output::header(&format!("Index {}", settings.vector_store.index_name));
    Output::kv("Vectors", &stats.total_vector_count.to_string());
    if let Some(dimension) = stats.dimension {
        Output::kv("Dimension", &dimension.to_string());
    }
    if let Some(fullness) = stats.index_fullness {
        Output::kv("Fullness", &format!("{:.1}%", fullness * 100.0));
    }
    for (namespace, count) in &stats.namespaces {
        let name = if namespace.is_empty() { "(default)" } else { namespace.as_str() };
        Output::list_item(&format!("{}: {} vectors", name, count));
    }
    Ok(())
}
