//! Side-by-side runs of every algorithm on the same endpoints

use std::sync::Arc;

use log::info;
use pathrace_core::prelude::*;
use rayon::prelude::*;

/// Runs every [`AlgorithmKind`] from `start` to `end` with at most `budget`
/// steps each. Each run owns its algorithm; the graph is shared read-only.
///
/// # Errors
///
/// Returns [`Error::InvalidNodeIndex`] if an endpoint is not in `graph`.
pub fn compare_algorithms(
    graph: &Arc<RoadGraph>,
    start: NodeIndex,
    end: NodeIndex,
    budget: usize,
) -> Result<Vec<SearchStats>, Error> {
    let stats = AlgorithmKind::ALL
        .par_iter()
        .map(|&kind| {
            let mut search = SearchAlgorithm::started(kind, Arc::clone(graph), start, end)?;
            let outcome = search.run_to_completion(budget);
            Ok(SearchStats::from_outcome(&search, &outcome))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    for s in &stats {
        info!(
            "{}: {} steps, {} explored, found: {}",
            s.algorithm, s.steps, s.explored, s.found
        );
    }
    Ok(stats)
}
