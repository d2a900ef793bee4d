use crate::analyzers::grade::Confidence;
use crate::analyzers::score::score_group;
use crate::analyzers::types::{MarketResult, RankedGroup, ScoredGroup};
use std::collections::BTreeMap;

/// Scores every ranked group and attaches its confidence level.
pub fn score_groups(ranked: Vec<RankedGroup>) -> Vec<ScoredGroup> {
    ranked
        .into_iter()
        .map(|ranked| {
            let score = score_group(&ranked);
            ScoredGroup {
                confidence: Confidence::from_score(score.total),
                score,
                ranked,
            }
        })
        .collect()
}

/// Picks the Basic Economy candidate for each (airline, market): the highest
/// score, ties going to the better price rank. Results are ordered by
/// airline then market.
pub fn select_basic_economy(scored: &[ScoredGroup]) -> Vec<MarketResult> {
    let mut markets: BTreeMap<(&str, &str), Vec<&ScoredGroup>> = BTreeMap::new();
    for group in scored {
        markets
            .entry((group.group().airline.as_str(), group.group().market.as_str()))
            .or_default()
            .push(group);
    }

    markets
        .into_values()
        .filter_map(|groups| {
            let winner = groups.iter().copied().reduce(|best, candidate| {
                let better = candidate.score.total > best.score.total
                    || (candidate.score.total == best.score.total
                        && candidate.price_rank() < best.price_rank());
                if better { candidate } else { best }
            })?;

            let mut brands: Vec<String> = groups.iter().map(|g| g.group().brand.clone()).collect();
            brands.sort();

            Some(MarketResult {
                airline: winner.group().airline.clone(),
                market: winner.group().market.clone(),
                brands,
                identified: winner.clone(),
            })
        })
        .collect()
}
