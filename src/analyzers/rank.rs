use crate::analyzers::types::{BrandGroup, RankedGroup};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Market ordering: cheaper average inclusive price first, then brand name.
///
/// The same order breaks score ties when picking the Basic Economy brand.
pub fn price_order(a: &BrandGroup, b: &BrandGroup) -> Ordering {
    a.avg_price_inc
        .total_cmp(&b.avg_price_inc)
        .then_with(|| a.brand.cmp(&b.brand))
}

/// Assigns a 1-based price rank to every group within its (airline, market).
///
/// Ranks are dense and unique per airline/market: 1 is the cheapest brand, a
/// market with a single brand ranks it 1. Output is ordered by airline,
/// market, then rank.
pub fn rank_groups(groups: Vec<BrandGroup>) -> Vec<RankedGroup> {
    let mut by_market: BTreeMap<(String, String), Vec<BrandGroup>> = BTreeMap::new();
    for group in groups {
        by_market
            .entry((group.airline.clone(), group.market.as_str().to_string()))
            .or_default()
            .push(group);
    }

    let mut ranked = Vec::new();
    for (_, mut market_groups) in by_market {
        market_groups.sort_by(price_order);
        ranked.extend(
            market_groups
                .into_iter()
                .enumerate()
                .map(|(i, group)| RankedGroup {
                    group,
                    price_rank: i + 1,
                }),
        );
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::Availability;
    use crate::record::Market;

    fn group(airline: &str, market: &str, brand: &str, price: f64) -> BrandGroup {
        let (o, d) = market.split_once('-').unwrap();
        BrandGroup {
            airline: airline.into(),
            market: Market::new(o, d).unwrap(),
            brand: brand.into(),
            record_count: 1,
            avg_price_inc: price,
            min_price_inc: price,
            max_price_inc: price,
            avg_price_exc: None,
            pct_refundable: 0.0,
            avg_change_fee: None,
            avg_days_out: 10.0,
            availability: Availability::default(),
        }
    }

    #[test]
    fn test_ranks_are_contiguous_per_market() {
        let groups = vec![
            group("AA", "JFK-LAX", "MAIN CABIN", 250.0),
            group("AA", "JFK-LAX", "BASIC ECONOMY", 180.0),
            group("AA", "JFK-LAX", "FLEX", 400.0),
            group("AA", "BOS-ORD", "MAIN CABIN", 90.0),
            group("DL", "JFK-LAX", "DELTA MAIN BASIC", 170.0),
        ];
        let ranked = rank_groups(groups);

        let mut per_market: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();
        for r in &ranked {
            per_market
                .entry((r.group.airline.clone(), r.group.market.to_string()))
                .or_default()
                .push(r.price_rank);
        }
        for ranks in per_market.values() {
            let expected: Vec<usize> = (1..=ranks.len()).collect();
            assert_eq!(ranks, &expected);
        }

        let basic = ranked.iter().find(|r| r.group.brand == "BASIC ECONOMY").unwrap();
        assert_eq!(basic.price_rank, 1);
        let flex = ranked.iter().find(|r| r.group.brand == "FLEX").unwrap();
        assert_eq!(flex.price_rank, 3);
        let single = ranked.iter().find(|r| r.group.market.as_str() == "BOS-ORD").unwrap();
        assert_eq!(single.price_rank, 1);
    }

    #[test]
    fn test_price_ties_break_by_brand_name() {
        let groups = vec![
            group("UA", "DEN-SFO", "ECONOMY", 150.0),
            group("UA", "DEN-SFO", "BASIC", 150.0),
        ];
        let ranked = rank_groups(groups);
        assert_eq!(ranked[0].group.brand, "BASIC");
        assert_eq!(ranked[0].price_rank, 1);
        assert_eq!(ranked[1].group.brand, "ECONOMY");
        assert_eq!(ranked[1].price_rank, 2);
    }
}
