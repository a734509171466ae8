use std::collections::{BTreeMap, HashSet};

use stv_ballots::*;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn rv(values: &[Option<u32>]) -> RankVector {
    RankVector::from_values(values).unwrap()
}

// Every rank vector over `n` candidates using ranks in 1..=n.
fn all_rank_vectors(n: usize) -> Vec<RankVector> {
    let mut res: Vec<Vec<Option<u32>>> = vec![vec![]];
    for _ in 0..n {
        let mut next = Vec::new();
        for prefix in res.iter() {
            for v in std::iter::once(None).chain((1..=n as u32).map(Some)) {
                let mut p = prefix.clone();
                p.push(v);
                next.push(p);
            }
        }
        res = next;
    }
    res.iter().map(|v| rv(v)).collect()
}

#[test]
fn rank_order_round_trip() {
    for n in 0..=4 {
        for ranks in all_rank_vectors(n) {
            let order = rank_to_order(&ranks, n);
            assert_eq!(order.len(), n);
            assert_eq!(order_to_rank(&order, n).unwrap(), ranks);
        }
    }
}

#[test]
fn tied_candidates_share_exactly_one_group() {
    for ranks in all_rank_vectors(4) {
        let order = rank_to_order(&ranks, 4);
        for i in 0..4 {
            for j in (i + 1)..4 {
                if ranks.get(i).is_some() && ranks.get(i) == ranks.get(j) {
                    let holding: Vec<&Vec<usize>> = order
                        .groups()
                        .iter()
                        .filter(|g| g.contains(&i) || g.contains(&j))
                        .collect();
                    assert_eq!(holding.len(), 1, "{:?}", ranks);
                    assert!(holding[0].contains(&i) && holding[0].contains(&j));
                }
            }
        }
    }
}

#[test]
fn sparse_ranks() {
    let ranks = rv(&[Some(1), None, Some(3), None]);
    let order = rank_to_order(&ranks, 4);
    assert!(order.groups()[1].is_empty());
    assert_eq!(order.groups()[2], vec![2]);
    assert_eq!(order_to_rank(&order, 4).unwrap(), ranks);
}

#[test]
fn malformed_order() {
    let order = OrderGroups::new(vec![vec![0], vec![4]]);
    assert!(matches!(
        order_to_rank(&order, 4),
        Err(BallotError::MalformedOrder { index: 4, .. })
    ));
}

#[test]
fn aggregation_conserves_weight_and_partitions_ids() {
    init();
    let patterns = all_rank_vectors(3);
    let mut ballots: BTreeMap<String, Ballot> = BTreeMap::new();
    for i in 0..500usize {
        // A deterministic spread over a few dozen patterns, with repeats.
        let ranks = patterns[(i * 7 + i / 3) % 37].clone();
        ballots.insert(
            format!("ballot-{:04}", i),
            Ballot::with_ranks(ranks, Votes::new((i % 5 + 1) as u64).unwrap()),
        );
    }

    let groups = aggregate(&ballots).unwrap();
    assert_eq!(
        total_votes(&groups).unwrap(),
        ballots.values().map(|b| b.votes.get()).sum::<u64>()
    );

    let mut seen: HashSet<&String> = HashSet::new();
    for g in groups.iter() {
        for id in g.ballot_ids.iter() {
            assert!(seen.insert(id));
            assert_eq!(ballots[id].ranks, g.ranks);
        }
    }
    assert_eq!(seen.len(), ballots.len());

    let distinct: HashSet<&RankVector> = ballots.values().map(|b| &b.ranks).collect();
    assert_eq!(groups.len(), distinct.len());
}

#[test]
fn end_to_end_scenario() {
    init();
    let candidates: Vec<String> = ["Ana", "Rodrigo", "Sara", "Tiago"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let first = Ballot::with_ranks(rv(&[Some(3), Some(2), None, Some(1)]), Votes::new(10).unwrap());
    assert_eq!(
        rank_to_order(&first.ranks, 4).groups(),
        &[vec![3], vec![1], vec![0], vec![]]
    );

    let mut ballots: BTreeMap<&str, Ballot> = BTreeMap::new();
    ballots.insert("a", first.clone());
    ballots.insert("b", Ballot::with_ranks(first.ranks.clone(), Votes::new(5).unwrap()));
    ballots.insert(
        "c",
        Ballot::with_ranks(rv(&[Some(4), Some(2), Some(1), Some(3)]), Votes::new(3).unwrap()),
    );
    let groups = aggregate(&ballots).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].votes.get(), 15);
    assert_eq!(groups[0].ballot_ids, vec!["a", "b"]);
    assert_eq!(groups[1].votes.get(), 3);
    assert_eq!(total_votes(&groups).unwrap(), 18);

    // Snapshot the aggregated election and bring it back through a handle.
    let election = Election {
        candidates,
        seats: 3,
        ordered_seats: false,
        ballots: groups.iter().map(BallotGroup::to_ballot).collect(),
    };
    let text = to_portable_text(&election).unwrap();
    assert_eq!(
        to_portable_text(&from_portable_text(&text).unwrap()).unwrap(),
        text
    );
    let token = to_shareable_handle(&election).unwrap();
    assert_eq!(from_shareable_handle(&token).unwrap(), election);

    let request = CountRequest::from_election(&election, WireConvention::OrderGroups);
    assert_eq!(
        request.ballots[0],
        WireBallot::Order {
            votes: Votes::new(15).unwrap(),
            order: OrderGroups::new(vec![vec![3], vec![1], vec![0], vec![]]),
        }
    );
}

#[test]
fn truncated_handle_is_not_a_parse_error() {
    let mut builder = builder::Builder::new(1)
        .candidates(&["A".to_string(), "B".to_string()])
        .unwrap();
    for _ in 0..20 {
        builder.add_ballot(&[Some(1), Some(2)], 1).unwrap();
    }
    let token = to_shareable_handle(&builder.build()).unwrap();
    let truncated = &token[..token.len() - 3];
    assert!(matches!(
        from_shareable_handle(truncated),
        Err(BallotError::Decode { .. })
    ));
}
