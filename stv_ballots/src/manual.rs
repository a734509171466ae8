/*!

This is the long-form manual for `stv_ballots` and `stvballot`.

## Ranks and orders

A ballot ranks candidates by their position in the election, starting at 1 for the most
preferred candidate. Candidates may be left unranked, may share a rank (a tie), and ranks
do not need to be contiguous: `[1, null, 3]` is a valid ballot for three candidates.

The counting service reads the same preferences as an *order*: a list of tie-groups, best
first, each group listing 0-based candidate indices. For the candidates
`["Ana", "Rodrigo", "Sara", "Tiago"]`, the ranks `[3, 2, null, 1]` become:

```
use stv_ballots::{order_to_rank, rank_to_order, RankVector};

let ranks = RankVector::from_values(&[Some(3), Some(2), None, Some(1)])?;
let order = rank_to_order(&ranks, 4);
assert_eq!(order.groups(), &[vec![3], vec![1], vec![0], vec![]]);
assert_eq!(order_to_rank(&order, 4)?, ranks);
# Ok::<(), stv_ballots::BallotError>(())
```

There is always one group per candidate, some possibly empty. Orders coming back from
the service may be shorter.

Some deployments store ballots as *simple ranks* instead: one 0-based rank per candidate
(`[2, 1, null, 0]` for the ballot above). Both wire formats are accepted when reading
stored ballots. When writing, the convention has to be named ([crate::WireConvention]).

## Portable text

Elections are exchanged as JSON, always written with the fields in this order:

```json
{
  "candidates": ["Ana", "Rodrigo", "Sara", "Tiago"],
  "seats": 3,
  "ordered_seats": false,
  "ballots": [
    {"votes": 10, "ranks": [3, 2, null, 1]},
    {"votes": 5, "order": [[2], [1], [3], [0]]}
  ]
}
```

 - `candidates`, `seats` and `ballots` are required.
 - `ordered_seats` (optional, false by default): whether the elected seats are ranked.
 - each ballot has `votes` (optional, 1 by default, never 0) and either `ranks`
 (1-based, one entry per candidate) or `order`, not both.

Text that is not JSON fails with `Parse`. JSON that does not describe an election fails
with `Schema` or `SchemaShape`.

## Shareable handles

A handle is the portable text compressed with zlib and encoded in URL-safe base64
without padding. It can be used as-is in a query parameter, for example
`/simulate?data=<handle>`. A handle that cannot be decompressed fails with `Decode`.

## Configuration

`stvballot aggregate` reads a JSON configuration file:

```json
{
  "outputSettings": {
    "contestName": "Board 2024",
    "outputDirectory": "out",
    "wireConvention": "ranks"
  },
  "ballotSources": [
    {"provider": "csv", "filePath": "ballots.csv", "idColumnIndex": 1, "firstVoteColumnIndex": 2, "firstVoteRowIndex": 2},
    {"provider": "json", "filePath": "stored.json"}
  ],
  "candidates": [{"name": "Ana"}, {"name": "Rodrigo"}],
  "seats": 1,
  "orderedSeats": false
}
```

Column and row indices start at 1. For `csv` sources:
 - `idColumnIndex` (optional): the column holding the ballot id. Without it, ballots are
 named after the file and the line number.
 - `countColumnIndex` (optional): the column holding the number of votes, at least 1.
 Every ballot counts once without it.
 - `firstVoteColumnIndex` (required): the column of the first candidate's rank. The
 following columns hold the ranks of the other candidates, in order. An empty cell
 leaves the candidate unranked.
 - `firstVoteRowIndex` (optional, 1 by default): the first row holding a ballot.
 - `zeroBasedRanks` (optional, false by default): the cells hold 0-based ranks.

`json` sources hold the ballots as stored by the ballot service: an object mapping each
ballot id to `{"votes": 1, "ranks": [...]}` (0-based) or `{"votes": 1, "order": [...]}`.

 */
