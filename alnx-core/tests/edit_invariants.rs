//! Property tests for the load-bearing invariants: vectorizer round trips,
//! insertion alternation, residue preservation, and monotone numbering.

use proptest::prelude::*;

use alnx_core::{vectorize, AlignmentArray, ColumnNumber};

const POSITION_CHARS: &[char] = &[
    'A', 'R', 'N', 'D', 'C', 'Q', 'E', 'G', 'H', 'I', 'L', 'K', 'M', 'F', 'P', 'S', 'T', 'W',
    'Y', 'V', '-',
];
const INSERT_CHARS: &[char] = &['a', 'c', 'd', 'e', 'g', 'k', 'w'];

/// One row with `n_positions` aligned characters and arbitrary (possibly
/// empty) insertion runs before, between, and after them. Every row built
/// this way vectorizes to the same slot count, so any set of them forms a
/// valid alignment.
fn row(n_positions: usize) -> impl Strategy<Value = String> {
    let positions = prop::collection::vec(prop::sample::select(POSITION_CHARS), n_positions);
    let runs = prop::collection::vec(
        prop::collection::vec(prop::sample::select(INSERT_CHARS), 0..4),
        n_positions + 1,
    );
    (positions, runs).prop_map(|(positions, runs)| {
        let mut raw = String::new();
        for (i, run) in runs.iter().enumerate() {
            raw.extend(run.iter());
            if i < positions.len() {
                raw.push(positions[i]);
            }
        }
        raw
    })
}

fn alignment() -> impl Strategy<Value = Vec<String>> {
    (1usize..8, 1usize..6)
        .prop_flat_map(|(n_positions, n_rows)| prop::collection::vec(row(n_positions), n_rows))
}

fn residues(array: &AlignmentArray, row: usize) -> Vec<char> {
    let mut out: Vec<char> = array.plain_rows().unwrap()[row]
        .iter()
        .flat_map(|cell| cell.chars())
        .filter(|&c| c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    out.sort_unstable();
    out
}

proptest! {
    #[test]
    fn vectorize_round_trips(raw in "[a-zA-Z-]{0,40}") {
        let slots = vectorize(&raw, true).unwrap();
        prop_assert_eq!(slots.concat(), raw);
    }

    #[test]
    fn construction_accepts_uniform_rows(rows in alignment()) {
        let names: Vec<String> = (0..rows.len()).map(|i| format!("seq{}", i)).collect();
        let array = AlignmentArray::from_rows(&names, &rows).unwrap();
        prop_assert_eq!(array.n_rows(), rows.len());
    }

    #[test]
    fn edits_keep_alternation_and_residues(rows in alignment(), threshold in 0.0f64..1.0) {
        let names: Vec<String> = (0..rows.len()).map(|i| format!("seq{}", i)).collect();
        let array = AlignmentArray::from_rows(&names, &rows).unwrap();
        let before: Vec<_> = (0..array.n_rows()).map(|r| residues(&array, r)).collect();

        let edited = array.define_insertions(threshold).unwrap();

        // no two insertion columns are ever adjacent
        let mask = edited.is_position_column();
        prop_assert!(!mask.windows(2).any(|w| !w[0] && !w[1]), "mask {:?}", mask);

        // the case-folded residue multiset of every row is unchanged
        let after: Vec<_> = (0..edited.n_rows()).map(|r| residues(&edited, r)).collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn numbering_is_monotone_with_integer_positions(rows in alignment()) {
        let names: Vec<String> = (0..rows.len()).map(|i| format!("seq{}", i)).collect();
        let array = AlignmentArray::from_rows(&names, &rows).unwrap();
        let numbers = array.column_numbers();

        let values: Vec<f64> = numbers.iter().map(|n| n.value()).collect();
        prop_assert!(values.windows(2).all(|w| w[0] <= w[1]), "values {:?}", values);

        // exactly the position columns carry integers, counting from 1
        let positions: Vec<u32> = numbers
            .iter()
            .filter_map(|n| match n {
                ColumnNumber::Position(k) => Some(*k),
                ColumnNumber::Insertion(_) => None,
            })
            .collect();
        let expected: Vec<u32> = (1..=positions.len() as u32).collect();
        prop_assert_eq!(positions, expected.clone());

        let mask = array.is_position_column();
        let n_positions = mask.iter().filter(|&&p| p).count();
        prop_assert_eq!(n_positions as u32, expected.last().copied().unwrap_or(0));
    }
}
