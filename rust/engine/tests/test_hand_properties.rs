use dicehall_engine::categories::evaluate_categories;
use dicehall_engine::dice::{MAX_FACE, MIN_FACE};
use dicehall_engine::wild::{count_faces, evaluate_wild, WILD_FACE};
use proptest::prelude::*;

fn five_dice() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(MIN_FACE..=MAX_FACE, 5)
}

proptest! {
    #[test]
    fn of_a_kind_never_below_natural_count(faces in five_dice()) {
        let hs = evaluate_wild(&faces);
        let (counts, _) = count_faces(&faces);
        if hs.rank.face >= 2 {
            prop_assert!(hs.of_a_kind >= counts[hs.rank.face as usize]);
        }
        let best_natural = (2..=MAX_FACE).map(|f| counts[f as usize]).max().unwrap_or(0);
        prop_assert!(hs.of_a_kind >= best_natural);
    }

    #[test]
    fn wild_rank_is_order_independent(mut faces in five_dice(), rotate in 0usize..5) {
        let before = evaluate_wild(&faces).rank;
        faces.rotate_left(rotate);
        prop_assert_eq!(evaluate_wild(&faces).rank, before);
    }

    #[test]
    fn wilds_used_never_exceeds_wilds_rolled(faces in five_dice()) {
        let hs = evaluate_wild(&faces);
        let wilds = faces.iter().filter(|&&f| f == WILD_FACE).count() as u8;
        prop_assert!(hs.wilds_used <= wilds);
        prop_assert!(hs.unused.len() + hs.of_a_kind as usize <= faces.len());
    }

    #[test]
    fn category_rank_is_order_independent(mut faces in five_dice()) {
        let before = evaluate_categories(&faces).rank;
        faces.reverse();
        prop_assert_eq!(evaluate_categories(&faces).rank, before);
    }
}
