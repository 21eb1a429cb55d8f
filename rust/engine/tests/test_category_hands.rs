use dicehall_engine::categories::{evaluate_categories, Category};
use dicehall_engine::hand::{create_evaluator, GameVariant};

#[test]
fn category_ladder_is_ordered() {
    let ladder: Vec<[u8; 5]> = vec![
        [2, 3, 4, 6, 6],
        [2, 2, 4, 4, 6],
        [3, 3, 3, 5, 6],
        [1, 2, 3, 4, 5],
        [2, 3, 4, 5, 6],
        [2, 2, 5, 5, 5],
        [4, 4, 4, 4, 2],
        [3, 3, 3, 3, 3],
    ];
    let hands: Vec<_> = ladder.iter().map(|f| evaluate_categories(f)).collect();
    for pair in hands.windows(2) {
        assert!(pair[1].beats(&pair[0]), "{} should beat {}", pair[1], pair[0]);
    }
}

#[test]
fn ones_are_not_wild_in_categories() {
    let hs = evaluate_categories(&[1, 1, 6, 6, 6]);
    assert_eq!(hs.category, Some(Category::FullHouse));
    assert_eq!(hs.wilds_used, 0);
    assert_eq!(hs.rank.face, 6);
    assert_eq!(hs.rank.tiebreak, 1);
}

#[test]
fn two_pair_compares_low_pair_second() {
    let high = evaluate_categories(&[5, 5, 3, 3, 2]);
    let low = evaluate_categories(&[5, 5, 2, 2, 6]);
    assert_eq!(high.category, Some(Category::TwoPair));
    assert!(high.beats(&low));
    assert_eq!(high.description, "Two pair: Fives and Threes");
}

#[test]
fn straight_uses_every_die() {
    let hs = evaluate_categories(&[6, 5, 4, 3, 2]);
    assert_eq!(hs.category, Some(Category::HighStraight));
    assert!(hs.unused.is_empty());
}

#[test]
fn variants_resolve_by_name() {
    assert_eq!("categories".parse::<GameVariant>().unwrap(), GameVariant::Categories);
    assert_eq!("wild".parse::<GameVariant>().unwrap(), GameVariant::Wild);
    assert!("yahtzee".parse::<GameVariant>().is_err());
    assert_eq!(create_evaluator("categories").unwrap().name(), GameVariant::Categories.evaluator().name());
    assert!(create_evaluator("nope").is_err());
}
