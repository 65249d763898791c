use im::{ordmap, ordset, OrdMap, OrdSet};

use crate::types::PointPair;

/// Vertices of a small road network. Each vertex holds the name of a town.
///
/// ```plain
///        +---+  5  +---+
///        | 1 | --> | 2 |
///        +---+     +---+
///          |  ^      |
///        3 |  | 4  2 |
///          v  |      v
///        +---+  1  +---+
///        | 3 | <-- | 4 |
///        +---+     +---+
/// ```
pub(crate) fn towns() -> OrdMap<u32, String> {
    ordmap! {
        1 => "Aachen".to_string(),
        2 => "Bonn".to_string(),
        3 => "Celle".to_string(),
        4 => "Dessau".to_string()
    }
}

/// Edges of the road network of [`towns`], weighted by distance.
pub(crate) fn roads() -> OrdMap<PointPair<u32>, u32> {
    ordmap! {
        PointPair::new(1, 2) => 5,
        PointPair::new(1, 3) => 3,
        PointPair::new(3, 1) => 4,
        PointPair::new(2, 4) => 2,
        PointPair::new(4, 3) => 1
    }
}

/// The same road network, but with alternative routes between some towns.
pub(crate) fn alternative_roads() -> OrdMap<PointPair<u32>, OrdSet<u32>> {
    ordmap! {
        PointPair::new(1, 2) => ordset![5, 7],
        PointPair::new(1, 3) => ordset![3],
        PointPair::new(3, 1) => ordset![4, 6, 9],
        PointPair::new(2, 4) => ordset![2],
        PointPair::new(4, 3) => ordset![1]
    }
}

/// Roads leading to towns that are not part of [`towns`].
pub(crate) fn dangling_roads() -> Vec<(PointPair<u32>, u32)> {
    vec![
        (PointPair::new(1, 5), 10),
        (PointPair::new(6, 2), 11),
        (PointPair::new(7, 8), 12),
    ]
}
