use super::*;
use im::OrdMap;

fn concat(mut a: Vec<u32>, b: Vec<u32>) -> Vec<u32> {
    a.extend(b);
    a
}

#[test]
fn sequential_fold_keeps_input_order() {
    let items: Vec<u32> = (0..10).collect();
    let result = fold(
        items.clone(),
        Vec::new,
        |mut acc, i| {
            acc.push(i);
            acc
        },
        concat,
    );
    assert_eq!(items, result);
}

#[test]
fn dedicated_pool_gives_same_result() {
    configure(Config {
        parallel_threshold: 0,
        worker_threads: Some(2),
    })
    .unwrap();
    assert_eq!(Some(2), current_config().worker_threads);

    let items: Vec<u32> = (0..5000).collect();
    let result = fold(
        items.clone(),
        Vec::new,
        |mut acc, i| {
            acc.push(i);
            acc
        },
        concat,
    );
    assert_eq!(items, result);

    // later writes of the same key replace earlier ones
    let entries: Vec<(u32, u32)> = (0..5000).map(|i| (i % 10, i)).collect();
    let map: OrdMap<u32, u32> = fold(
        entries,
        OrdMap::new,
        |mut acc, (k, v)| {
            acc.insert(k, v);
            acc
        },
        |left, right| right.union(left),
    );
    assert_eq!(10, map.len());
    assert_eq!(Some(&4999), map.get(&9));

    configure(Config::default()).unwrap();
}

#[test]
fn reject_zero_threads() {
    let result = configure(Config {
        parallel_threshold: 0,
        worker_threads: Some(0),
    });
    assert!(result.is_err());
}

#[test]
#[should_panic(expected = "caller failure")]
fn panics_propagate() {
    let items: Vec<u32> = (0..100).collect();
    fold(
        items,
        || 0,
        |acc, i| {
            if i == 42 {
                panic!("caller failure");
            }
            acc + i
        },
        |a, b| a + b,
    );
}
