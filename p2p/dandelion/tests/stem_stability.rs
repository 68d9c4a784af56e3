//! Stem-routing stability under outbound peer churn.

use std::collections::{HashMap, HashSet};

use rand::{rngs::StdRng, Rng, SeedableRng};

use galena_dandelion::ConnectionMap;

fn random_ids(r: &mut StdRng, n: usize) -> Vec<u64> {
    let mut ids = HashSet::new();
    while ids.len() < n {
        ids.insert(r.gen::<u64>());
    }
    ids.into_iter().collect()
}

/// Asserts every live slot holds a distinct peer drawn from `connections`.
fn assert_slots_consistent(mapper: &ConnectionMap<u64>, connections: &[u64]) {
    let mut used = HashSet::new();
    for connection in mapper {
        assert!(used.insert(*connection));
        assert!(connections.contains(connection));
    }
    assert_eq!(used.len(), mapper.len());
}

#[test]
fn dropped_connection() {
    let mut rng = StdRng::seed_from_u64(0xd1);

    // select 3 of 6 outgoing connections
    let mut connections = random_ids(&mut rng, 6);
    connections.sort_unstable();

    let mut mapper = ConnectionMap::new(connections.iter().copied(), 3);
    assert_eq!(3, mapper.len());
    assert_slots_consistent(&mapper, &connections);

    {
        let cloned = mapper.clone();
        assert_eq!(3, cloned.len());
        assert!(mapper.iter().eq(cloned.iter()));
    }

    assert!(!mapper.update(&connections));
    assert_eq!(3, mapper.len());
    assert_slots_consistent(&mapper, &connections);

    let in_connections = random_ids(&mut rng, 9);

    let mut mapping = HashMap::new();
    {
        let mut used = HashMap::new();
        for connection in &in_connections {
            let out = mapper.get_stem(connection).unwrap();
            assert!(mapping.insert(*connection, out).is_none());
            *used.entry(out).or_insert(0_usize) += 1;
        }

        assert_eq!(3, used.len());
        assert!(used.values().all(|&count| count == 3));
    }

    for connection in &in_connections {
        assert_eq!(mapping[connection], mapper.get_stem(connection).unwrap());
    }

    // drop 1 connection, and select replacement from 1 of unused 3.
    let lost_connection = *mapper.iter().nth(1).unwrap();
    connections.retain(|connection| *connection != lost_connection);

    assert!(mapper.update(&connections));
    assert_eq!(3, mapper.len());
    assert_slots_consistent(&mapper, &connections);
    assert!(mapper.iter().all(|connection| *connection != lost_connection));

    let newly_mapped = *mapper.iter().nth(1).unwrap();
    assert_ne!(lost_connection, newly_mapped);

    for (connection, out) in &mut mapping {
        if *out == lost_connection {
            *out = newly_mapped;
        }
        assert_eq!(*out, mapper.get_stem(connection).unwrap());
    }

    // mappings should remain evenly distributed, with 2 peers sitting in
    // waiting.
    {
        let mut used = HashMap::new();
        for connection in &in_connections {
            let out = mapper.get_stem(connection).unwrap();
            assert_eq!(mapping[connection], out);
            *used.entry(out).or_insert(0_usize) += 1;
        }

        assert_eq!(3, used.len());
        assert!(used.values().all(|&count| count == 3));
    }

    let cloned = mapper.clone();
    assert_eq!(3, cloned.len());
    assert!(mapper.iter().eq(cloned.iter()));
}

#[test]
fn dropped_connection_awaits_replacement() {
    let mut rng = StdRng::seed_from_u64(0xd2);

    // select 3 of 3 outgoing connections
    let mut connections = random_ids(&mut rng, 3);
    connections.sort_unstable();

    let mut mapper = ConnectionMap::new(connections.iter().copied(), 3);
    assert_eq!(3, mapper.len());
    assert_slots_consistent(&mapper, &connections);

    assert!(!mapper.update(&connections));

    let mut in_connections = random_ids(&mut rng, 9);

    let mut mapping = HashMap::new();
    for connection in &in_connections {
        let out = mapper.get_stem(connection).unwrap();
        assert!(mapping.insert(*connection, out).is_none());
    }

    // drop 1 connection leaving a hole no available peer can fill
    let lost_connection = *mapper.iter().nth(1).unwrap();
    connections.retain(|connection| *connection != lost_connection);

    assert!(mapper.update(&connections));
    assert_eq!(2, mapper.len());

    // sources bound to the hole defer until an update restores their slot,
    // everyone else is untouched
    for connection in &in_connections {
        let expected = mapping[connection];
        if expected == lost_connection {
            assert_eq!(None, mapper.get_stem(connection));
        } else {
            assert_eq!(Some(expected), mapper.get_stem(connection));
        }
    }

    // a new source is still routed, over the live slots only
    let newcomer = rng.gen::<u64>();
    in_connections.push(newcomer);
    let out = mapper.get_stem(&newcomer).unwrap();
    assert_ne!(lost_connection, out);
    mapping.insert(newcomer, out);

    // select 3 of 3 connections again but do not remap existing links
    let replacement = rng.gen::<u64>();
    connections.push(replacement);

    assert!(mapper.update(&connections));
    assert_eq!(3, mapper.len());
    assert_slots_consistent(&mapper, &connections);

    for connection in &in_connections {
        let out = mapper.get_stem(connection).unwrap();
        let expected = mapping.entry(*connection).or_insert(out);
        if *expected == lost_connection {
            // the hole's sources all moved to the replacement peer, together
            assert_eq!(replacement, out);
            *expected = out;
        } else {
            assert_eq!(*expected, out);
        }
    }

    // map 8 new incoming connections across the 3 outgoing links: fan-in
    // levels out at 6 sources per slot
    for _ in 0..8 {
        let connection = rng.gen::<u64>();
        in_connections.push(connection);
        mapping.insert(connection, mapper.get_stem(&connection).unwrap());
    }

    let mut used = HashMap::new();
    for connection in &in_connections {
        let out = mapper.get_stem(connection).unwrap();
        assert_eq!(mapping[connection], out);
        *used.entry(out).or_insert(0_usize) += 1;
    }

    assert_eq!(3, used.len());
    assert!(used.values().all(|&count| count == 6));
}

#[test]
fn dropped_all_connections() {
    let mut rng = StdRng::seed_from_u64(0xd3);

    // select 3 of 8 outgoing connections
    let mut connections = random_ids(&mut rng, 8);
    connections.sort_unstable();

    let mut mapper = ConnectionMap::new(connections.iter().copied(), 3);
    assert_eq!(3, mapper.len());
    assert_slots_consistent(&mapper, &connections);

    let in_connections = random_ids(&mut rng, 9);

    let mut mapping = HashMap::new();
    {
        let mut used = HashMap::new();
        for connection in &in_connections {
            let out = mapper.get_stem(connection).unwrap();
            assert!(mapping.insert(*connection, out).is_none());
            *used.entry(out).or_insert(0_usize) += 1;
        }

        assert_eq!(3, used.len());
        assert!(used.values().all(|&count| count == 3));
    }

    // drop all connections
    connections.clear();

    assert!(mapper.update(&connections));
    assert_eq!(0, mapper.len());
    assert_eq!(None, mapper.iter().next());

    // every binding now resolves to nothing, and nothing new is routable
    for connection in &in_connections {
        assert_eq!(None, mapper.get_stem(connection));
    }
    assert_eq!(None, mapper.get_stem(&rng.gen::<u64>()));

    // select 3 of 30 connections, all slots refill with new peers
    let connections = random_ids(&mut rng, 30);

    assert!(mapper.update(&connections));
    assert_eq!(3, mapper.len());
    assert_slots_consistent(&mapper, &connections);

    // the 9 bound sources redistribute across the 3 new peers, still evenly,
    // and stay put on repeated lookups
    let mut used = HashMap::new();
    for connection in &in_connections {
        let out = mapper.get_stem(connection).unwrap();
        assert!(connections.contains(&out));
        assert_eq!(Some(out), mapper.get_stem(connection));
        *used.entry(out).or_insert(0_usize) += 1;
    }

    assert_eq!(3, used.len());
    assert!(used.values().all(|&count| count == 3));
}

#[test]
fn update_with_disjoint_set_replaces_every_slot() {
    let mut rng = StdRng::seed_from_u64(0xd4);

    let connections = random_ids(&mut rng, 5);
    let mut mapper = ConnectionMap::new(connections.iter().copied(), 3);

    let replacements = random_ids(&mut rng, 5);
    assert!(mapper.update(&replacements));
    assert!(!mapper.update(&replacements));

    assert_eq!(3, mapper.len());
    for connection in &mapper {
        assert!(replacements.contains(connection));
    }
}
