use seriestrack::{
    core::store::{SeriesStore, StoreError},
    persist::{PersistenceAdapter, STORAGE_KEY, memory::MemoryKvStore},
    series::{Episode, EpisodeCount, MAX_EPISODES, Series, ValidationError},
};

fn fixed_store() -> SeriesStore {
    SeriesStore::new().with_clock(|| 1_000)
}

fn names(series: &Series) -> Vec<&str> {
    series.episodes.iter().map(|ep| ep.name.as_str()).collect()
}

fn flags(series: &Series) -> Vec<bool> {
    series.episodes.iter().map(|ep| ep.completed).collect()
}

#[test]
fn add_creates_pending_series_with_sequential_episodes() {
    let mut store = fixed_store();
    let show = store.add("Show A", 3).expect("add");

    assert_eq!(show.id, "1000");
    assert_eq!(show.name, "Show A");
    assert!(!show.completed);
    assert_eq!(names(&show), ["Episode 1", "Episode 2", "Episode 3"]);
    assert_eq!(flags(&show), [false, false, false]);
    assert_eq!(
        show.episodes.iter().map(|ep| ep.id.as_str()).collect::<Vec<_>>(),
        ["1000-0", "1000-1", "1000-2"]
    );
    assert_eq!(store.collection().to_vec(), vec![show]);
}

#[test]
fn add_appends_in_insertion_order_with_distinct_ids() {
    let mut store = fixed_store();
    let a = store.add("A", 1).expect("a");
    let b = store.add("B", "2").expect("b");
    let c = store.add("C", EpisodeCount::new(4).expect("count")).expect("c");

    assert_eq!((a.id.as_str(), b.id.as_str(), c.id.as_str()), ("1000", "1001", "1002"));
    let order: Vec<_> = store.collection().iter().map(|s| s.name.clone()).collect();
    assert_eq!(order, ["A", "B", "C"]);
}

#[test]
fn add_rejects_invalid_input_without_side_effects() {
    let mut store = fixed_store();

    assert_eq!(
        store.add("", 3),
        Err(StoreError::Validation(ValidationError::EmptyName))
    );
    assert_eq!(
        store.add("   ", 3),
        Err(StoreError::Validation(ValidationError::EmptyName))
    );
    for bad in ["abc", "", "0", "-2", "2.5", "3 episodes"] {
        assert_eq!(
            store.add("Show", bad),
            Err(StoreError::Validation(ValidationError::InvalidEpisodeCount(
                bad.to_string()
            ))),
            "input {bad:?}"
        );
    }
    assert!(matches!(
        store.add("Show", 0),
        Err(StoreError::Validation(ValidationError::InvalidEpisodeCount(_)))
    ));
    assert!(matches!(
        store.add("Show", -5i64),
        Err(StoreError::Validation(ValidationError::InvalidEpisodeCount(_)))
    ));

    assert!(store.is_empty());
    assert!(store.drain_pending_snapshots().is_empty());
    assert_eq!(store.latest_snapshot_seq(), 0);
}

#[test]
fn episode_count_parsing_trims_whitespace() {
    assert_eq!(" 12 ".parse::<EpisodeCount>().map(EpisodeCount::get), Ok(12));
    assert!("+3".parse::<EpisodeCount>().is_err());
    assert!("99999999999".parse::<EpisodeCount>().is_err());
}

#[test]
fn episode_counts_above_the_limit_are_rejected_before_allocation() {
    let mut store = fixed_store();

    assert_eq!(
        store.add("Big", "4000000000"),
        Err(StoreError::Validation(ValidationError::InvalidEpisodeCount(
            "4000000000".to_string()
        )))
    );
    assert!(matches!(
        store.add("Big", MAX_EPISODES + 1),
        Err(StoreError::Validation(ValidationError::InvalidEpisodeCount(_)))
    ));
    assert!(EpisodeCount::new(u32::MAX).is_err());
    assert!(store.is_empty());
    assert_eq!(store.latest_snapshot_seq(), 0);

    let longest = store.add("Long", MAX_EPISODES).expect("at limit");
    assert_eq!(longest.episodes.len(), MAX_EPISODES as usize);
}

#[test]
fn marking_one_episode_leaves_siblings_and_series_flag_alone() {
    let mut store = fixed_store();
    let show = store.add("Show A", 3).expect("add");
    let ep2 = show.episodes[1].id.clone();

    let updated = store.mark_episode_complete(&show.id, &ep2).expect("mark");

    assert_eq!(flags(&updated), [false, true, false]);
    assert!(!updated.completed);
    assert_eq!(store.series(&show.id), Some(&updated));
}

#[test]
fn series_completion_cascades_both_ways() {
    let mut store = fixed_store();
    let show = store.add("Show A", 4).expect("add");
    store
        .mark_episode_complete(&show.id, &show.episodes[0].id)
        .expect("mark ep");

    let done = store.mark_series_complete(&show.id).expect("mark series");
    assert!(done.completed);
    assert!(done.episodes.iter().all(|ep| ep.completed));

    let reset = store.unmark_series_complete(&show.id).expect("unmark series");
    assert!(!reset.completed);
    assert!(reset.episodes.iter().all(|ep| !ep.completed));
}

#[test]
fn unmarking_an_episode_keeps_series_flag() {
    let mut store = fixed_store();
    let show = store.add("Show A", 2).expect("add");
    store.mark_series_complete(&show.id).expect("mark series");

    let updated = store
        .unmark_episode_complete(&show.id, &show.episodes[0].id)
        .expect("unmark ep");

    assert!(updated.completed);
    assert_eq!(flags(&updated), [false, true]);
}

#[test]
fn mutations_on_missing_targets_report_not_found_and_change_nothing() {
    let mut store = fixed_store();
    let show = store.add("Show A", 2).expect("add");
    let _ = store.drain_pending_snapshots();
    let before = store.collection();

    let err = store.mark_series_complete("nope").expect_err("missing series");
    assert_eq!(err, StoreError::SeriesNotFound("nope".to_string()));
    assert!(err.is_not_found());

    let err = store
        .mark_episode_complete(&show.id, "nope")
        .expect_err("missing episode");
    assert_eq!(
        err,
        StoreError::EpisodeNotFound {
            series_id: show.id.clone(),
            episode_id: "nope".to_string(),
        }
    );
    assert!(store.unmark_episode_complete("nope", "1000-0").is_err());
    assert!(store.unmark_series_complete("nope").is_err());
    assert!(store.remove_series("nope").is_err());

    assert_eq!(store.collection(), before);
    assert!(store.drain_pending_snapshots().is_empty());
}

#[test]
fn remove_series_drops_exactly_one() {
    let mut store = fixed_store();
    let a = store.add("A", 1).expect("a");
    let b = store.add("B", 1).expect("b");
    let c = store.add("C", 1).expect("c");

    let removed = store.remove_series(&b.id).expect("remove");
    assert_eq!(removed, b);
    assert_eq!(store.len(), 2);
    assert_eq!(store.collection().to_vec(), vec![a, c]);
    assert!(store.series(&b.id).is_none());
}

#[test]
fn remove_series_takes_only_the_first_of_duplicated_ids() {
    let dup = Series {
        id: "7".to_string(),
        name: "Dup".to_string(),
        episodes: vec![Episode {
            id: "7-0".to_string(),
            name: "Episode 1".to_string(),
            completed: false,
        }],
        completed: false,
    };
    let mut second = dup.clone();
    second.name = "Dup again".to_string();

    let mut store = SeriesStore::from_collection(vec![dup, second.clone()]);
    store.remove_series("7").expect("remove");

    assert_eq!(store.collection().to_vec(), vec![second]);
}

#[test]
fn clear_all_always_empties_and_records_a_snapshot() {
    let mut store = fixed_store();
    store.clear_all();
    assert!(store.is_empty());

    store.add("A", 2).expect("a");
    store.add("B", 2).expect("b");
    store.clear_all();

    assert!(store.is_empty());
    assert_eq!(store.drain_pending_snapshots().len(), 4);
}

#[test]
fn every_mutation_queues_one_isolated_snapshot() {
    let mut store = fixed_store();
    let show = store.add("Show A", 2).expect("add");
    store.mark_series_complete(&show.id).expect("mark");
    store.remove_series(&show.id).expect("remove");

    let snapshots = store.drain_pending_snapshots();
    let seqs: Vec<_> = snapshots.iter().map(|s| s.seq).collect();
    assert_eq!(seqs, [1, 2, 3]);
    assert_eq!(store.latest_snapshot_seq(), 3);

    assert!(!snapshots[0].collection[0].completed);
    assert!(snapshots[1].collection[0].completed);
    assert!(snapshots[2].is_empty());
    assert!(snapshots.iter().all(|s| s.ts_ms == 1_000));
}

#[test]
fn export_snapshot_captures_current_state_without_queueing() {
    let mut store = fixed_store();
    assert_eq!(store.export_snapshot().seq, 0);

    store.add("Show A", 2).expect("add");
    let _ = store.drain_pending_snapshots();

    let exported = store.export_snapshot();
    assert_eq!(exported.seq, 1);
    assert_eq!(exported.ts_ms, 1_000);
    assert_eq!(exported.collection, store.collection());
    assert!(store.drain_pending_snapshots().is_empty());
}

#[test]
fn draining_releases_queued_snapshots_and_keeps_sequence() {
    let mut store = fixed_store();
    for i in 0..5 {
        store.add(&format!("Show {i}"), 1).expect("add");
    }
    assert_eq!(store.drain_pending_snapshots().len(), 5);
    assert!(store.drain_pending_snapshots().is_empty());

    store.clear_all();
    let next = store.drain_pending_snapshots();
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].seq, 6);
}

#[test]
fn loaded_collections_keep_ids_unique_for_new_series() {
    let mut seed = fixed_store();
    let old = seed.add("Old", 1).expect("old");

    let mut store = SeriesStore::from_collection(vec![old.clone()]).with_clock(|| 10);
    let new = store.add("New", 1).expect("new");

    assert_ne!(new.id, old.id);
    assert_eq!(new.id, "1001");
}

fn loaded(id: u64) -> Series {
    Series {
        id: id.to_string(),
        name: format!("Loaded {id}"),
        episodes: Vec::new(),
        completed: false,
    }
}

#[test]
fn ids_at_the_top_of_the_range_fall_back_to_the_clock() {
    let mut store = SeriesStore::from_collection(vec![loaded(u64::MAX)]).with_clock(|| 1_000);

    let first = store.add("New", 1).expect("first");
    let second = store.add("Newer", 1).expect("second");

    assert_eq!(first.id, "1000");
    assert_eq!(second.id, "1001");
}

#[test]
fn ids_wrap_to_the_lowest_free_value_when_the_clock_is_taken() {
    let mut store = SeriesStore::from_collection(vec![loaded(u64::MAX), loaded(0)])
        .with_clock(|| u64::MAX);

    let first = store.add("New", 1).expect("first");
    let second = store.add("Newer", 1).expect("second");

    assert_eq!(first.id, "1");
    assert_eq!(second.id, "2");
    assert_eq!(store.len(), 4);
}

#[test]
fn persist_pending_writes_every_snapshot_and_leaves_the_latest() {
    let kv = MemoryKvStore::new();
    let mut adapter = PersistenceAdapter::new(kv.clone());

    let mut store = fixed_store();
    let show = store.add("Show A", 3).expect("add");
    store
        .mark_episode_complete(&show.id, &show.episodes[2].id)
        .expect("mark");
    store.persist_pending(&mut adapter);

    assert_eq!(kv.write_count(), 2);
    assert!(kv.raw(STORAGE_KEY).is_some());
    assert_eq!(adapter.load(), store.collection().to_vec());

    let reloaded = SeriesStore::load(&adapter);
    assert_eq!(reloaded.collection(), store.collection());
}
