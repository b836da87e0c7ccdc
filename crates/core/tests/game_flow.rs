use rummytally_core::{
    Event, EventBus, GameError, GameSettings, GameStore, LedgerError, MemoryStore, PersistError,
    PlayerId, RegistryError, RoundScore, SnapshotStore, SNAPSHOT_KEY,
};
use std::cell::RefCell;
use std::rc::Rc;

fn new_store(names: &[&str], max_points: i64, drop_points: i64) -> (GameStore, Vec<PlayerId>) {
    let mut store = GameStore::open_seeded(Box::new(MemoryStore::new()), 7);
    store
        .initialize(GameSettings::new(max_points, drop_points).expect("settings"))
        .expect("initialize");
    let mut events = EventBus::default();
    let ids = names
        .iter()
        .map(|name| store.add_player(name, &mut events).expect("add player"))
        .collect();
    (store, ids)
}

fn scores(ids: &[&PlayerId], values: &[i64]) -> Vec<RoundScore> {
    ids.iter()
        .zip(values.iter())
        .map(|(id, score)| RoundScore::new((*id).clone(), *score))
        .collect()
}

fn seat_names(store: &GameStore) -> Vec<String> {
    store.seating().iter().map(|p| p.name.clone()).collect()
}

fn assert_dense_seats(store: &GameStore) {
    let orders: Vec<usize> = store.seating().iter().map(|p| p.column_order).collect();
    assert_eq!(orders, (0..orders.len()).collect::<Vec<_>>());
}

#[derive(Debug, Clone, Default)]
struct SharedStore(Rc<RefCell<MemoryStore>>);

impl SnapshotStore for SharedStore {
    fn load(&self, key: &str) -> Result<Option<String>, PersistError> {
        self.0.borrow().load(key)
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<(), PersistError> {
        self.0.borrow_mut().save(key, blob)
    }
}

#[derive(Debug)]
struct OfflineStore;

impl SnapshotStore for OfflineStore {
    fn load(&self, _key: &str) -> Result<Option<String>, PersistError> {
        Err(PersistError::Backend("offline".to_string()))
    }

    fn save(&mut self, _key: &str, _blob: &str) -> Result<(), PersistError> {
        Err(PersistError::Backend("offline".to_string()))
    }
}

#[test]
fn elimination_opens_rejoin_window_until_next_round() {
    let (mut store, ids) = new_store(&["A", "B", "C"], 101, 20);
    let (a, b, c) = (&ids[0], &ids[1], &ids[2]);
    let mut events = EventBus::default();

    store
        .submit_round(scores(&[a, b, c], &[0, 40, 110]), &mut events)
        .expect("round 1");
    let drained: Vec<Event> = events.drain().collect();
    assert!(drained.contains(&Event::RoundWon {
        round_id: 1,
        player_id: a.clone()
    }));
    assert!(drained.contains(&Event::PlayerEliminated {
        player_id: c.clone(),
        total: 110
    }));

    let standing = store.standing(c).expect("c");
    assert!(standing.is_out);
    assert!(standing.can_rejoin);
    assert_eq!(standing.rejoin_score, 41);
    assert!(store.is_rejoin_eligible(c));

    store
        .submit_round(scores(&[a, b], &[15, 0]), &mut events)
        .expect("round 2");
    let standing = store.standing(c).expect("c");
    assert!(standing.is_out);
    assert!(!standing.can_rejoin);
    assert!(!store.rejoin_player(c, &mut events));
    assert!(store.player(c).expect("c").is_out);
}

#[test]
fn rejoin_lands_one_above_highest_active_total() {
    let (mut store, ids) = new_store(&["A", "B", "C"], 201, 20);
    let (a, b, c) = (&ids[0], &ids[1], &ids[2]);
    let mut events = EventBus::default();

    store
        .submit_round(scores(&[a, b, c], &[0, 150, 190]), &mut events)
        .expect("round 1");
    store
        .submit_round(scores(&[a, b, c], &[10, 0, 20]), &mut events)
        .expect("round 2");
    assert_eq!(store.total_for(c), 210);
    assert_eq!(seat_names(&store), vec!["A", "B"]);

    assert!(store.rejoin_player(c, &mut events));
    assert_eq!(store.total_for(c), 151);
    assert_eq!(store.state().ledger.rounds().len(), 2);
    assert_eq!(
        store.state().ledger.get(1).and_then(|r| r.score_for(c)),
        Some(190)
    );
    assert_eq!(seat_names(&store), vec!["A", "B", "C"]);
    assert_dense_seats(&store);
    let player = store.player(c).expect("c");
    assert!(!player.is_out);
    assert_eq!(player.rejoin_count, 1);
    assert_eq!(player.original_column_order, None);
    assert_eq!(store.open_card_player().map(|p| p.id.clone()), Some(c.clone()));
    assert_eq!(store.dealer().map(|p| p.id.clone()), Some(b.clone()));
    assert!(!store.is_rejoin_eligible(c));
    assert!(!store.rejoin_player(c, &mut events));

    let total: i64 = store
        .state()
        .ledger
        .rounds()
        .iter()
        .filter_map(|round| round.score_for(c))
        .sum();
    assert_eq!(total, store.total_for(c));
}

#[test]
fn rejoin_reopens_a_finished_game() {
    let (mut store, ids) = new_store(&["A", "B"], 101, 20);
    let (a, b) = (&ids[0], &ids[1]);
    let mut events = EventBus::default();

    store
        .submit_round(scores(&[a, b], &[0, 120]), &mut events)
        .expect("round 1");
    assert!(store.is_game_over());
    assert_eq!(store.game_winner().map(|p| p.id.clone()), Some(a.clone()));
    assert!(events
        .drain()
        .any(|event| event == Event::GameWon { player_id: a.clone() }));
    assert!(!store.standing(b).expect("b").can_rejoin);
    assert_eq!(
        store.submit_round(scores(&[a], &[0]), &mut events),
        Err(GameError::GameOver)
    );

    assert!(store.rejoin_player(b, &mut events));
    assert!(!store.is_game_over());
    assert_eq!(store.game_winner(), None);
    assert_eq!(store.total_for(b), 1);
}

#[test]
fn rotation_advances_after_each_round() {
    let (mut store, ids) = new_store(&["A", "B", "C", "D"], 201, 20);
    let mut events = EventBus::default();
    assert!(store.set_open_card_player(&ids[2]));
    assert_eq!(store.open_card_player().map(|p| p.name.as_str()), Some("C"));
    assert_eq!(store.dealer().map(|p| p.name.as_str()), Some("B"));

    let all: Vec<&PlayerId> = ids.iter().collect();
    store
        .submit_round(scores(&all, &[0, 5, 6, 7]), &mut events)
        .expect("round");
    assert_eq!(store.open_card_player().map(|p| p.name.as_str()), Some("D"));
    assert_eq!(store.dealer().map(|p| p.name.as_str()), Some("C"));

    assert!(store.set_dealer(&ids[3]));
    assert_eq!(store.open_card_player().map(|p| p.name.as_str()), Some("A"));
    assert!(!store.set_dealer(&PlayerId::new("ghost")));
}

#[test]
fn deleting_a_round_resurrects_and_reopens() {
    let (mut store, ids) = new_store(&["A", "B"], 101, 20);
    let (a, b) = (&ids[0], &ids[1]);
    let mut events = EventBus::default();

    store
        .submit_round(scores(&[a, b], &[0, 50]), &mut events)
        .expect("round 1");
    store
        .submit_round(scores(&[a, b], &[0, 60]), &mut events)
        .expect("round 2");
    assert!(store.player(b).expect("b").is_out);
    assert!(store.is_game_over());

    assert!(store.delete_round(2, &mut events));
    assert!(!store.delete_round(2, &mut events));
    assert!(!store.player(b).expect("b").is_out);
    assert!(!store.is_game_over());
    assert_eq!(store.game_winner(), None);
    assert_eq!(seat_names(&store), vec!["A", "B"]);
    assert_dense_seats(&store);
    assert_eq!(store.latest_round_id(), Some(1));
    assert!(events
        .drain()
        .any(|event| event == Event::PlayerReinstated { player_id: b.clone() }));
}

#[test]
fn deleting_an_early_round_renumbers_the_rest() {
    let (mut store, ids) = new_store(&["A", "B"], 201, 20);
    let (a, b) = (&ids[0], &ids[1]);
    let mut events = EventBus::default();
    for values in [[0i64, 10], [20, 0], [0, 30]] {
        store
            .submit_round(scores(&[a, b], &values), &mut events)
            .expect("round");
    }
    assert!(store.delete_round(1, &mut events));
    let round_ids: Vec<u32> = store.state().ledger.rounds().iter().map(|r| r.id).collect();
    assert_eq!(round_ids, vec![1, 2]);
    assert_eq!(store.total_for(a), 20);
    assert_eq!(store.total_for(b), 30);
}

#[test]
fn editing_scores_moves_players_across_the_ceiling() {
    let (mut store, ids) = new_store(&["A", "B", "C"], 101, 20);
    let (a, b, c) = (&ids[0], &ids[1], &ids[2]);
    let mut events = EventBus::default();
    store
        .submit_round(scores(&[a, b, c], &[0, 40, 110]), &mut events)
        .expect("round 1");

    assert_eq!(store.edit_score(1, c, 50, &mut events), Ok(true));
    assert!(!store.player(c).expect("c").is_out);
    assert!(!store.is_rejoin_eligible(c));
    assert_eq!(seat_names(&store), vec!["A", "B", "C"]);

    assert_eq!(store.edit_score(1, b, 120, &mut events), Ok(true));
    assert!(store.player(b).expect("b").is_out);
    assert_eq!(seat_names(&store), vec!["A", "C"]);
    let standing = store.standing(b).expect("b");
    assert!(standing.can_rejoin);
    assert_eq!(standing.rejoin_score, 51);

    assert!(store.would_duplicate_winner(1, c, 0));
    assert_eq!(
        store.edit_score(1, c, 0, &mut events),
        Err(GameError::Ledger(LedgerError::MultipleWinners(2)))
    );
    assert_eq!(
        store.edit_score(1, c, -4, &mut events),
        Err(GameError::Ledger(LedgerError::NegativeScore {
            player_id: c.clone(),
            score: -4
        }))
    );
    assert_eq!(store.edit_score(1, &PlayerId::new("ghost"), 3, &mut events), Ok(false));
}

#[test]
fn removed_player_history_returns_on_readd() {
    let (mut store, ids) = new_store(&["Alice", "Bob", "Cara"], 101, 20);
    let (alice, bob, cara) = (&ids[0], &ids[1], &ids[2]);
    let mut events = EventBus::default();

    store
        .submit_round(scores(&[alice, bob, cara], &[110, 0, 30]), &mut events)
        .expect("round 1");
    assert!(store.rejoin_player(alice, &mut events));
    assert_eq!(store.total_for(alice), 31);
    store
        .submit_round(scores(&[alice, bob, cara], &[0, 12, 4]), &mut events)
        .expect("round 2");

    assert!(store.remove_player(alice, &mut events));
    assert!(!store.remove_player(alice, &mut events));
    assert_eq!(seat_names(&store), vec!["Bob", "Cara"]);
    assert_eq!(store.total_for(alice), 0);
    assert_eq!(store.state().ledger.get(2).expect("round").winner_id, None);

    let restored = store.add_player("alice", &mut events).expect("re-add");
    assert_eq!(&restored, alice);
    assert_eq!(store.total_for(alice), 31);
    let player = store.player(alice).expect("alice");
    assert_eq!(player.rejoin_count, 1);
    assert!(!player.is_out);
    assert_eq!(
        store.state().ledger.get(2).expect("round").winner_id.as_ref(),
        Some(alice)
    );
    assert!(events
        .drain()
        .any(|event| event == Event::PlayerRestored { player_id: alice.clone() }));
}

fn scores_by_round(store: &GameStore, id: &PlayerId) -> Vec<Option<i64>> {
    store
        .state()
        .ledger
        .rounds()
        .iter()
        .map(|round| round.score_for(id))
        .collect()
}

#[test]
fn readded_player_follows_deleted_and_edited_rounds() {
    let (mut store, ids) = new_store(&["Alice", "Bob", "Cara"], 101, 20);
    let (alice, bob, cara) = (&ids[0], &ids[1], &ids[2]);
    let mut events = EventBus::default();
    for values in [[5i64, 0, 10], [7, 0, 3], [0, 4, 6]] {
        store
            .submit_round(scores(&[alice, bob, cara], &values), &mut events)
            .expect("round");
    }

    assert!(store.remove_player(alice, &mut events));
    assert!(store.delete_round(1, &mut events));
    assert_eq!(store.edit_score(2, bob, 9, &mut events), Ok(true));

    let restored = store.add_player("alice", &mut events).expect("re-add");
    assert_eq!(&restored, alice);
    assert_eq!(scores_by_round(&store, alice), vec![Some(7), Some(0)]);
    assert_eq!(store.total_for(alice), 7);
    assert_eq!(store.total_for(bob), 9);
    for round in store.state().ledger.rounds() {
        let zeros = round.scores.iter().filter(|entry| entry.score == 0).count();
        assert_eq!(zeros, 1, "round {}", round.id);
    }
    assert_eq!(
        store.state().ledger.get(2).expect("round").winner_id.as_ref(),
        Some(alice)
    );
    assert_eq!(
        store.state().ledger.get(1).expect("round").winner_id.as_ref(),
        Some(bob)
    );
}

#[test]
fn readded_player_over_ceiling_goes_straight_out() {
    let (mut store, ids) = new_store(&["A", "B", "C"], 101, 20);
    let (a, b, c) = (&ids[0], &ids[1], &ids[2]);
    let mut events = EventBus::default();
    store
        .submit_round(scores(&[a, b, c], &[0, 50, 110]), &mut events)
        .expect("round 1");
    assert!(store.player(c).expect("c").is_out);
    assert!(store.remove_player(c, &mut events));
    events.drain().for_each(drop);

    let restored = store.add_player("C", &mut events).expect("re-add");
    assert_eq!(&restored, c);
    assert!(store.player(c).expect("c").is_out);
    assert_eq!(store.total_for(c), 110);
    assert!(store.is_rejoin_eligible(c));
    assert_eq!(seat_names(&store), vec!["A", "B"]);
    assert_dense_seats(&store);
    assert!(!store.is_game_over());
    let drained: Vec<Event> = events.drain().collect();
    assert!(drained.contains(&Event::PlayerRestored { player_id: c.clone() }));
    assert!(drained.contains(&Event::PlayerEliminated {
        player_id: c.clone(),
        total: 110
    }));
}

#[test]
fn zero_rejoin_adjustment_keeps_round_winner() {
    let (mut store, ids) = new_store(&["A", "B", "C"], 101, 20);
    let (a, b, c) = (&ids[0], &ids[1], &ids[2]);
    let mut events = EventBus::default();
    store
        .submit_round(scores(&[a, b, c], &[0, 50, 60]), &mut events)
        .expect("round 1");
    store
        .submit_round(scores(&[c, a, b], &[45, 0, 9]), &mut events)
        .expect("round 2");
    assert!(store.player(c).expect("c").is_out);

    assert!(store.rejoin_player(c, &mut events));
    let round = store.state().ledger.get(2).expect("round");
    assert_eq!(round.score_for(c), Some(0));
    assert_eq!(round.winner_id.as_ref(), Some(a));
    assert_eq!(store.total_for(c), 60);
}

#[test]
fn zero_join_score_cannot_claim_a_decided_round() {
    let (mut store, ids) = new_store(&["A", "B"], 201, 20);
    let mut events = EventBus::default();
    let pair: Vec<&PlayerId> = ids.iter().collect();
    store
        .submit_round(scores(&pair, &[0, 30]), &mut events)
        .expect("round 1");

    assert_eq!(
        store.join_mid_game("Dee", 0, &mut events),
        Err(GameError::Ledger(LedgerError::MultipleWinners(2)))
    );
    assert!(store.find_player("Dee").is_none());
    assert_eq!(
        store.state().ledger.get(1).expect("round").winner_id.as_ref(),
        Some(&ids[0])
    );
}

#[test]
fn submissions_are_validated() {
    let (mut store, ids) = new_store(&["A", "B", "C"], 101, 20);
    let (a, b, c) = (&ids[0], &ids[1], &ids[2]);
    let mut events = EventBus::default();

    assert_eq!(
        store.submit_round(scores(&[a, b, c], &[0, 0, 5]), &mut events),
        Err(GameError::Ledger(LedgerError::MultipleWinners(2)))
    );
    assert_eq!(
        store.submit_round(scores(&[a, b, c], &[3, 4, 5]), &mut events),
        Err(GameError::Ledger(LedgerError::NoWinner))
    );
    assert_eq!(
        store.submit_round(scores(&[a, b], &[0, 4]), &mut events),
        Err(GameError::MissingScore(c.clone()))
    );
    let ghost = PlayerId::new("ghost");
    assert_eq!(
        store.submit_round(scores(&[a, b, c, &ghost], &[0, 4, 5, 6]), &mut events),
        Err(GameError::UnknownPlayer(ghost.clone()))
    );
    assert!(store.state().ledger.is_empty());
    assert!(events.is_empty());

    store
        .submit_round(scores(&[a, b, c], &[0, 4, 105]), &mut events)
        .expect("round 1");
    assert_eq!(
        store.submit_round(scores(&[a, b, c], &[0, 4, 5]), &mut events),
        Err(GameError::PlayerOut(c.clone()))
    );
    assert_eq!(
        store.add_player("b", &mut events),
        Err(GameError::Registry(RegistryError::DuplicateName("b".to_string())))
    );
}

#[test]
fn mid_game_join_writes_into_latest_round() {
    let (mut store, ids) = new_store(&["A", "B"], 201, 20);
    let mut events = EventBus::default();
    let pair: Vec<&PlayerId> = ids.iter().collect();
    store
        .submit_round(scores(&pair, &[0, 30]), &mut events)
        .expect("round 1");

    let join_score = store.suggested_join_score();
    assert_eq!(join_score, 31);
    let dee = store
        .join_mid_game("Dee", join_score, &mut events)
        .expect("join");
    assert_eq!(store.state().ledger.rounds().len(), 1);
    assert_eq!(store.total_for(&dee), 31);
    assert_eq!(store.latest_round_id(), Some(1));
    assert_eq!(store.open_card_player().map(|p| p.id.clone()), Some(dee.clone()));
    assert_eq!(seat_names(&store), vec!["A", "B", "Dee"]);
    assert!(store.join_mid_game("Eve", -1, &mut events).is_err());
}

#[test]
fn reorder_through_store_keeps_seats_dense() {
    let (mut store, ids) = new_store(&["A", "B", "C"], 201, 20);
    assert_eq!(
        store.reorder_players(&ids[1..]),
        Err(GameError::Registry(RegistryError::IncompleteOrder))
    );
    store
        .reorder_players(&[ids[1].clone(), ids[2].clone(), ids[0].clone()])
        .expect("reorder");
    assert_eq!(seat_names(&store), vec!["B", "C", "A"]);
    assert_dense_seats(&store);
}

#[test]
fn snapshot_round_trips_through_backend() {
    let shared = SharedStore::default();
    let mut store = GameStore::open_seeded(Box::new(shared.clone()), 11);
    let mut events = EventBus::default();
    store
        .initialize(GameSettings::new(101, 20).expect("settings"))
        .expect("initialize");
    let a = store.add_player("A", &mut events).expect("a");
    let b = store.add_player("B", &mut events).expect("b");
    store
        .submit_round(
            vec![RoundScore::new(a.clone(), 0), RoundScore::new(b.clone(), 25)],
            &mut events,
        )
        .expect("round");
    assert_eq!(store.version(), 4);

    let blob = shared
        .load(SNAPSHOT_KEY)
        .expect("load")
        .expect("snapshot written");
    assert!(blob.contains("currentOpenCardPlayerIndex"));

    let reopened = GameStore::open(Box::new(shared));
    assert_eq!(reopened.settings().max_points, 101);
    assert!(reopened.state().is_game_started);
    assert_eq!(reopened.total_for(&b), 25);
    assert_eq!(reopened.state().rotation.index(), 1);
    assert_eq!(seat_names(&reopened), vec!["A", "B"]);
}

#[test]
fn persistence_faults_do_not_block_play() {
    let mut store = GameStore::open_seeded(Box::new(OfflineStore), 3);
    assert_eq!(store.settings(), &GameSettings::default());
    assert!(!store.state().is_game_started);
    let mut events = EventBus::default();
    store.add_player("A", &mut events).expect("a");
    store.add_player("B", &mut events).expect("b");
    assert_eq!(store.seating().len(), 2);
    assert_eq!(store.version(), 2);
}

#[test]
fn new_game_and_reset() {
    let (mut store, ids) = new_store(&["A", "B", "C"], 101, 20);
    let (a, b, c) = (&ids[0], &ids[1], &ids[2]);
    let mut events = EventBus::default();
    store
        .submit_round(scores(&[a, b, c], &[0, 40, 110]), &mut events)
        .expect("round 1");

    store.start_new_game();
    assert!(store.state().ledger.is_empty());
    assert_eq!(seat_names(&store), vec!["A", "B", "C"]);
    assert!(!store.is_rejoin_eligible(c));
    assert_eq!(store.state().rotation.index(), 0);
    assert_eq!(store.settings().max_points, 101);

    store.reset();
    assert!(store.seating().is_empty());
    assert_eq!(store.settings(), &GameSettings::default());
    assert!(!store.state().is_game_started);
}

#[test]
fn initialize_rejects_bad_settings() {
    let mut store = GameStore::open_seeded(Box::new(MemoryStore::new()), 1);
    let bad = GameSettings {
        max_points: 10,
        drop_points: 20,
    };
    assert!(matches!(store.initialize(bad), Err(GameError::Settings(_))));
    assert_eq!(store.version(), 0);
}
