mod commands;

use anyhow::Context;
use commands::{parse_command, Command, COMMAND_HELP};
use rummytally_core::{Event, EventBus, GameSettings, GameStore, PlayerId, RoundScore};
use rummytally_data::{default_save_dir, load_settings_file, DirStore};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Default)]
struct CliOptions {
    save_dir: Option<PathBuf>,
    settings_file: Option<PathBuf>,
    max_points: Option<i64>,
    drop_points: Option<i64>,
}

fn parse_cli_options(args: &[String]) -> CliOptions {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--save-dir" => {
                if let Some(value) = args.get(idx + 1) {
                    options.save_dir = Some(PathBuf::from(value));
                    idx += 1;
                }
            }
            "--settings" => {
                if let Some(value) = args.get(idx + 1) {
                    options.settings_file = Some(PathBuf::from(value));
                    idx += 1;
                }
            }
            "--max" => {
                if let Some(value) = args.get(idx + 1) {
                    options.max_points = value.parse::<i64>().ok();
                    idx += 1;
                }
            }
            "--drop" => {
                if let Some(value) = args.get(idx + 1) {
                    options.drop_points = value.parse::<i64>().ok();
                    idx += 1;
                }
            }
            _ => {}
        }
        idx += 1;
    }
    options
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_cli_options(&args);
    if let Err(err) = run(options) {
        eprintln!("rummytally: {err:#}");
        std::process::exit(1);
    }
}

fn run(options: CliOptions) -> anyhow::Result<()> {
    let save_dir = options
        .save_dir
        .clone()
        .or_else(default_save_dir)
        .context("no save directory; pass --save-dir or set RUMMYTALLY_SAVE_DIR")?;
    tracing::debug!(dir = %save_dir.display(), "opening save");
    let mut store = GameStore::open(Box::new(DirStore::new(save_dir)));

    if let Some(settings) = startup_settings(&options)? {
        store.initialize(settings).context("apply startup settings")?;
    }
    if !store.state().is_game_started {
        println!("no game configured yet; try `init <max> [drop]` (default 201 / 20)");
    }
    print_board(&store);

    let stdin = io::stdin();
    let mut events = EventBus::default();
    loop {
        print!("> ");
        io::stdout().flush().context("flush prompt")?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line).context("read command")? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                println!("error: {err}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Err(err) = execute(&mut store, command, &mut events) {
            println!("error: {err}");
        }
        drain_events(&store, &mut events);
    }
    Ok(())
}

fn startup_settings(options: &CliOptions) -> anyhow::Result<Option<GameSettings>> {
    if let Some(path) = options.settings_file.as_ref() {
        let settings = load_settings_file(path)
            .with_context(|| format!("load settings from {}", path.display()))?;
        return Ok(Some(settings));
    }
    let Some(max_points) = options.max_points else {
        return Ok(None);
    };
    let settings = match options.drop_points {
        Some(drop_points) => GameSettings::new(max_points, drop_points),
        None => GameSettings::with_suggested_drop(max_points),
    };
    Ok(Some(settings.context("invalid --max/--drop")?))
}

fn execute(store: &mut GameStore, command: Command, events: &mut EventBus) -> anyhow::Result<()> {
    match command {
        Command::Help => print_help(),
        Command::Board => print_board(store),
        Command::Rounds => print_rounds(store),
        Command::Init {
            max_points,
            drop_points,
        } => {
            let settings = match drop_points {
                Some(drop_points) => GameSettings::new(max_points, drop_points),
                None => GameSettings::with_suggested_drop(max_points),
            }?;
            store.initialize(settings)?;
            println!(
                "playing to {} with a drop penalty of {}",
                settings.max_points, settings.drop_points
            );
        }
        Command::Add { name } => {
            store.add_player(&name, events)?;
            print_board(store);
        }
        Command::Join { name, score } => {
            let score = score.unwrap_or_else(|| store.suggested_join_score());
            store.join_mid_game(&name, score, events)?;
            print_board(store);
        }
        Command::Remove { name } => {
            let id = resolve(store, &name)?;
            store.remove_player(&id, events);
            print_board(store);
        }
        Command::Order { names } => {
            let ids = names
                .iter()
                .map(|name| resolve(store, name))
                .collect::<anyhow::Result<Vec<_>>>()?;
            store.reorder_players(&ids)?;
            print_board(store);
        }
        Command::Round { scores } => {
            let entries = scores
                .iter()
                .map(|(name, score)| -> anyhow::Result<RoundScore> {
                    Ok(RoundScore::new(resolve(store, name)?, *score))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            let round_id = store.submit_round(entries, events)?;
            println!("round {round_id} recorded");
            print_board(store);
        }
        Command::Edit {
            round_id,
            name,
            score,
        } => {
            if store.latest_round_id() != Some(round_id) {
                anyhow::bail!("only the latest round can be edited");
            }
            let id = resolve(store, &name)?;
            if store.would_duplicate_winner(round_id, &id, score) {
                anyhow::bail!("round {round_id} already has a winner with 0");
            }
            if !store.edit_score(round_id, &id, score, events)? {
                anyhow::bail!("{name} has no score in round {round_id}");
            }
            print_board(store);
        }
        Command::Delete { round_id } => {
            if !store.delete_round(round_id, events) {
                anyhow::bail!("round {round_id} does not exist");
            }
            print_board(store);
        }
        Command::Rejoin { name } => {
            let id = resolve(store, &name)?;
            if !store.rejoin_player(&id, events) {
                anyhow::bail!("{name} cannot rejoin now");
            }
            print_board(store);
        }
        Command::Open { name } => {
            let id = resolve(store, &name)?;
            if !store.set_open_card_player(&id) {
                anyhow::bail!("{name} is not an active player");
            }
            print_board(store);
        }
        Command::Dealer { name } => {
            let id = resolve(store, &name)?;
            if !store.set_dealer(&id) {
                anyhow::bail!("{name} is not an active player");
            }
            print_board(store);
        }
        Command::NewGame => {
            store.start_new_game();
            print_board(store);
        }
        Command::Reset => {
            store.reset();
            println!("all players, rounds and settings cleared");
        }
        Command::Quit => {}
    }
    Ok(())
}

fn resolve(store: &GameStore, name: &str) -> anyhow::Result<PlayerId> {
    store
        .find_player(name)
        .map(|player| player.id.clone())
        .with_context(|| format!("no player named {name:?}"))
}

fn player_name(store: &GameStore, id: &PlayerId) -> String {
    store
        .player(id)
        .map(|player| player.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn drain_events(store: &GameStore, events: &mut EventBus) {
    for event in events.drain() {
        match event {
            Event::RoundWon {
                round_id,
                player_id,
            } => println!("round {round_id} won by {}", player_name(store, &player_id)),
            Event::GameWon { player_id } => {
                println!("*** {} wins the game! ***", player_name(store, &player_id))
            }
            Event::GameEnded => println!("every player is out; the game is over"),
            Event::PlayerEliminated { player_id, total } => {
                println!("{} is out with {total}", player_name(store, &player_id))
            }
            Event::PlayerRejoined { player_id, total } => {
                println!("{} rejoins at {total}", player_name(store, &player_id))
            }
            Event::PlayerReinstated { player_id } => {
                println!("{} is back under the ceiling", player_name(store, &player_id))
            }
            Event::PlayerRestored { player_id } => {
                println!("{}'s scores restored", player_name(store, &player_id))
            }
            Event::RoundDeleted { round_id } => println!("round {round_id} deleted"),
        }
    }
}

fn print_help() {
    println!("commands:");
    for (usage, about) in COMMAND_HELP {
        println!("  {usage:<28} {about}");
    }
}

fn print_board(store: &GameStore) {
    let settings = store.settings();
    println!(
        "to {} | drop {} | rounds {}",
        settings.max_points,
        settings.drop_points,
        store.latest_round_id().unwrap_or(0)
    );
    let dealer = store.dealer().map(|player| player.id.clone());
    let open = store.open_card_player().map(|player| player.id.clone());
    for row in store.active_standings() {
        let mut marks = Vec::new();
        if dealer.as_ref() == Some(&row.player_id) {
            marks.push("dealer");
        }
        if open.as_ref() == Some(&row.player_id) {
            marks.push("open");
        }
        if !row.can_drop {
            marks.push("no drop");
        }
        println!("  {:<16} {:>5}  {}", row.name, row.total, marks.join(", "));
    }
    for row in store.out_standings() {
        let rejoin = if row.can_rejoin {
            format!("can rejoin at {}", row.rejoin_score)
        } else {
            String::new()
        };
        println!("  {:<16} {:>5}  out {}", row.name, row.total, rejoin);
    }
    if let Some(winner) = store.game_winner() {
        println!("game over: {} wins", winner.name);
    } else if store.is_game_over() {
        println!("game over");
    }
}

fn print_rounds(store: &GameStore) {
    let rounds = store.state().ledger.rounds();
    if rounds.is_empty() {
        println!("no rounds yet");
        return;
    }
    for round in rounds {
        let cells: Vec<String> = round
            .scores
            .iter()
            .map(|entry| format!("{}={}", player_name(store, &entry.player_id), entry.score))
            .collect();
        let winner = round
            .winner_id
            .as_ref()
            .map(|id| player_name(store, id))
            .unwrap_or_else(|| "-".to_string());
        println!("  #{:<3} winner {:<12} {}", round.id, winner, cells.join(" "));
    }
}
