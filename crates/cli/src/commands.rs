use rummytally_core::{parse_score, RoundId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Board,
    Rounds,
    Init { max_points: i64, drop_points: Option<i64> },
    Add { name: String },
    Join { name: String, score: Option<i64> },
    Remove { name: String },
    Order { names: Vec<String> },
    Round { scores: Vec<(String, i64)> },
    Edit { round_id: RoundId, name: String, score: i64 },
    Delete { round_id: RoundId },
    Rejoin { name: String },
    Open { name: String },
    Dealer { name: String },
    NewGame,
    Reset,
    Quit,
}

pub const COMMAND_HELP: &[(&str, &str)] = &[
    ("init <max> [drop]", "set the elimination ceiling and drop penalty"),
    ("add <name>", "seat a player"),
    ("join <name> [score]", "seat a player mid-game with a join score"),
    ("remove <name>", "remove a player (re-adding restores their scores)"),
    ("order <name>...", "set the seating order of every active player"),
    ("round <name>=<score>...", "record a round; exactly one score must be 0"),
    ("edit <round> <name> <score>", "change a score in the latest round"),
    ("delete <round>", "delete a round"),
    ("rejoin <name>", "bring an eliminated player back"),
    ("open <name>", "give the open card to a player"),
    ("dealer <name>", "make a player the dealer"),
    ("board", "show totals, dealer and open card"),
    ("rounds", "show round history"),
    ("new", "start a new game with the same players"),
    ("reset", "clear everything"),
    ("quit", "exit"),
];

pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Err("empty command".to_string());
    };
    let args: Vec<&str> = parts.collect();
    let command = match head.to_ascii_lowercase().as_str() {
        "help" | "?" | "h" => Command::Help,
        "board" | "b" | "status" => Command::Board,
        "rounds" | "history" => Command::Rounds,
        "init" => {
            let max_points = parse_number(args.first(), "max points")?;
            let drop_points = match args.get(1) {
                Some(value) => Some(parse_number(Some(value), "drop points")?),
                None => None,
            };
            Command::Init {
                max_points,
                drop_points,
            }
        }
        "add" => Command::Add {
            name: join_name(&args)?,
        },
        "join" => {
            let (name, score) = match args.split_last() {
                Some((last, rest)) if !rest.is_empty() && last.parse::<i64>().is_ok() => {
                    (join_name(rest)?, Some(score_arg(last)?))
                }
                _ => (join_name(&args)?, None),
            };
            Command::Join { name, score }
        }
        "remove" | "rm" => Command::Remove {
            name: join_name(&args)?,
        },
        "order" => {
            if args.is_empty() {
                return Err("usage: order <name>...".to_string());
            }
            Command::Order {
                names: args.iter().map(|name| name.to_string()).collect(),
            }
        }
        "round" | "r" => {
            if args.is_empty() {
                return Err("usage: round <name>=<score>...".to_string());
            }
            let scores = args
                .iter()
                .map(|pair| -> Result<(String, i64), String> {
                    let (name, score) = pair
                        .split_once('=')
                        .ok_or_else(|| format!("expected <name>=<score>, got {pair:?}"))?;
                    Ok((name.to_string(), score_arg(score)?))
                })
                .collect::<Result<Vec<_>, String>>()?;
            Command::Round { scores }
        }
        "edit" => {
            if args.len() < 3 {
                return Err("usage: edit <round> <name> <score>".to_string());
            }
            let round_id = parse_round(args[0])?;
            let score = score_arg(args[args.len() - 1])?;
            let name = join_name(&args[1..args.len() - 1])?;
            Command::Edit {
                round_id,
                name,
                score,
            }
        }
        "delete" | "del" => Command::Delete {
            round_id: parse_round(args.first().copied().unwrap_or(""))?,
        },
        "rejoin" => Command::Rejoin {
            name: join_name(&args)?,
        },
        "open" => Command::Open {
            name: join_name(&args)?,
        },
        "dealer" => Command::Dealer {
            name: join_name(&args)?,
        },
        "new" => Command::NewGame,
        "reset" => Command::Reset,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command {other:?} (try help)")),
    };
    Ok(command)
}

fn join_name(args: &[&str]) -> Result<String, String> {
    if args.is_empty() {
        return Err("missing player name".to_string());
    }
    Ok(args.join(" "))
}

fn score_arg(value: &str) -> Result<i64, String> {
    parse_score(value).map_err(|err| err.to_string())
}

fn parse_number(value: Option<&&str>, label: &str) -> Result<i64, String> {
    let value = value.ok_or_else(|| format!("missing {label}"))?;
    value
        .parse::<i64>()
        .map_err(|_| format!("{label} must be a whole number, got {value:?}"))
}

fn parse_round(value: &str) -> Result<RoundId, String> {
    value
        .trim_start_matches('#')
        .parse::<RoundId>()
        .map_err(|_| format!("invalid round number {value:?}"))
}
