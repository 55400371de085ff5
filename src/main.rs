use anyhow::Context;
use clap::{arg, crate_version, value_parser, Arg, ArgMatches, Command};
use std::path::PathBuf;

use ranktreap::{records, Leaderboard};

// A required positional integer; negative values are accepted
fn integer_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .help(help)
        .required(true)
        .value_parser(value_parser!(i64))
        .allow_negative_numbers(true)
}

fn cli() -> Command {
    Command::new("ranktreap")
        .version(crate_version!())
        .about("Load contest participants into a treap keyed by signup time and query them")
        .arg(arg!(-f --file <FILE> "Participants file, one `name, id, rank, country, signup time` record per line").default_value("contest_participants.txt").value_parser(value_parser!(PathBuf)))
        .arg(arg!(-s --seed <SEED> "Seed for node priorities, for reproducible tree shapes").value_parser(value_parser!(u64)))
        .subcommand_required(true)
        .subcommand(Command::new("range").about("Print the IDs of participants who signed up in [T1, T2]").arg(integer_arg("T1", "Range start")).arg(integer_arg("T2", "Range end")))
        .subcommand(Command::new("best-before").about("Print the best-ranked participant who signed up before DATE").arg(integer_arg("DATE", "Exclusive upper bound on signup time")))
        .subcommand(Command::new("kth").about("Print the participant with the K-th best rank").arg(arg!(<K> "Position in rank order, counting from 1").value_parser(value_parser!(usize))))
        .subcommand(Command::new("delete-id").about("Delete the participant with the given ID").arg(integer_arg("ID", "Participant ID")))
        .subcommand(Command::new("delete-date").about("Delete every participant who signed up at DATE").arg(integer_arg("DATE", "Signup time to delete")))
        .subcommand(Command::new("stats").about("Print the number of participants and the signup time span"))
}

fn run(board: &mut Leaderboard, matches: &ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("range", sub)) => {
            let t1 = *sub.get_one::<i64>("T1").context("missing T1")?;
            let t2 = *sub.get_one::<i64>("T2").context("missing T2")?;
            println!("IDs of participants between {t1} and {t2}:");
            for (id, time) in board.range_ids(t1, t2)? {
                println!("{id} ({time})");
            }
        }
        Some(("best-before", sub)) => {
            let date = *sub.get_one::<i64>("DATE").context("missing DATE")?;
            match board.best_rank_before_date(date) {
                Some(id) => println!("Best-ranked participant before {date}: {id}"),
                None => println!("No participants signed up before {date}"),
            }
        }
        Some(("kth", sub)) => {
            let k = *sub.get_one::<usize>("K").context("missing K")?;
            match board.kth_best_rank(k)? {
                Some(id) => println!("Participant with rank position {k}: {id}"),
                None => println!("Fewer than {k} participants"),
            }
        }
        Some(("delete-id", sub)) => {
            let id = *sub.get_one::<i64>("ID").context("missing ID")?;
            if board.delete_by_id(id) {
                println!("Deleted participant {id}");
            } else {
                println!("No participant with ID {id}");
            }
            println!("{} participants remain", board.len());
        }
        Some(("delete-date", sub)) => {
            let date = *sub.get_one::<i64>("DATE").context("missing DATE")?;
            let removed = board.delete_by_signup_date(date);
            println!("Deleted {removed} participants with signup time {date}");
            println!("{} participants remain", board.len());
        }
        Some(("stats", _)) => {
            println!("Participants: {}", board.len());
            let mut times = board.participants().map(|p| p.signup_time);
            if let Some(first) = times.next() {
                let last = times.last().unwrap_or(first);
                println!("Signup times: {first} to {last}");
            }
        }
        _ => unreachable!("clap requires a subcommand"),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    if std::env::var("RANKTREAP_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("RANKTREAP_LOG")
            .write_style("RANKTREAP_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    let params = cli().get_matches();
    let input_file = params
        .get_one::<PathBuf>("file")
        .context("missing participants file")?;

    let mut builder = Leaderboard::builder();
    if let Some(seed) = params.get_one::<u64>("seed") {
        builder = builder.seed(*seed);
    }
    let mut board = builder.build();
    records::load_file(&mut board, input_file)
        .with_context(|| format!("failed to load {}", input_file.display()))?;

    run(&mut board, &params)
}
