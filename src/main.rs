//! The Voto Safe console: the admin pages (dashboard, elections, parties,
//! voters, statistics) and the voter flow (selector, casting) as subcommands.
//! Rendering only; all rules live in the service layer.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::error;

use votosafe::config::Config;
use votosafe::error::{Error, Result};
use votosafe::model::election::{ElectionKind, ElectionSpec, ElectionStatus};
use votosafe::model::party::PartySpec;
use votosafe::model::store::{Id, Store};
use votosafe::model::voter::{Role, VoterRegistration};
use votosafe::service::stats::{ResultsState, UpcomingSlot};
use votosafe::service::{admin, auth, export, stats, voting};

const PROGRAM_NAME: &str = "votosafe";

const ABOUT_TEXT: &str = "Voto Safe electronic voting demo console.

All state lives in the configured data directory (see Votosafe.toml);
sign in first with `votosafe login`.";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    let election_spec_args = [
        Arg::new("kind")
            .long("kind")
            .help("in-person or virtual")
            .default_value("in-person"),
        Arg::new("status")
            .long("status")
            .help("active, upcoming or finished")
            .default_value("upcoming"),
        Arg::new("start")
            .long("start")
            .help("First day of the voting window, YYYY-MM-DD")
            .required(true),
        Arg::new("end")
            .long("end")
            .help("Last day of the voting window (inclusive), YYYY-MM-DD")
            .required(true),
        Arg::new("category")
            .long("category")
            .help("Ballot category name; repeat once per category")
            .action(ArgAction::Append),
    ];

    let party_spec_args = [
        Arg::new("election").long("election").required(true),
        Arg::new("category")
            .long("category")
            .help("Category id within the election")
            .default_value("1"),
        Arg::new("color")
            .long("color")
            .help("Display color, #rrggbb"),
        Arg::new("logo").long("logo"),
        Arg::new("candidate")
            .long("candidate")
            .help("Candidate name; repeat once per candidate")
            .action(ArgAction::Append),
    ];

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .subcommand_required(true)
        .subcommand(
            Command::new("login")
                .about("Sign in with DNI and password")
                .arg(Arg::new("DNI").required(true))
                .arg(Arg::new("PASSWORD").required(true)),
        )
        .subcommand(Command::new("logout").about("Sign out"))
        .subcommand(
            Command::new("register")
                .about("Register a new voter account")
                .arg(Arg::new("DNI").required(true))
                .arg(Arg::new("first-names").long("first-names").required(true))
                .arg(Arg::new("last-names").long("last-names").required(true))
                .arg(
                    Arg::new("birth-date")
                        .long("birth-date")
                        .help("YYYY-MM-DD")
                        .required(true),
                )
                .arg(Arg::new("department").long("department").required(true))
                .arg(Arg::new("email").long("email").required(true))
                .arg(Arg::new("password").long("password").required(true))
                .arg(
                    Arg::new("confirm-password")
                        .long("confirm-password")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("elections")
                .about("Manage elections (admin)")
                .subcommand_required(true)
                .subcommand(
                    Command::new("list")
                        .arg(Arg::new("name").long("name").help("Name substring"))
                        .arg(Arg::new("kind").long("kind"))
                        .arg(Arg::new("status").long("status"))
                        .arg(
                            Arg::new("open-on")
                                .long("open-on")
                                .help("Only elections whose window contains this day"),
                        ),
                )
                .subcommand(
                    Command::new("create")
                        .arg(Arg::new("NAME").required(true))
                        .args(election_spec_args.clone()),
                )
                .subcommand(
                    Command::new("modify")
                        .arg(Arg::new("ID").required(true))
                        .arg(Arg::new("NAME").required(true))
                        .args(election_spec_args),
                )
                .subcommand(Command::new("delete").arg(Arg::new("ID").required(true))),
        )
        .subcommand(
            Command::new("parties")
                .about("Manage parties and candidates (admin)")
                .subcommand_required(true)
                .subcommand(
                    Command::new("list").arg(Arg::new("election").long("election").required(true)),
                )
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("NAME").required(true))
                        .args(party_spec_args.clone()),
                )
                .subcommand(
                    Command::new("modify")
                        .arg(Arg::new("ID").required(true))
                        .arg(Arg::new("NAME").required(true))
                        .args(party_spec_args),
                )
                .subcommand(Command::new("delete").arg(Arg::new("ID").required(true))),
        )
        .subcommand(
            Command::new("voters")
                .about("List and export registered voters (admin)")
                .subcommand_required(true)
                .subcommand(
                    Command::new("list")
                        .arg(
                            Arg::new("search")
                                .long("search")
                                .help("DNI or name substring"),
                        )
                        .arg(Arg::new("role").long("role").help("admin, user or ppmm"))
                        .arg(
                            Arg::new("voted")
                                .long("voted")
                                .help("yes or no"),
                        )
                        .arg(Arg::new("department").long("department")),
                )
                .subcommand(
                    Command::new("export")
                        .about("Export the filtered voter table as CSV")
                        .arg(Arg::new("search").long("search"))
                        .arg(Arg::new("role").long("role"))
                        .arg(Arg::new("voted").long("voted"))
                        .arg(Arg::new("department").long("department"))
                        .arg(
                            Arg::new("output")
                                .long("output")
                                .help("Defaults to votantes_<today>.csv"),
                        ),
                ),
        )
        .subcommand(
            Command::new("ballot")
                .about("The voter flow: pick an election and cast your vote")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("Show the election selector"))
                .subcommand(
                    Command::new("select")
                        .about("Select an election for casting")
                        .arg(Arg::new("ELECTION_ID").required(true)),
                )
                .subcommand(
                    Command::new("cast")
                        .about("Cast your ballot for the selected election")
                        .arg(
                            Arg::new("selection")
                                .long("selection")
                                .help("CATEGORY:PARTY:CANDIDATE ids; repeat once per category")
                                .action(ArgAction::Append)
                                .required(true),
                        ),
                ),
        )
        .subcommand(
            Command::new("stats")
                .about("Election results (admin)")
                .arg(
                    Arg::new("ELECTION_ID")
                        .help("Defaults to the first election currently in its window"),
                ),
        )
        .subcommand(Command::new("dashboard").about("The landing summary (admin)"))
        .subcommand(
            Command::new("seed")
                .about("Populate the store with synthetic demo data (demo builds only)")
                .arg(
                    Arg::new("voters")
                        .long("voters")
                        .default_value("1000"),
                ),
        )
}

fn main() {
    // Set up logging.
    log4rs::init_file("log4rs.yaml", Default::default()).expect("Failed to initialise logging");

    if let Err(err) = run() {
        error!("{err}");
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let matches = cli().get_matches();
    let config = Config::load()?;
    let store = Store::open(&config)?;
    let now = Utc::now();

    match matches.subcommand() {
        Some(("login", sub)) => login(&store, sub),
        Some(("logout", _)) => {
            auth::logout(&store)?;
            println!("Sesión cerrada.");
            Ok(())
        }
        Some(("register", sub)) => register(&store, sub, now),
        Some(("elections", sub)) => elections(&store, sub),
        Some(("parties", sub)) => parties(&store, sub),
        Some(("voters", sub)) => voters(&store, sub, now),
        Some(("ballot", sub)) => ballot(&store, sub, now),
        Some(("stats", sub)) => show_stats(&store, sub, now),
        Some(("dashboard", _)) => dashboard(&store, now),
        Some(("seed", sub)) => seed(&store, sub, now),
        _ => unreachable!("subcommand is required"),
    }
}

fn login(store: &Store, matches: &ArgMatches) -> Result<()> {
    let dni = required(matches, "DNI");
    let password = required(matches, "PASSWORD");
    let session = auth::login(store, dni, password)?;
    println!("Hola, {}", session.display_name);
    if session.is_admin() {
        println!("Rol: administrador. Prueba `votosafe dashboard`.");
    } else {
        println!("Prueba `votosafe ballot list` para ver las elecciones disponibles.");
    }
    Ok(())
}

fn register(store: &Store, matches: &ArgMatches, now: DateTime<Utc>) -> Result<()> {
    let registration = VoterRegistration {
        dni: required(matches, "DNI").to_string(),
        first_names: required(matches, "first-names").to_string(),
        last_names: required(matches, "last-names").to_string(),
        birth_date: parse_arg(matches, "birth-date")?,
        department: required(matches, "department").to_string(),
        email: required(matches, "email").to_string(),
        password: required(matches, "password").to_string(),
        confirm_password: required(matches, "confirm-password").to_string(),
    };
    let voter = auth::register(store, registration, now.date_naive())?;
    println!("¡Registro exitoso! Ya puedes iniciar sesión, {}.", voter.first_names);
    Ok(())
}

fn elections(store: &Store, matches: &ArgMatches) -> Result<()> {
    auth::require_admin(store)?;
    match matches.subcommand() {
        Some(("list", sub)) => {
            let filter = admin::ElectionFilter {
                name_contains: sub.get_one::<String>("name").cloned(),
                kind: parse_opt(sub, "kind", parse_kind)?,
                status: parse_opt(sub, "status", parse_status)?,
                open_on: sub
                    .get_one::<String>("open-on")
                    .map(|raw| parse_date(raw))
                    .transpose()?,
            };
            let elections = admin::list_elections(store, &filter)?;
            if elections.is_empty() {
                println!("No hay elecciones.");
            }
            for election in elections {
                println!(
                    "[{}] {} | {:?} | {:?} | {} - {} | {} categorías",
                    election.id,
                    election.name,
                    election.kind,
                    election.status,
                    election.start_date,
                    election.end_date,
                    election.categories.len()
                );
            }
            Ok(())
        }
        Some(("create", sub)) => {
            let election = admin::create_election(store, election_spec(sub)?)?;
            println!("Elección creada: [{}] {}", election.id, election.name);
            Ok(())
        }
        Some(("modify", sub)) => {
            let id: Id = parse_arg(sub, "ID")?;
            let election = admin::modify_election(store, id, election_spec(sub)?)?;
            println!("Elección modificada: [{}] {}", election.id, election.name);
            Ok(())
        }
        Some(("delete", sub)) => {
            let id: Id = parse_arg(sub, "ID")?;
            admin::delete_election(store, id)?;
            println!("Elección eliminada: [{id}]");
            Ok(())
        }
        _ => unreachable!("subcommand is required"),
    }
}

fn election_spec(matches: &ArgMatches) -> Result<ElectionSpec> {
    Ok(ElectionSpec {
        name: required(matches, "NAME").to_string(),
        kind: parse_kind(required(matches, "kind"))?,
        status: parse_status(required(matches, "status"))?,
        start_date: parse_arg(matches, "start")?,
        end_date: parse_arg(matches, "end")?,
        categories: repeated(matches, "category"),
    })
}

fn parties(store: &Store, matches: &ArgMatches) -> Result<()> {
    auth::require_admin(store)?;
    match matches.subcommand() {
        Some(("list", sub)) => {
            let election_id: Id = parse_arg(sub, "election")?;
            let parties = admin::list_parties(store, election_id)?;
            if parties.is_empty() {
                println!("No hay partidos registrados para la elección {election_id}.");
            }
            for party in parties {
                let candidates: Vec<&str> = party
                    .candidates
                    .iter()
                    .map(|candidate| candidate.name.as_str())
                    .collect();
                println!(
                    "[{}] {} | categoría {} | color {} | {}",
                    party.id,
                    party.name,
                    party.category_id,
                    party.color.as_deref().unwrap_or("-"),
                    candidates.join(", ")
                );
            }
            Ok(())
        }
        Some(("add", sub)) => {
            let party = admin::add_party(store, party_spec(sub)?)?;
            println!("Partido agregado: [{}] {}", party.id, party.name);
            Ok(())
        }
        Some(("modify", sub)) => {
            let id: Id = parse_arg(sub, "ID")?;
            let party = admin::update_party(store, id, party_spec(sub)?)?;
            println!("Partido modificado: [{}] {}", party.id, party.name);
            Ok(())
        }
        Some(("delete", sub)) => {
            let id: Id = parse_arg(sub, "ID")?;
            admin::delete_party(store, id)?;
            println!("Partido eliminado: [{id}]");
            Ok(())
        }
        _ => unreachable!("subcommand is required"),
    }
}

fn party_spec(matches: &ArgMatches) -> Result<PartySpec> {
    Ok(PartySpec {
        name: required(matches, "NAME").to_string(),
        logo: matches.get_one::<String>("logo").cloned(),
        color: matches.get_one::<String>("color").cloned(),
        election_id: parse_arg(matches, "election")?,
        category_id: parse_arg(matches, "category")?,
        candidates: repeated(matches, "candidate"),
    })
}

fn voters(store: &Store, matches: &ArgMatches, now: DateTime<Utc>) -> Result<()> {
    auth::require_admin(store)?;
    let (command, sub) = match matches.subcommand() {
        Some(pair) => pair,
        None => unreachable!("subcommand is required"),
    };

    let filter = admin::VoterFilter {
        search: sub.get_one::<String>("search").cloned(),
        role: parse_opt(sub, "role", parse_role)?,
        voted: parse_opt(sub, "voted", parse_yes_no)?,
        department: sub.get_one::<String>("department").cloned(),
    };
    let voters = admin::list_voters(store, &filter)?;

    match command {
        "list" => {
            let summary = admin::voter_summary(&voters);
            println!(
                "Total: {}  Votaron: {}  No votaron: {}  Admins: {}  Users: {}  PPMM: {}",
                summary.total,
                summary.voted,
                summary.not_voted,
                summary.admins,
                summary.users,
                summary.ppmm
            );
            println!();
            for voter in &voters {
                println!(
                    "{} | {} {} | {} | {} | {} | {}",
                    voter.dni,
                    voter.first_names,
                    voter.last_names,
                    voter.role,
                    voter.department,
                    if voter.has_voted { "Votó" } else { "No votó" },
                    voter.election_name.as_deref().unwrap_or("N/A")
                );
            }
            Ok(())
        }
        "export" => {
            let csv = export::voters_csv(&voters);
            let path = match sub.get_one::<String>("output") {
                Some(path) => path.clone(),
                None => format!("votantes_{}.csv", now.date_naive()),
            };
            std::fs::write(&path, csv)?;
            println!("{} votantes exportados a {path}", voters.len());
            Ok(())
        }
        _ => unreachable!("subcommand is required"),
    }
}

fn ballot(store: &Store, matches: &ArgMatches, now: DateTime<Utc>) -> Result<()> {
    match matches.subcommand() {
        Some(("list", _)) => {
            let view = voting::election_selector(store, now)?;
            println!(
                "Hola, {} (DNI: {})",
                view.voter.first_names, view.voter.dni
            );
            println!("Elecciones Disponibles:");
            if view.elections.is_empty() {
                println!("  No hay elecciones activas en el sistema.");
            }
            for overview in &view.elections {
                let window = format!(
                    "{} - {}",
                    overview.election.start_date, overview.election.end_date
                );
                let action = if view.has_voted {
                    "Voto Emitido"
                } else if overview.can_vote {
                    "Votar Ahora"
                } else {
                    "No Disponible"
                };
                println!(
                    "  [{}] {} | {} | {} | {}",
                    overview.election.id,
                    overview.election.name,
                    if overview.active { "EN CURSO" } else { "CERRADA" },
                    window,
                    action
                );
            }
            Ok(())
        }
        Some(("select", sub)) => {
            let id: Id = parse_arg(sub, "ELECTION_ID")?;
            let election = voting::select_election(store, id, now)?;
            println!("Elección seleccionada: {}", election.name);
            for category in &election.categories {
                println!("  Categoría {}: {}", category.id, category.name);
            }
            println!("Emite tu voto con `votosafe ballot cast --selection CATEGORIA:PARTIDO:CANDIDATO`.");
            Ok(())
        }
        Some(("cast", sub)) => {
            let selections = sub
                .get_many::<String>("selection")
                .into_iter()
                .flatten()
                .map(|raw| parse_selection(raw))
                .collect::<Result<Vec<_>>>()?;
            let ballot = voting::cast_ballot(store, selections, now)?;
            println!("Voto emitido en '{}'. ¡Gracias por participar!", ballot.election_name);
            Ok(())
        }
        _ => unreachable!("subcommand is required"),
    }
}

fn show_stats(store: &Store, matches: &ArgMatches, now: DateTime<Utc>) -> Result<()> {
    auth::require_admin(store)?;
    let id: Id = match matches.get_one::<String>("ELECTION_ID") {
        Some(raw) => raw
            .parse()
            .map_err(|err| Error::Validation(format!("Bad ELECTION_ID: {err}")))?,
        None => {
            let elections = admin::list_elections(store, &admin::ElectionFilter::default())?;
            stats::default_election_id(&elections, now)
                .ok_or_else(|| Error::not_found("No elections in the store"))?
        }
    };
    let results = stats::election_results(store, id, now)?;

    println!("ESTADISTICAS: {}", results.election_name);
    match results.state {
        ResultsState::Pending => println!("ESTAS ELECCIONES ESTÁN POR COMENZAR"),
        ResultsState::NoVotes => {
            println!("AÚN NO HAY VOTOS REGISTRADOS");
            println!("Los gráficos aparecerán cuando los usuarios comiencen a votar.");
        }
        ResultsState::Ready => {
            println!(
                "{} votos emitidos, {} selecciones",
                results.ballots_cast, results.selection_total
            );
            println!();
            for row in results.chart_rows() {
                println!(
                    "{:>3}% {:<40} {} ({})",
                    row.value,
                    row.label,
                    bar(row.value),
                    row.color
                );
            }
        }
    }
    Ok(())
}

fn dashboard(store: &Store, now: DateTime<Utc>) -> Result<()> {
    let session = auth::require_admin(store)?;
    let summary = stats::dashboard(store, now)?;

    println!("Hola, {}", session.display_name);
    println!();
    println!("Elecciones Vigentes: {}", summary.active_elections);
    println!("Total de Usuarios:   {}", summary.total_users);
    println!(
        "Votos vs Usuarios:   {}% ({}/{})",
        summary.turnout.percentage, summary.turnout.voted, summary.turnout.total
    );
    println!();
    println!("Próximas Elecciones:");
    for slot in &summary.upcoming {
        match slot {
            UpcomingSlot::Scheduled {
                name,
                start_date,
                end_date,
            } => println!(
                "  {} ({} - {})",
                name,
                start_date.format("%d/%m"),
                end_date.format("%d/%m")
            ),
            UpcomingSlot::Placeholder => println!("  Proximamente (-)"),
        }
    }
    Ok(())
}

#[cfg(feature = "demo")]
fn seed(store: &Store, matches: &ArgMatches, now: DateTime<Utc>) -> Result<()> {
    auth::require_admin(store)?;
    let voters: usize = parse_arg(matches, "voters")?;
    let report = votosafe::fixtures::seed(store, voters, now)?;
    println!(
        "Datos de demostración: {} elecciones, {} partidos, {} votantes, {} votos",
        report.elections, report.parties, report.voters, report.votes
    );
    Ok(())
}

#[cfg(not(feature = "demo"))]
fn seed(_store: &Store, _matches: &ArgMatches, _now: DateTime<Utc>) -> Result<()> {
    Err(Error::validation(
        "The demo-data generator is only available in builds with the `demo` feature",
    ))
}

/// A clap-guaranteed required argument.
fn required<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .unwrap_or_default()
}

/// Every occurrence of a repeatable argument.
fn repeated(matches: &ArgMatches, name: &str) -> Vec<String> {
    matches
        .get_many::<String>(name)
        .into_iter()
        .flatten()
        .cloned()
        .collect()
}

/// Parse a required argument via [`FromStr`].
fn parse_arg<T>(matches: &ArgMatches, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    required(matches, name)
        .parse()
        .map_err(|err| Error::Validation(format!("Bad {name}: {err}")))
}

/// Parse an optional argument with the given parser.
fn parse_opt<T>(
    matches: &ArgMatches,
    name: &str,
    parse: impl Fn(&str) -> Result<T>,
) -> Result<Option<T>> {
    matches
        .get_one::<String>(name)
        .map(|raw| parse(raw))
        .transpose()
}

fn parse_kind(raw: &str) -> Result<ElectionKind> {
    match raw {
        "in-person" => Ok(ElectionKind::InPerson),
        "virtual" => Ok(ElectionKind::Virtual),
        other => Err(Error::Validation(format!(
            "Bad kind '{other}': expected in-person or virtual"
        ))),
    }
}

fn parse_status(raw: &str) -> Result<ElectionStatus> {
    match raw {
        "active" => Ok(ElectionStatus::Active),
        "upcoming" => Ok(ElectionStatus::Upcoming),
        "finished" => Ok(ElectionStatus::Finished),
        other => Err(Error::Validation(format!(
            "Bad status '{other}': expected active, upcoming or finished"
        ))),
    }
}

fn parse_role(raw: &str) -> Result<Role> {
    match raw {
        "admin" => Ok(Role::Admin),
        "user" => Ok(Role::User),
        "ppmm" => Ok(Role::Ppmm),
        other => Err(Error::Validation(format!(
            "Bad role '{other}': expected admin, user or ppmm"
        ))),
    }
}

fn parse_yes_no(raw: &str) -> Result<bool> {
    match raw {
        "yes" => Ok(true),
        "no" => Ok(false),
        other => Err(Error::Validation(format!(
            "Bad flag '{other}': expected yes or no"
        ))),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    raw.parse()
        .map_err(|err| Error::Validation(format!("Bad date '{raw}': {err}")))
}

/// `CATEGORY:PARTY:CANDIDATE` numeric ids.
fn parse_selection(raw: &str) -> Result<voting::SelectionSpec> {
    let parts: Vec<&str> = raw.split(':').collect();
    let &[category, party, candidate] = parts.as_slice() else {
        return Err(Error::Validation(format!(
            "Bad selection '{raw}': expected CATEGORY:PARTY:CANDIDATE"
        )));
    };
    let parse_u32 = |field: &str, value: &str| -> Result<u32> {
        value
            .parse()
            .map_err(|err| Error::Validation(format!("Bad {field} in '{raw}': {err}")))
    };
    Ok(voting::SelectionSpec {
        category_id: parse_u32("category", category)?,
        party_id: Id::new(parse_u32("party", party)?),
        candidate_id: parse_u32("candidate", candidate)?,
    })
}

/// A percentage as a half-width block bar.
fn bar(percentage: u32) -> String {
    "█".repeat(percentage as usize / 2)
}
