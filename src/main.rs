//! Binary entrypoint for the Wildgrove CLI.
//!
//! Commands:
//! - `start` - run the game engine with the local console transport
//! - `init` - create a starter `config.toml`
//! - `status` - print a brief summary of the store
//!
//! The chat transport credential is read from `WILDGROVE_BOT_TOKEN` and is
//! required by `start`; a production deployment hands it to the chat
//! transport adapter, while the bundled console transport only needs it to
//! mirror the real bootstrap path.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{error, info};
use tokio::io::{AsyncBufReadExt, BufReader};

use wildgrove::config::Config;
use wildgrove::game::{
    content, item_label, ActivityKind, ConsolePresenter, Engine, GameError, GameStoreBuilder,
    PlayerId, QuestStatus, RecipeKind,
};
use wildgrove::logutil::escape_log;

/// The console transport drives a single local player.
const LOCAL_PLAYER: PlayerId = 1;

#[derive(Parser)]
#[command(name = "wildgrove")]
#[command(about = "A chat-driven survival RPG engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the engine with the local console transport
    Start,
    /// Initialize a new configuration file
    Init,
    /// Show store status and statistics
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Start => {
            let config = Config::load(&cli.config).await?;
            // The credential is fatal at startup even though the console
            // transport does not dial anything with it.
            let _token = config.bot_token()?;
            info!("Starting Wildgrove v{}", env!("CARGO_PKG_VERSION"));

            let store = GameStoreBuilder::new(config.data_dir()).open()?;
            let engine = Engine::new(store, Arc::new(ConsolePresenter::new()));
            run_console(engine, &config).await?;
        }
        Commands::Init => {
            Config::create_default(&cli.config).await?;
            println!("Wrote starter configuration to {}", cli.config);
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            let store = GameStoreBuilder::new(config.data_dir()).open()?;
            let players = store.list_player_ids()?;
            println!("world: {}", config.game.world_name);
            println!("store: {}", config.data_dir().display());
            println!("players: {}", players.len());
        }
    }
    Ok(())
}

fn init_logging(config: &Option<Config>, verbose: u8) {
    let level = match verbose {
        0 => config
            .as_ref()
            .map(|c| c.logging.level.clone())
            .unwrap_or_else(|| "info".to_string()),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));
    if !atty::is(atty::Stream::Stdout) {
        builder.write_style(env_logger::WriteStyle::Never);
    }
    let _ = builder.try_init();
}

/// What the console loop is waiting for besides a plain command.
enum PendingInput {
    None,
    /// First contact: the next line is the player's name.
    Name,
    /// A simple recipe was picked; the next line is the quantity.
    CraftQuantity(&'static str),
}

async fn run_console(engine: Engine, config: &Config) -> Result<()> {
    println!("Welcome to {}. Type 'help' for commands.", config.game.world_name);

    let mut pending = if engine.store().player_exists(LOCAL_PLAYER)? {
        let player = engine.profile(LOCAL_PLAYER)?;
        println!("Welcome back, {}.", player.name);
        PendingInput::None
    } else {
        println!("You are new here. What should we call you?");
        PendingInput::Name
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        log::debug!("console input: {}", escape_log(input));

        match std::mem::replace(&mut pending, PendingInput::None) {
            PendingInput::Name => {
                let name = input.trim();
                if name.is_empty() || name.chars().count() > 30 {
                    println!("Pick a name between 1 and 30 characters.");
                    pending = PendingInput::Name;
                    continue;
                }
                let player = engine.ensure_player(LOCAL_PLAYER, name)?;
                println!("Welcome, {}. Type 'help' to get started.", player.name);
                continue;
            }
            PendingInput::CraftQuantity(recipe) => {
                match input.parse::<u32>() {
                    Ok(quantity) if quantity > 0 => {
                        report(engine.craft(LOCAL_PLAYER, recipe, quantity).await);
                    }
                    _ => println!("Enter a positive number."),
                }
                continue;
            }
            PendingInput::None => {}
        }

        let mut parts = input.split_whitespace();
        let command = parts.next().unwrap_or("").to_ascii_lowercase();
        match command.as_str() {
            "help" => print_help(),
            "mine" => report(engine.enter(LOCAL_PLAYER, ActivityKind::Mining).await),
            "chop" | "forest" => {
                report(engine.enter(LOCAL_PLAYER, ActivityKind::Woodcutting).await)
            }
            "forage" => report(engine.enter(LOCAL_PLAYER, ActivityKind::Foraging).await),
            "hunt" => report(engine.enter(LOCAL_PLAYER, ActivityKind::Hunting).await),
            "strike" => {
                let row = parts.next().and_then(|s| s.parse::<usize>().ok());
                let col = parts.next().and_then(|s| s.parse::<usize>().ok());
                match (row, col) {
                    (Some(row), Some(col)) if row < 3 && col < 3 => {
                        report(engine.strike(LOCAL_PLAYER, row, col).await)
                    }
                    _ => println!("Usage: strike <row 0-2> <col 0-2>"),
                }
            }
            "leave" | "back" => report(engine.leave(LOCAL_PLAYER).await),
            "craft" => match parts.next() {
                Some(recipe_id) => match content::recipe(recipe_id) {
                    Some(spec) => match spec.kind {
                        RecipeKind::Simple { .. } => {
                            println!("How many?");
                            pending = PendingInput::CraftQuantity(spec.id);
                        }
                        RecipeKind::Building { .. } => {
                            report(engine.craft(LOCAL_PLAYER, spec.id, 1).await)
                        }
                    },
                    None => println!("Unknown recipe. Try 'recipes'."),
                },
                None => println!("Usage: craft <recipe>"),
            },
            "recipes" => {
                for spec in content::RECIPES {
                    let bill: Vec<String> = spec
                        .cost
                        .iter()
                        .map(|(item, qty)| format!("{} x{qty}", item_label(item)))
                        .collect();
                    println!("{} <- {}", spec.id, bill.join(", "));
                }
            }
            "eat" => match engine.eat_berry(LOCAL_PLAYER).await {
                Ok(satiety) => println!("You eat a berry. Satiety {satiety}/100."),
                Err(err) => print_error(err),
            },
            "rest" => report(engine.rest(LOCAL_PLAYER).await),
            "read" => match parts.next().and_then(|s| s.parse::<u8>().ok()) {
                Some(index) => match engine.read_page(LOCAL_PLAYER, index).await {
                    Ok(()) => {
                        if let Some(page) = content::lore_page_item(index) {
                            println!("You pore over {}.", page.name);
                        }
                    }
                    Err(err) => print_error(err),
                },
                None => println!("Usage: read <page 1-8>"),
            },
            "quests" => match engine.quest_board(LOCAL_PLAYER).await {
                Ok(Some(entry)) => {
                    let status = match entry.row.status {
                        QuestStatus::Available => "offered - type 'accept'",
                        QuestStatus::Active => "active",
                        QuestStatus::Completed => "completed",
                    };
                    println!(
                        "Quest {}: {} ({}/{}) [{}]",
                        entry.spec.id, entry.spec.name, entry.row.progress, entry.row.target, status
                    );
                }
                Ok(None) => println!("You have finished every quest."),
                Err(err) => print_error(err),
            },
            "accept" => match engine.quest_board(LOCAL_PLAYER).await {
                Ok(Some(entry)) => match engine.accept_quest(LOCAL_PLAYER, entry.spec.id).await {
                    Ok(spec) => println!("Accepted quest {}: {}.", spec.id, spec.name),
                    Err(err) => print_error(err),
                },
                Ok(None) => println!("Nothing left to accept."),
                Err(err) => print_error(err),
            },
            "profile" | "me" => match engine.profile(LOCAL_PLAYER) {
                Ok(player) => {
                    println!(
                        "{} - level {}, {} exp, satiety {}/100",
                        player.name, player.level, player.experience, player.satiety
                    );
                }
                Err(err) => print_error(err),
            },
            "inv" | "inventory" => match engine.inventory(LOCAL_PLAYER) {
                Ok(lines) if lines.is_empty() => println!("Your pack is empty."),
                Ok(lines) => {
                    for line in lines {
                        if line.durability > 0 {
                            println!(
                                "{} x{} ({}/100)",
                                item_label(&line.item),
                                line.quantity,
                                line.durability
                            );
                        } else {
                            println!("{} x{}", item_label(&line.item), line.quantity);
                        }
                    }
                }
                Err(err) => print_error(err),
            },
            "quit" | "exit" => break,
            _ => println!("Unknown command. Type 'help'."),
        }
    }

    info!("console transport closed");
    Ok(())
}

fn report(result: Result<(), GameError>) {
    if let Err(err) = result {
        print_error(err);
    }
}

fn print_error(err: GameError) {
    if let GameError::Store(inner) = &err {
        error!("store failure: {inner}");
        println!("Something went wrong; please try again later.");
    } else {
        println!("{err}");
    }
}

fn print_help() {
    println!(
        "\
sites:    mine | chop | forage | hunt, then strike <row> <col>, leave
craft:    recipes, craft <recipe>
survival: eat, rest (needs a shelter)
story:    quests, accept, read <page>
other:    profile, inv, help, quit"
    );
}
