//! Job Auto Switcher - Playtest
//!
//! Drives the switcher against a simulated game client so the switch and
//! retry behavior can be watched from a terminal.

use clap::Parser;
use job_switcher::core::config::SwitcherConfig;
use job_switcher::core::error::Result;
use job_switcher::core::types::{DialogEvent, DialogSnapshot, DialogValue, Loadout, Role};
use job_switcher::game::sim::SimulatedClient;
use job_switcher::switcher::constants::{
    BUTTON_ACTIVATE, DIALOG_NAME, ICON_BASE, ICON_FIELD_INDEX, MIN_FIELDS,
};
use job_switcher::switcher::{JobSwitcher, LogNotifier, Notifier};

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Playtest the job switcher against a simulated client
#[derive(Parser, Debug)]
#[command(name = "job-switcher")]
struct Args {
    /// TOML config file (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter
    #[arg(long, default_value = "job_switcher=info")]
    log: String,
}

/// Prints chat lines to the terminal
struct TerminalChat;

impl Notifier for TerminalChat {
    fn print(&self, message: &str) {
        println!("{}", message);
        LogNotifier.print(message);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&args.log))
        .init();

    let config = match &args.config {
        Some(path) => SwitcherConfig::load(path)?,
        None => SwitcherConfig::default(),
    };
    let (publisher, receiver) = config.into_channel();

    let rt = Runtime::new()?;
    let _guard = rt.enter();

    let sim = SimulatedClient::new(Some(Role(19))).with_loadouts(starting_gearsets());
    let switcher = JobSwitcher::start(sim.clone(), receiver, job_name, Arc::new(TerminalChat));

    println!("\n=== JOB AUTO SWITCHER PLAYTEST ===");
    println!("Commands:");
    println!("  queue <job>     - Pop a duty confirmation for a job id");
    println!("  icon <id>       - Pop a duty confirmation with a raw icon id");
    println!("  role <job>      - Change job outside the switcher");
    println!("  hide / show     - Close or reopen the confirmation dialog");
    println!("  enable/disable  - Toggle the switcher");
    println!("  wait            - Wait for the running retry session");
    println!("  status / s      - Show client state");
    println!("  quit / q        - Exit");
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        let (command, arg) = match input.split_once(' ') {
            Some((command, arg)) => (command, arg.trim()),
            None => (input, ""),
        };

        match command {
            "" => continue,
            "quit" | "q" => break,
            "queue" | "icon" => {
                let Ok(value) = arg.parse::<u32>() else {
                    println!("Usage: {} <number>", command);
                    continue;
                };
                let icon = if command == "queue" {
                    ICON_BASE.saturating_add(value)
                } else {
                    value
                };
                sim.set_dialog_visible(true);
                match rt.block_on(switcher.handle_event(&confirm_event(icon))) {
                    Some(outcome) => println!("{:?}", outcome),
                    None => println!("Event dropped (see log)"),
                }
            }
            "role" => match arg.parse::<u32>() {
                Ok(id) => {
                    sim.set_role(Some(Role(id)));
                    println!("Now on {}", job_name(Role(id)).unwrap_or_default());
                }
                Err(_) => println!("Usage: role <number>"),
            },
            "hide" => sim.set_dialog_visible(false),
            "show" => sim.set_dialog_visible(true),
            "enable" | "disable" => {
                let enabled = command == "enable";
                publisher.send_modify(|config| config.enabled = enabled);
                println!("{}", if enabled { "Enabled." } else { "Disabled." });
            }
            "wait" => match rt.block_on(switcher.retries().wait()) {
                Some(outcome) => println!("{:?}", outcome),
                None => println!("No retry session to wait for"),
            },
            "status" | "s" => display_status(&sim, &switcher),
            _ => println!("Unknown command: {}", command),
        }
    }

    rt.block_on(switcher.shutdown());
    println!("\nGoodbye! {} confirm clicks issued.", sim.click_count());
    Ok(())
}

fn confirm_event(icon: u32) -> DialogEvent {
    let mut values = vec![DialogValue::Undefined; MIN_FIELDS];
    values[ICON_FIELD_INDEX] = DialogValue::UInt(icon);
    DialogEvent::new(DIALOG_NAME, BUTTON_ACTIVATE, DialogSnapshot::new(values))
}

fn starting_gearsets() -> Vec<Loadout> {
    vec![
        Loadout::new(0, 19, 710),
        Loadout::new(1, 24, 705),
        Loadout::new(2, 24, 690),
        Loadout::new(3, 25, 700),
        Loadout::new(4, 21, 680),
        Loadout::empty(5, 33),
    ]
}

fn job_name(role: Role) -> Option<String> {
    let name = match role.0 {
        19 => "Paladin",
        21 => "Warrior",
        24 => "White Mage",
        25 => "Black Mage",
        33 => "Astrologian",
        _ => return None,
    };
    Some(name.to_string())
}

fn display_status(sim: &SimulatedClient, switcher: &JobSwitcher) {
    let job = sim
        .role()
        .map(|role| format!("{} ({})", job_name(role).unwrap_or_default(), role))
        .unwrap_or_else(|| "no player".to_string());
    println!("  Job: {}", job);
    println!("  Dialog open: {}", sim.dialog_visible());
    println!("  Confirm clicks: {}", sim.click_count());
    match switcher.retries().active_generation() {
        Some(generation) => println!("  Retry session: generation {}", generation),
        None => println!("  Retry session: idle"),
    }
    for loadout in sim.loadout_list() {
        println!(
            "  Gearset {:>2}: job {:>2}, ilvl {:>3}{}",
            loadout.id.0,
            loadout.role.0,
            loadout.score,
            if loadout.exists { "" } else { " (empty)" }
        );
    }
}
