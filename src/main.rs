//! Headless leveling client: streams push messages and takes commands on stdin
//!
//! Run with: cargo run --features cli --bin level-cli

#[cfg(not(target_arch = "wasm32"))]
use level_vis::{
    controller::{Effect, PcbField, PluginController},
    core::{FieldKind, ProfileField},
};

/// One line typed by the operator
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, PartialEq)]
enum CliCommand {
    Show,
    Select(String),
    Set { field: String, value: String },
    Save,
    Probe,
    Cancel,
    Add(String),
    Remove,
    Help,
    Quit,
}

#[cfg(not(target_arch = "wasm32"))]
impl CliCommand {
    fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Err("empty command".into());
        };
        let rest: Vec<&str> = parts.collect();
        let one = |what: &str| match rest.as_slice() {
            [arg] => Ok(arg.to_string()),
            _ => Err(format!("usage: {} <{}>", verb, what)),
        };
        Ok(match verb {
            "show" | "s" => CliCommand::Show,
            "select" => CliCommand::Select(one("profile")?),
            "set" => match rest.as_slice() {
                [field, value] => CliCommand::Set {
                    field: field.to_string(),
                    value: value.to_string(),
                },
                _ => return Err("usage: set <field> <value>".into()),
            },
            "save" => CliCommand::Save,
            "probe" => CliCommand::Probe,
            "cancel" => CliCommand::Cancel,
            "add" => CliCommand::Add(one("name")?),
            "remove" => CliCommand::Remove,
            "help" | "?" => CliCommand::Help,
            "quit" | "exit" | "q" => CliCommand::Quit,
            other => return Err(format!("unknown command '{}', try help", other)),
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
const HELP: &str = "\
commands:
  show                  state, form fields and grid labels
  select <profile>      switch profile
  set <field> <value>   edit a form field
  save                  commit the form and persist
  probe                 start probing
  cancel                cancel probing
  add <name>            add a profile
  remove                remove the selected profile
  quit";

/// Apply an operator command; returns effects to run
#[cfg(not(target_arch = "wasm32"))]
fn apply(controller: &mut PluginController, command: CliCommand) -> Vec<Effect> {
    use level_vis::core::LevelError;

    let controller_id = controller.kind().id();
    let profiles_only = || LevelError::NoProfiles(controller_id);

    match command {
        CliCommand::Show => {
            println!("{}", describe(controller));
            Vec::new()
        }
        CliCommand::Select(name) => controller.act(|c| match c {
            PluginController::Level(l) => l.select_profile(&name),
            PluginController::Pcb(_) => Err(profiles_only()),
        }),
        CliCommand::Set { field, value } => controller.act(|c| {
            set_field(c, &field, &value)?;
            Ok(Vec::new())
        }),
        CliCommand::Save => controller.act(PluginController::save),
        CliCommand::Probe => controller.act(PluginController::start_probe),
        CliCommand::Cancel => controller.cancel_probe(),
        CliCommand::Add(name) => controller.act(|c| match c {
            PluginController::Level(l) => l.add_profile(&name),
            PluginController::Pcb(_) => Err(profiles_only()),
        }),
        CliCommand::Remove => controller.act(|c| match c {
            PluginController::Level(l) => l.remove_profile(),
            PluginController::Pcb(_) => Err(profiles_only()),
        }),
        CliCommand::Help => {
            println!("{}", HELP);
            Vec::new()
        }
        CliCommand::Quit => Vec::new(),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn set_field(
    controller: &mut PluginController,
    key: &str,
    value: &str,
) -> Result<(), level_vis::core::LevelError> {
    use level_vis::core::{parse_field, FieldValue, LevelError};

    let unknown = || LevelError::UnknownField(key.to_string());
    match controller {
        PluginController::Level(c) => {
            let field = ProfileField::from_key(key).ok_or_else(unknown)?;
            match field.kind() {
                FieldKind::Flag => {
                    if let FieldValue::Flag(flag) = parse_field(field.key(), FieldKind::Flag, value)? {
                        c.form_mut().set_flag(field, flag);
                    }
                }
                // validated on commit
                _ => c.form_mut().set_text(field, value),
            }
        }
        PluginController::Pcb(c) => {
            let field = PcbField::from_key(key).ok_or_else(unknown)?;
            c.form_mut().set_text(field, value);
        }
    }
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn describe(controller: &PluginController) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "plugin={} state={:?} status={}",
        controller.kind().id(),
        controller.state(),
        controller.status_text().unwrap_or("-")
    );
    match controller {
        PluginController::Level(c) => {
            let names: Vec<&str> = c.store().names().collect();
            let _ = writeln!(
                out,
                "profile={} (of {})",
                c.store().selected_name(),
                names.join(", ")
            );
            for &field in ProfileField::ALL {
                let value = match field.kind() {
                    FieldKind::Flag => c.form().flag(field).to_string(),
                    _ => c.form().text(field).to_string(),
                };
                let _ = writeln!(out, "  {:<12} {}", field.key(), value);
            }
        }
        PluginController::Pcb(c) => {
            for &field in PcbField::ALL {
                let _ = writeln!(out, "  {:<12} {}", field.key(), c.form().text(field));
            }
        }
    }
    let grid = controller.grid();
    let _ = writeln!(out, "samples={} redraws={}", controller.samples().len(), grid.redraws());
    for (text, x, y) in grid.surface().labels() {
        let _ = writeln!(out, "  {:>8} @ ({:.1}, {:.1})", text, x, y);
    }
    if let Some(e) = grid.last_error() {
        let _ = writeln!(out, "grid: {}", e);
    }
    if let Some(e) = controller.last_error() {
        let _ = writeln!(out, "error: {}", e);
    }
    out.trim_end().to_string()
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::cell::RefCell;
    use std::time::Duration;

    use level_vis::{
        api::{run_effects, Backend, OctoPrintClient},
        config::Config,
        controller::SyncState,
        grid::CanvasGeometry,
        websocket_native::NativeWsClient,
    };
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tracing::{debug, info, warn};
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,level_vis=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let config = Config::from_env()?;
    let client = OctoPrintClient::new(&config)?;

    let settings = client.load_settings().await?;
    let controller = RefCell::new(PluginController::from_settings(
        config.plugin,
        &settings,
        CanvasGeometry::default(),
    )?);

    let auth = match client.login().await {
        Ok(session) => Some(session.auth_message()),
        Err(e) => {
            warn!(error = %e, "Passive login failed, connecting unauthenticated");
            None
        }
    };
    let mut ws = NativeWsClient::connect(&config.socket_url(), auth);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stats_interval = tokio::time::interval(Duration::from_secs(30));
    let mut frames = 0u64;

    info!(plugin = config.plugin.id(), "Ready, type 'help' for commands");

    loop {
        tokio::select! {
            frame = ws.rx.recv() => {
                let Some(frame) = frame else {
                    warn!(state = %ws.state(), "Push socket gone");
                    break;
                };
                if controller.borrow_mut().handle_frame(&frame) {
                    frames += 1;
                    let c = controller.borrow();
                    let probing = c.state() == SyncState::Probing;
                    if let Some(sample) = c.samples().last().filter(|_| probing) {
                        debug!(
                            x = sample.x,
                            y = sample.y,
                            z = sample.z,
                            count = c.samples().len(),
                            "Sample"
                        );
                    }
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("stdin closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let command = match CliCommand::parse(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                if command == CliCommand::Quit {
                    break;
                }
                let effects = apply(&mut controller.borrow_mut(), command);
                run_effects(&controller, &client, effects).await;
                if let Some(e) = controller.borrow().last_error() {
                    println!("error: {}", e);
                }
            }
            _ = stats_interval.tick() => {
                let c = controller.borrow();
                info!(
                    socket = %ws.state(),
                    state = ?c.state(),
                    frames,
                    samples = c.samples().len(),
                    "stats"
                );
            }
        }
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use level_vis::config::PluginKind;
    use level_vis::core::LevelError;
    use level_vis::grid::CanvasGeometry;
    use serde_json::json;

    fn level() -> PluginController {
        PluginController::from_settings(PluginKind::LevelAnything, &json!({}), CanvasGeometry::default())
            .unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(CliCommand::parse("show"), Ok(CliCommand::Show));
        assert_eq!(CliCommand::parse("select  A "), Ok(CliCommand::Select("A".into())));
        assert_eq!(
            CliCommand::parse("set max_x 150"),
            Ok(CliCommand::Set {
                field: "max_x".into(),
                value: "150".into()
            })
        );
        assert!(CliCommand::parse("set max_x").is_err());
        assert!(CliCommand::parse("frobnicate").is_err());
    }

    #[test]
    fn test_set_then_save_commits_field() {
        let mut c = level();
        apply(&mut c, CliCommand::Add("A".into()));
        let PluginController::Level(l) = &mut c else { unreachable!() };
        l.select_profile("A").unwrap();

        assert!(apply(
            &mut c,
            CliCommand::Set {
                field: "safe_homing".into(),
                value: "true".into()
            }
        )
        .is_empty());
        let effects = apply(&mut c, CliCommand::Save);
        assert_eq!(effects.len(), 1);
        let PluginController::Level(l) = &c else { unreachable!() };
        assert!(l.store().selected().safe_homing);
    }

    #[test]
    fn test_unknown_field_reported() {
        let mut c = level();
        apply(
            &mut c,
            CliCommand::Set {
                field: "nozzle".into(),
                value: "1".into(),
            },
        );
        assert_eq!(c.last_error(), Some(&LevelError::UnknownField("nozzle".into())));
        assert!(describe(&c).contains("error: unknown field 'nozzle'"));
    }

    #[test]
    fn test_profile_commands_refused_for_pcb() {
        let mut c = PluginController::from_settings(
            PluginKind::LevelPcb,
            &json!({}),
            CanvasGeometry::default(),
        )
        .unwrap();
        assert!(apply(&mut c, CliCommand::Add("A".into())).is_empty());
        assert_eq!(c.last_error(), Some(&LevelError::NoProfiles("levelpcb")));
        assert_eq!(
            c.last_error().map(ToString::to_string).as_deref(),
            Some("levelpcb has no profiles")
        );
    }
}
