//! `StageFlow` operator console.
//!
//! Reads one command per line from stdin and drives a live service. Every
//! event the service publishes is echoed so a renderer's view can be followed
//! from the terminal.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use stageflow::config::Config;
use stageflow::constants::archive::EXTENSION;
use stageflow::events::AppEvent;
use stageflow::lyrics::lyric_slides;
use stageflow::service::ServiceItem;
use stageflow::AppContext;
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthChar;

const NAME_WIDTH: usize = 32;

const HELP: &str = "\
commands:
  list                          show the service
  slides                        show the derived slides
  add <image|video|presentation> <path> [pages]
  insert <pos> <image|video|presentation> <path> [pages]
  song <lyrics-file> [order...] add a song from a lyrics file
  remove <pos> | remove-selected | clear
  move <from> <to> [count] | up <pos> | down <pos>
  select <pos...> | range <pos>
  activate <pos> | deactivate <pos>
  go <pos> | next | prev | jump <index>
  play | pause | toggle | loop <on|off>
  save <file> | load <file>
  help | quit";

fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_writer(io::stderr)
        .init();

    let mut app = AppContext::new(config);
    println!("{} {}", app.config().app_name(), app.config().app_version());
    app.subscribe(|event| println!("  ~ {}", describe(event)));

    if app.bootstrap() {
        println!("Restored last service ({} items)", app.store().len());
    } else {
        println!("Started a new service");
    }
    println!("Type `help` for commands.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            continue;
        };
        if matches!(command, "quit" | "exit" | "q") {
            break;
        }
        if let Err(e) = run_command(&mut app, command, args) {
            println!("error: {e:#}");
            if e.downcast_ref::<stageflow::Error>().is_some_and(stageflow::Error::is_positional) {
                println!("positions count from 0, see `list`");
            }
        }
    }
    Ok(())
}

fn run_command(app: &mut AppContext, command: &str, args: &[&str]) -> Result<()> {
    match command {
        "help" => println!("{HELP}"),
        "list" => print_items(app),
        "slides" => print_slides(app),
        "add" => {
            let item = media_item(args)?;
            let position = app.add_item(item);
            println!("added at {position}");
        }
        "insert" => {
            let (position, rest) = args.split_first().context("insert needs a position")?;
            app.insert_item(parse(position)?, media_item(rest)?)?;
        }
        "song" => {
            let (file, order) = args.split_first().context("song needs a lyrics file")?;
            let path = Path::new(file);
            let lyrics = fs_err::read_to_string(path)?;
            let order = (!order.is_empty()).then(|| order.join(" "));
            let text = lyric_slides(&lyrics, order.as_deref());
            let position = app.add_item(ServiceItem::song(stem(path), text));
            println!("added at {position}");
        }
        "remove" => {
            let removed = app.remove_item(parse(arg(args, 0)?)?)?;
            println!("removed {}", removed.name);
        }
        "remove-selected" => println!("removed {}", app.remove_items()),
        "clear" => app.clear(),
        "move" => {
            let count = args.get(2).map_or(Ok(1), |c| parse(c))?;
            if !app.move_rows(parse(arg(args, 0)?)?, parse(arg(args, 1)?)?, count)? {
                println!("nothing to move");
            }
        }
        "up" => report_move(app.move_up(parse(arg(args, 0)?)?)?),
        "down" => report_move(app.move_down(parse(arg(args, 0)?)?)?),
        "select" => {
            let positions = args.iter().map(|a| parse(a)).collect::<Result<Vec<_>>>()?;
            app.select_items(&positions)?;
        }
        "range" => {
            app.select_range(parse(arg(args, 0)?)?)?;
        }
        "activate" => app.activate(parse(arg(args, 0)?)?)?,
        "deactivate" => {
            app.deactivate(parse(arg(args, 0)?)?)?;
        }
        "go" => {
            if !app.go_to_item(parse(arg(args, 0)?)?)? {
                println!("item has no slides");
            }
        }
        "next" => {
            if !app.next_slide() {
                println!("at the end");
            }
        }
        "prev" => {
            if !app.previous_slide() {
                println!("at the start");
            }
        }
        "jump" => {
            if !app.change_slide_index(parse(arg(args, 0)?)?) {
                println!("cannot jump there");
            }
        }
        "play" => println!("playing: {}", app.play()),
        "pause" => println!("playing: {}", app.pause()),
        "toggle" => println!("playing: {}", app.play_pause()),
        "loop" => app.set_loop(matches!(arg(args, 0)?, "on" | "true" | "1"))?,
        "save" => {
            let path = service_path(arg(args, 0)?);
            app.save(&path)?;
        }
        "load" => {
            let path = service_path(arg(args, 0)?);
            app.load(&path)?;
        }
        other => bail!("unknown command `{other}` (try `help`)"),
    }
    Ok(())
}

fn arg<'a>(args: &[&'a str], index: usize) -> Result<&'a str> {
    args.get(index)
        .copied()
        .with_context(|| format!("missing argument {}", index + 1))
}

fn parse(value: &str) -> Result<usize> {
    value
        .parse()
        .with_context(|| format!("`{value}` is not a number"))
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map_or_else(String::new, |s| s.to_string_lossy().into_owned())
}

/// Add the default extension when the user left it off.
fn service_path(raw: &str) -> PathBuf {
    let path = PathBuf::from(shellexpand::tilde(raw).as_ref());
    if path.extension().is_some() {
        path
    } else {
        path.with_extension(EXTENSION)
    }
}

fn media_item(args: &[&str]) -> Result<ServiceItem> {
    let kind = arg(args, 0)?;
    let file = arg(args, 1)?;
    let path = Path::new(file);
    let name = stem(path);
    Ok(match kind {
        "image" => ServiceItem::image(name, file),
        "video" => ServiceItem::video(name, file),
        "presentation" => {
            let pages = args.get(2).map_or(Ok(1), |p| parse(p))?;
            ServiceItem::presentation(name, file, pages)
        }
        other => bail!("unknown item kind `{other}`"),
    })
}

fn report_move(moved: bool) {
    if !moved {
        println!("already at the edge");
    }
}

/// Cut `name` to at most `width` terminal columns.
fn truncate(name: &str, width: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for c in name.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            out.push('…');
            break;
        }
        used += w;
        out.push(c);
    }
    out
}

fn print_items(app: &AppContext) {
    let items = app.store().items();
    if items.is_empty() {
        println!("(empty service)");
        return;
    }
    for (position, item) in items.iter().enumerate() {
        let active = if item.active { '*' } else { ' ' };
        let selected = if item.selected { '+' } else { ' ' };
        let background = if item.background.is_empty() {
            String::new()
        } else {
            format!("  [{} background]", item.background_kind.name())
        };
        println!(
            "{active}{selected}{position:>3}  {:<12} {:<width$} {} slide(s){background}",
            item.kind.as_str(),
            truncate(&item.name, NAME_WIDTH),
            item.slide_number,
            width = NAME_WIDTH + 1,
        );
    }
}

fn print_slides(app: &AppContext) {
    let current = app.global_position();
    for (position, slide) in app.slides().slides().iter().enumerate() {
        let marker = if Some(position) == current { '>' } else { ' ' };
        let text = slide.text.lines().next().unwrap_or_default();
        println!(
            "{marker}{position:>4}  {}[{}/{}] {}",
            slide.kind,
            slide.index + 1,
            slide.slide_count,
            truncate(text, NAME_WIDTH * 2),
        );
    }
}

fn describe(event: &AppEvent) -> String {
    match event {
        AppEvent::Saved(path) => format!("saved {}", path.display()),
        AppEvent::Loaded(path) => format!("loaded {}", path.display()),
        other => format!("{other:?}"),
    }
}
